use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Minutes of one period covered so far today, plus the derived verdict.
/// `present` is recomputed from `duration_minutes` on every merge, never
/// set independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PeriodAccumulator {
    pub duration_minutes: u32,
    pub present: bool,
}

/// One subject's attendance state for one calendar day.
///
/// Created on the first scan of the day, mutated by every subsequent scan,
/// immutable history once the day rolls over. The `periods` map is fixed at
/// creation from the schedule active at that moment; names are never added
/// or removed mid-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    pub subject_id: u64,
    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub day: NaiveDate,
    pub checked_in: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub entry_ts: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub exit_ts: Option<DateTime<Utc>>,
    pub periods: BTreeMap<String, PeriodAccumulator>,
}
