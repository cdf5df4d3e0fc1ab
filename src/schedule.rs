//! The daily period schedule.
//!
//! Loaded once at startup from a JSON file and never mutated afterwards.
//! All clock times are minutes since midnight in the configured reference
//! timezone; anchoring scans to that timezone is the engine's job, the
//! schedule itself is pure clock arithmetic.

use crate::error::ScheduleError;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use utoipa::ToSchema;

pub const MINUTES_PER_DAY: u16 = 1440;

/// A named clock-time interval `[start_minute, end_minute)` within the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Period {
    #[schema(example = "Hour1", value_type = String)]
    pub name: String,
    #[schema(example = 520)]
    pub start_minute: u16,
    #[schema(example = 580)]
    pub end_minute: u16,
}

impl Period {
    pub fn duration_minutes(&self) -> u16 {
        self.end_minute - self.start_minute
    }
}

/// Ordered set of unique-named periods. Immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Schedule {
    periods: Vec<Period>,
}

/// On-disk shape: `[{"name": "Hour1", "start": "08:40", "end": "09:40"}, ...]`
#[derive(Deserialize)]
struct RawPeriod {
    name: String,
    start: String,
    end: String,
}

impl Schedule {
    /// Validate and freeze a period list.
    pub fn new(periods: Vec<Period>) -> Result<Self, ScheduleError> {
        if periods.is_empty() {
            return Err(ScheduleError::Empty);
        }

        let mut seen = HashSet::new();
        for p in &periods {
            if p.start_minute >= MINUTES_PER_DAY || p.end_minute > MINUTES_PER_DAY {
                return Err(ScheduleError::OutOfBounds(p.name.clone()));
            }
            if p.start_minute >= p.end_minute {
                return Err(ScheduleError::InvalidRange(p.name.clone()));
            }
            if !seen.insert(p.name.clone()) {
                return Err(ScheduleError::DuplicateName(p.name.clone()));
            }
        }

        Ok(Self { periods })
    }

    /// Load from the JSON file pointed at by `SCHEDULE_PATH`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScheduleError> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<RawPeriod> = serde_json::from_str(&raw)?;

        let mut periods = Vec::with_capacity(entries.len());
        for e in entries {
            let start_minute = parse_clock(&e.name, &e.start)?;
            let end_minute = parse_clock(&e.name, &e.end)?;
            periods.push(Period {
                name: e.name,
                start_minute,
                end_minute,
            });
        }
        Self::new(periods)
    }

    pub fn resolve(&self, name: &str) -> Option<&Period> {
        self.periods.iter().find(|p| p.name == name)
    }

    pub fn all(&self) -> &[Period] {
        &self.periods
    }
}

/// Parse `HH:MM` into minutes since midnight. `24:00` is accepted so a
/// period may run to the end of the day.
fn parse_clock(name: &str, value: &str) -> Result<u16, ScheduleError> {
    if value == "24:00" {
        return Ok(MINUTES_PER_DAY);
    }
    let t = NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| ScheduleError::BadClockTime {
        name: name.to_string(),
        value: value.to_string(),
    })?;
    Ok((t.hour() * 60 + t.minute()) as u16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn period(name: &str, start: u16, end: u16) -> Period {
        Period {
            name: name.to_string(),
            start_minute: start,
            end_minute: end,
        }
    }

    #[test]
    fn valid_schedule_keeps_order() {
        let s = Schedule::new(vec![period("Hour1", 520, 580), period("Hour2", 580, 640)])
            .expect("valid schedule");
        let names: Vec<_> = s.all().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Hour1", "Hour2"]);
    }

    #[test]
    fn resolve_finds_by_name() {
        let s = Schedule::new(vec![period("Hour1", 520, 580)]).unwrap();
        assert_eq!(s.resolve("Hour1").unwrap().duration_minutes(), 60);
        assert!(s.resolve("Hour9").is_none());
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(Schedule::new(vec![]), Err(ScheduleError::Empty)));
    }

    #[test]
    fn rejects_start_not_before_end() {
        let err = Schedule::new(vec![period("Broken", 580, 580)]).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidRange(name) if name == "Broken"));
    }

    #[test]
    fn rejects_out_of_bounds_minutes() {
        let err = Schedule::new(vec![period("Late", 1440, 1500)]).unwrap_err();
        assert!(matches!(err, ScheduleError::OutOfBounds(name) if name == "Late"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err =
            Schedule::new(vec![period("Hour1", 520, 580), period("Hour1", 580, 640)]).unwrap_err();
        assert!(matches!(err, ScheduleError::DuplicateName(name) if name == "Hour1"));
    }

    #[test]
    fn end_of_day_period_is_allowed() {
        let s = Schedule::new(vec![period("Night", 1380, 1440)]).unwrap();
        assert_eq!(s.resolve("Night").unwrap().duration_minutes(), 60);
    }

    #[test]
    fn loads_from_json_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"[{{"name":"Hour1","start":"08:40","end":"09:40"}},
                {{"name":"Night","start":"23:00","end":"24:00"}}]"#
        )
        .unwrap();

        let s = Schedule::from_json_file(f.path()).expect("file should parse");
        assert_eq!(s.resolve("Hour1").unwrap().start_minute, 520);
        assert_eq!(s.resolve("Night").unwrap().end_minute, 1440);
    }

    #[test]
    fn bad_clock_time_is_reported_with_period_name() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"[{{"name":"Hour1","start":"8h40","end":"09:40"}}]"#).unwrap();

        let err = Schedule::from_json_file(f.path()).unwrap_err();
        assert!(matches!(err, ScheduleError::BadClockTime { name, .. } if name == "Hour1"));
    }
}
