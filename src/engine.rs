//! Session state machine and period-overlap accounting.
//!
//! `record_scan` is a pure function over (schedule, record snapshot, now):
//! no I/O, no locking. Serializing concurrent scans for the same
//! (subject, day) is the caller's job, done here via the record store's
//! versioned conditional writes.

use crate::error::EngineError;
use crate::model::record::{AttendanceRecord, PeriodAccumulator};
use crate::schedule::Schedule;
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of a single scan: which way the presence state toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScanResult {
    Entered { timestamp: DateTime<Utc> },
    Exited { timestamp: DateTime<Utc> },
}

impl ScanResult {
    pub fn message(&self) -> &'static str {
        match self {
            ScanResult::Entered { .. } => "entered",
            ScanResult::Exited { .. } => "exited",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ScanResult::Entered { timestamp } | ScanResult::Exited { timestamp } => *timestamp,
        }
    }
}

#[derive(Clone)]
pub struct SessionEngine {
    schedule: Arc<Schedule>,
    zone: Tz,
    /// Fraction of a period's duration required for a present verdict.
    threshold: f64,
}

impl SessionEngine {
    pub fn new(schedule: Arc<Schedule>, zone: Tz, threshold: f64) -> Self {
        Self {
            schedule,
            zone,
            threshold,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Calendar day an instant belongs to, in the reference timezone.
    /// Records are keyed by this.
    pub fn day_key(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.zone).date_naive()
    }

    /// Apply one scan to a subject's day record.
    ///
    /// Absent (or no record yet) -> Present: stamps the entry time.
    /// Present -> Absent: stamps the exit time and folds the closed interval
    /// `[entry, now)` into the per-period accumulators.
    ///
    /// On error the caller's record is untouched; either the full new record
    /// is produced or nothing changes.
    pub fn record_scan(
        &self,
        subject_id: u64,
        record: Option<&AttendanceRecord>,
        now: DateTime<Utc>,
    ) -> Result<(AttendanceRecord, ScanResult), EngineError> {
        let mut updated = match record {
            Some(existing) => existing.clone(),
            None => self.fresh_record(subject_id, now),
        };

        if updated.checked_in {
            let entry = updated.entry_ts.ok_or(EngineError::MissingEntry {
                subject: updated.subject_id,
                day: updated.day,
            })?;
            if now < entry {
                return Err(EngineError::TemporalOrder { entry, scan: now });
            }

            self.merge_overlap(&mut updated, entry, now);
            updated.checked_in = false;
            updated.exit_ts = Some(now);
            Ok((updated, ScanResult::Exited { timestamp: now }))
        } else {
            updated.checked_in = true;
            updated.entry_ts = Some(now);
            Ok((updated, ScanResult::Entered { timestamp: now }))
        }
    }

    /// First scan of the day: every scheduled period starts at zero minutes,
    /// absent. The period set is frozen here and never changes mid-day.
    fn fresh_record(&self, subject_id: u64, now: DateTime<Utc>) -> AttendanceRecord {
        let periods = self
            .schedule
            .all()
            .iter()
            .map(|p| (p.name.clone(), PeriodAccumulator::default()))
            .collect();

        AttendanceRecord {
            subject_id,
            day: self.day_key(now),
            checked_in: false,
            entry_ts: None,
            exit_ts: None,
            periods,
        }
    }

    /// The overlap pass. The interval and every period are both anchored to
    /// the entry's local day; a session running past midnight extends beyond
    /// minute 1440 and simply overlaps nothing further. Minutes are floored
    /// per period, and accumulators merge additively across sessions.
    fn merge_overlap(&self, record: &mut AttendanceRecord, entry: DateTime<Utc>, exit: DateTime<Utc>) {
        let entry_secs = i64::from(
            entry
                .with_timezone(&self.zone)
                .time()
                .num_seconds_from_midnight(),
        );
        let exit_secs = entry_secs + (exit - entry).num_seconds();

        for period in self.schedule.all() {
            let start_secs = i64::from(period.start_minute) * 60;
            let end_secs = i64::from(period.end_minute) * 60;

            let covered = exit_secs.min(end_secs) - entry_secs.max(start_secs);
            if covered <= 0 {
                continue;
            }
            let minutes = (covered / 60) as u32;
            if minutes == 0 {
                continue;
            }

            // Merge, never overwrite: re-entry after a break keeps adding to
            // the same period. Names missing from the record (schedule drift)
            // are skipped, the day keeps its snapshot.
            let Some(acc) = record.periods.get_mut(&period.name) else {
                continue;
            };
            acc.duration_minutes += minutes;
            acc.present = self.meets_threshold(acc.duration_minutes, period.duration_minutes());
        }
    }

    fn meets_threshold(&self, accumulated: u32, period_duration: u16) -> bool {
        f64::from(accumulated) / f64::from(period_duration) >= self.threshold
    }
}
