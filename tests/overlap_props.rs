//! Property tests for the overlap pass.

use badgetrack::engine::SessionEngine;
use badgetrack::model::record::AttendanceRecord;
use badgetrack::schedule::{Period, Schedule};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::sync::Arc;

fn engine() -> SessionEngine {
    let schedule = Schedule::new(vec![
        Period {
            name: "Hour1".into(),
            start_minute: 520,
            end_minute: 580,
        },
        Period {
            name: "Hour2".into(),
            start_minute: 580,
            end_minute: 640,
        },
    ])
    .unwrap();
    SessionEngine::new(Arc::new(schedule), chrono_tz::UTC, 0.10)
}

fn close_session(e: &SessionEngine, entry_secs: u32, exit_secs: u32) -> AttendanceRecord {
    let midnight = Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 0).unwrap();
    let entry = midnight + chrono::Duration::seconds(i64::from(entry_secs));
    let exit = midnight + chrono::Duration::seconds(i64::from(exit_secs));

    let (opened, _) = e.record_scan(1, None, entry).unwrap();
    let (closed, _) = e.record_scan(1, Some(&opened), exit).unwrap();
    closed
}

proptest! {
    /// Per-period minutes never sum to more than the session itself.
    #[test]
    fn accumulated_minutes_never_exceed_session_length(
        entry_secs in 0u32..86_400,
        length_secs in 0u32..14_400,
    ) {
        let exit_secs = entry_secs.saturating_add(length_secs).min(86_399);
        let record = close_session(&engine(), entry_secs, exit_secs);

        let total: u32 = record.periods.values().map(|a| a.duration_minutes).sum();
        prop_assert!(total <= (exit_secs - entry_secs) / 60);
    }

    /// A session fully inside one period credits that period with the floored
    /// session length and every other period with zero.
    #[test]
    fn session_inside_one_period_credits_exactly_that_period(
        offset_secs in 0u32..3_000,
        length_secs in 0u32..600,
    ) {
        // Keep [entry, exit) within Hour1 = [31200s, 34800s).
        let entry_secs = 31_200 + offset_secs;
        let exit_secs = (entry_secs + length_secs).min(34_799);
        let record = close_session(&engine(), entry_secs, exit_secs);

        prop_assert_eq!(
            record.periods["Hour1"].duration_minutes,
            (exit_secs - entry_secs) / 60
        );
        prop_assert_eq!(record.periods["Hour2"].duration_minutes, 0);
    }

    /// Closing a second session never decreases any accumulator.
    #[test]
    fn accumulators_are_monotonic_across_sessions(
        first_entry in 30_000u32..33_000,
        first_len in 0u32..1_200,
        second_len in 0u32..1_200,
    ) {
        let e = engine();
        let first_exit = first_entry + first_len;
        let after_first = close_session(&e, first_entry, first_exit);

        let second_entry = first_exit + 60;
        let (opened, _) = {
            let midnight = Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 0).unwrap();
            let t = midnight + chrono::Duration::seconds(i64::from(second_entry));
            e.record_scan(1, Some(&after_first), t).unwrap()
        };
        let closed = {
            let midnight = Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 0).unwrap();
            let t = midnight + chrono::Duration::seconds(i64::from(second_entry + second_len));
            e.record_scan(1, Some(&opened), t).unwrap().0
        };

        for (name, acc) in &after_first.periods {
            prop_assert!(closed.periods[name].duration_minutes >= acc.duration_minutes);
        }
    }
}
