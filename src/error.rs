//! Error types shared across the crate.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Schedule construction / loading failures. Fatal at startup, never
/// recovered at runtime.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("schedule defines no periods")]
    Empty,

    #[error("period `{0}`: start must be earlier than end")]
    InvalidRange(String),

    #[error("period `{0}`: clock minutes fall outside the day")]
    OutOfBounds(String),

    #[error("duplicate period name `{0}`")]
    DuplicateName(String),

    #[error("period `{name}`: unparseable clock time `{value}`")]
    BadClockTime { name: String, value: String },

    #[error("cannot read schedule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed schedule file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of the scan transition itself. These are pure value returns:
/// the caller's record is left exactly as it was.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Clock skew: the scan predates the entry that is still open.
    #[error("scan at {scan} predates open entry at {entry}")]
    TemporalOrder {
        entry: DateTime<Utc>,
        scan: DateTime<Utc>,
    },

    /// A checked-in record with no entry timestamp, i.e. corrupted storage.
    #[error("checked-in record for {subject} on {day} has no entry timestamp")]
    MissingEntry { subject: u64, day: chrono::NaiveDate },
}

/// Failures from the identity / record collaborators. Propagated unmodified;
/// the engine performs no compensating action.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Conditional write lost the race; caller reloads and retries.
    #[error("record version conflict")]
    Conflict,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("stored record is malformed: {0}")]
    Corrupt(String),
}
