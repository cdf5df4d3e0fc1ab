//! Persistence interfaces for the identity and record collaborators.
//!
//! The engine never talks to a database; it sees snapshots loaded through
//! these traits and hands back full replacement records. Lost updates are
//! prevented by versioned conditional writes: `put_record` only succeeds
//! against the version the caller read, otherwise `StoreError::Conflict`.

pub mod memory;
pub mod mysql;

use crate::error::StoreError;
use crate::model::record::AttendanceRecord;
use crate::model::subject::Subject;
use chrono::NaiveDate;

/// A stored value plus the version it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

pub trait RecordStore {
    async fn get_record(
        &self,
        subject_id: u64,
        day: NaiveDate,
    ) -> Result<Option<Versioned<AttendanceRecord>>, StoreError>;

    /// Conditional write. `expected_version == 0` means "create new"; a
    /// nonzero version must match what is stored or the write is refused.
    async fn put_record(
        &self,
        expected_version: u64,
        record: &AttendanceRecord,
    ) -> Result<(), StoreError>;
}

pub trait IdentityStore {
    async fn lookup(&self, card_token: &str) -> Result<Option<Subject>, StoreError>;

    /// Register a badge. Duplicate token yields `StoreError::Conflict`.
    async fn register(&self, card_token: &str, display_name: &str)
    -> Result<Subject, StoreError>;

    /// Paged listing; returns the page plus the total subject count.
    async fn list(&self, page: u32, per_page: u32) -> Result<(Vec<Subject>, i64), StoreError>;
}
