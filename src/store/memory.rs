//! In-memory store used by tests and local development.

use crate::error::StoreError;
use crate::model::record::AttendanceRecord;
use crate::model::subject::Subject;
use crate::store::{IdentityStore, RecordStore, Versioned};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<(u64, NaiveDate), Versioned<AttendanceRecord>>>,
    subjects: RwLock<Vec<Subject>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Self::default()
        }
    }
}

impl RecordStore for MemoryStore {
    async fn get_record(
        &self,
        subject_id: u64,
        day: NaiveDate,
    ) -> Result<Option<Versioned<AttendanceRecord>>, StoreError> {
        let records = self.records.read().expect("record map poisoned");
        Ok(records.get(&(subject_id, day)).cloned())
    }

    async fn put_record(
        &self,
        expected_version: u64,
        record: &AttendanceRecord,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().expect("record map poisoned");
        let key = (record.subject_id, record.day);

        match records.entry(key) {
            Entry::Vacant(slot) if expected_version == 0 => {
                slot.insert(Versioned {
                    version: 1,
                    value: record.clone(),
                });
                Ok(())
            }
            Entry::Occupied(mut slot) if slot.get().version == expected_version => {
                let stored = slot.get_mut();
                stored.version += 1;
                stored.value = record.clone();
                Ok(())
            }
            _ => Err(StoreError::Conflict),
        }
    }
}

impl IdentityStore for MemoryStore {
    async fn lookup(&self, card_token: &str) -> Result<Option<Subject>, StoreError> {
        let subjects = self.subjects.read().expect("subject list poisoned");
        Ok(subjects.iter().find(|s| s.card_token == card_token).cloned())
    }

    async fn register(
        &self,
        card_token: &str,
        display_name: &str,
    ) -> Result<Subject, StoreError> {
        let mut subjects = self.subjects.write().expect("subject list poisoned");
        if subjects.iter().any(|s| s.card_token == card_token) {
            return Err(StoreError::Conflict);
        }

        let subject = Subject {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            card_token: card_token.to_string(),
            display_name: display_name.to_string(),
        };
        subjects.push(subject.clone());
        Ok(subject)
    }

    async fn list(&self, page: u32, per_page: u32) -> Result<(Vec<Subject>, i64), StoreError> {
        let subjects = self.subjects.read().expect("subject list poisoned");
        let offset = page.saturating_sub(1) as usize * per_page as usize;
        let data = subjects
            .iter()
            .skip(offset)
            .take(per_page as usize)
            .cloned()
            .collect();
        Ok((data, subjects.len() as i64))
    }
}
