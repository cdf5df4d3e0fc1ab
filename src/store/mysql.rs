//! MySQL-backed store.
//!
//! One row per (subject, day); the periods map travels as a JSON blob in a
//! TEXT column, and `version` backs the conditional writes. Writes go through
//! `put_record` only, so the single-writer-per-key discipline holds as long
//! as callers respect the version they read.

use crate::error::StoreError;
use crate::model::record::AttendanceRecord;
use crate::model::subject::Subject;
use crate::store::{IdentityStore, RecordStore, Versioned};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::MySqlPool;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

#[derive(sqlx::FromRow)]
struct DayRow {
    subject_id: u64,
    day: NaiveDate,
    checked_in: bool,
    entry_ts: Option<DateTime<Utc>>,
    exit_ts: Option<DateTime<Utc>>,
    periods: String,
    version: u64,
}

impl DayRow {
    fn into_versioned(self) -> Result<Versioned<AttendanceRecord>, StoreError> {
        let periods = serde_json::from_str(&self.periods)
            .map_err(|e| StoreError::Corrupt(format!("periods column: {e}")))?;
        Ok(Versioned {
            version: self.version,
            value: AttendanceRecord {
                subject_id: self.subject_id,
                day: self.day,
                checked_in: self.checked_in,
                entry_ts: self.entry_ts,
                exit_ts: self.exit_ts,
                periods,
            },
        })
    }
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Create tables on first boot.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subjects (
                id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
                card_token VARCHAR(64) NOT NULL UNIQUE,
                display_name VARCHAR(255) NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attendance_days (
                subject_id BIGINT UNSIGNED NOT NULL,
                day DATE NOT NULL,
                checked_in BOOLEAN NOT NULL DEFAULT FALSE,
                entry_ts TIMESTAMP(6) NULL,
                exit_ts TIMESTAMP(6) NULL,
                periods TEXT NOT NULL,
                version BIGINT UNSIGNED NOT NULL,
                PRIMARY KEY (subject_id, day)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn is_duplicate_key(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        return db_err.code().as_deref() == Some("23000");
    }
    false
}

impl RecordStore for MySqlStore {
    async fn get_record(
        &self,
        subject_id: u64,
        day: NaiveDate,
    ) -> Result<Option<Versioned<AttendanceRecord>>, StoreError> {
        let row = sqlx::query_as::<_, DayRow>(
            r#"
            SELECT subject_id, day, checked_in, entry_ts, exit_ts, periods, version
            FROM attendance_days
            WHERE subject_id = ? AND day = ?
            "#,
        )
        .bind(subject_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DayRow::into_versioned).transpose()
    }

    async fn put_record(
        &self,
        expected_version: u64,
        record: &AttendanceRecord,
    ) -> Result<(), StoreError> {
        let periods = serde_json::to_string(&record.periods)
            .map_err(|e| StoreError::Corrupt(format!("periods encode: {e}")))?;

        if expected_version == 0 {
            let result = sqlx::query(
                r#"
                INSERT INTO attendance_days
                (subject_id, day, checked_in, entry_ts, exit_ts, periods, version)
                VALUES (?, ?, ?, ?, ?, ?, 1)
                "#,
            )
            .bind(record.subject_id)
            .bind(record.day)
            .bind(record.checked_in)
            .bind(record.entry_ts)
            .bind(record.exit_ts)
            .bind(&periods)
            .execute(&self.pool)
            .await;

            return match result {
                Ok(_) => Ok(()),
                // Someone else created the row first; caller reloads.
                Err(e) if is_duplicate_key(&e) => Err(StoreError::Conflict),
                Err(e) => Err(e.into()),
            };
        }

        let result = sqlx::query(
            r#"
            UPDATE attendance_days
            SET checked_in = ?, entry_ts = ?, exit_ts = ?, periods = ?, version = version + 1
            WHERE subject_id = ? AND day = ? AND version = ?
            "#,
        )
        .bind(record.checked_in)
        .bind(record.entry_ts)
        .bind(record.exit_ts)
        .bind(&periods)
        .bind(record.subject_id)
        .bind(record.day)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }
}

impl IdentityStore for MySqlStore {
    async fn lookup(&self, card_token: &str) -> Result<Option<Subject>, StoreError> {
        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, card_token, display_name FROM subjects WHERE card_token = ? LIMIT 1",
        )
        .bind(card_token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subject)
    }

    async fn register(
        &self,
        card_token: &str,
        display_name: &str,
    ) -> Result<Subject, StoreError> {
        let result = sqlx::query("INSERT INTO subjects (card_token, display_name) VALUES (?, ?)")
            .bind(card_token)
            .bind(display_name)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(Subject {
                id: done.last_insert_id(),
                card_token: card_token.to_string(),
                display_name: display_name.to_string(),
            }),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, page: u32, per_page: u32) -> Result<(Vec<Subject>, i64), StoreError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subjects")
                .fetch_one(&self.pool)
                .await?;

        let offset = u64::from(page.saturating_sub(1)) * u64::from(per_page);
        let data = sqlx::query_as::<_, Subject>(
            "SELECT id, card_token, display_name FROM subjects ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((data, total))
    }
}
