//! Scan record data access object

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Result as SqliteResult};
use uuid::Uuid;

use super::database::Database;
use super::models::{Diagnosis, NewScanRecord, ScanRecord};
use super::repository::{RepositoryError, ScanRepository};
use crate::identity::UserId;

/// SQLite-backed scan collection
#[derive(Clone, Debug)]
pub struct ScanStore {
    db: Database,
}

impl ScanStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a record exactly as given; a missing timestamp is stored as NULL
    fn insert_raw(&self, record: &ScanRecord) -> Result<(), RepositoryError> {
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO scans (id, user_id, timestamp, diagnosis, subtype, confidence, recommendation, heatmap_url, original_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id.to_string(),
                    record.user_id.as_str(),
                    record.timestamp.map(|t| t.to_rfc3339()),
                    record.diagnosis.as_str(),
                    record.subtype,
                    record.confidence,
                    record.recommendation,
                    record.heatmap_url,
                    record.original_url,
                ],
            )
        })?;
        Ok(())
    }

    /// Convert a database row to a ScanRecord
    fn row_to_record(row: &rusqlite::Row) -> SqliteResult<ScanRecord> {
        let id_str: String = row.get(0)?;
        let user_id: String = row.get(1)?;
        let timestamp_raw: Option<String> = row.get(2)?;
        let diagnosis: String = row.get(3)?;

        let id = Uuid::parse_str(&id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(ScanRecord {
            id,
            user_id: UserId::from_string(user_id),
            timestamp: timestamp_raw
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            diagnosis: Diagnosis::parse(&diagnosis),
            subtype: row.get(4)?,
            confidence: row.get(5)?,
            recommendation: row.get(6)?,
            heatmap_url: row.get(7)?,
            original_url: row.get(8)?,
        })
    }
}

#[async_trait]
impl ScanRepository for ScanStore {
    async fn add(&self, scan: NewScanRecord) -> Result<ScanRecord, RepositoryError> {
        let record = scan.into_record(Uuid::new_v4());
        self.insert_raw(&record)?;
        tracing::debug!(scan = %record.id, user = %record.user_id, "Scan record stored");
        Ok(record)
    }

    async fn query_by_user(&self, user: &UserId) -> Result<Vec<ScanRecord>, RepositoryError> {
        let records = self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, timestamp, diagnosis, subtype, confidence, recommendation, heatmap_url, original_url
                 FROM scans WHERE user_id = ?1",
            )?;
            let records = stmt
                .query_map(params![user.as_str()], Self::row_to_record)?
                .collect::<SqliteResult<Vec<_>>>()?;
            Ok(records)
        })?;
        Ok(records)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let deleted = self.db.with_connection(|conn| {
            conn.execute("DELETE FROM scans WHERE id = ?1", params![id.to_string()])
        })?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}
