//! Profile document data access object

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

use super::database::Database;
use super::models::{Profile, ProfilePatch};
use super::repository::{ProfileRepository, RepositoryError};
use crate::identity::UserId;

/// SQLite-backed profile documents
#[derive(Clone, Debug)]
pub struct ProfileStore {
    db: Database,
}

impl ProfileStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn read(conn: &Connection, user: &UserId) -> SqliteResult<Option<Profile>> {
        conn.query_row(
            "SELECT user_id, phone, address, show_process_flow, updated_at
             FROM profiles WHERE user_id = ?1",
            params![user.as_str()],
            |row| {
                let user_id: String = row.get(0)?;
                let show_process_flow: i32 = row.get(3)?;
                let updated_at: Option<String> = row.get(4)?;
                Ok(Profile {
                    user_id: UserId::from_string(user_id),
                    phone: row.get(1)?,
                    address: row.get(2)?,
                    show_process_flow: show_process_flow != 0,
                    updated_at: updated_at
                        .as_deref()
                        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                        .map(|dt| dt.with_timezone(&Utc)),
                })
            },
        )
        .optional()
    }
}

#[async_trait]
impl ProfileRepository for ProfileStore {
    async fn get(&self, user: &UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.db.with_connection(|conn| Self::read(conn, user))?)
    }

    async fn merge_write(
        &self,
        user: &UserId,
        patch: &ProfilePatch,
    ) -> Result<Profile, RepositoryError> {
        let profile = self.db.with_connection(|conn| {
            let mut profile = Self::read(conn, user)?.unwrap_or_else(|| Profile::empty(user.clone()));
            profile.apply(patch);
            conn.execute(
                "INSERT INTO profiles (user_id, phone, address, show_process_flow, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                    phone = excluded.phone,
                    address = excluded.address,
                    show_process_flow = excluded.show_process_flow,
                    updated_at = excluded.updated_at",
                params![
                    profile.user_id.as_str(),
                    profile.phone,
                    profile.address,
                    profile.show_process_flow as i32,
                    profile.updated_at.map(|t| t.to_rfc3339()),
                ],
            )?;
            Ok(profile)
        })?;
        Ok(profile)
    }
}
