//! Document repository contracts
//!
//! Collections are typed per document kind. No ordering is assumed from the
//! backing store; callers sort client-side.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::database::DatabaseError;
use super::models::{NewScanRecord, Profile, ProfilePatch, ScanRecord};
use crate::identity::UserId;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Record {0} not found")]
    NotFound(Uuid),
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        RepositoryError::Database(DatabaseError::Sqlite(err))
    }
}

/// Append-only collection of scan records keyed by identity
#[async_trait]
pub trait ScanRepository: Send + Sync {
    /// Store a new record and return it with its assigned id
    async fn add(&self, scan: NewScanRecord) -> Result<ScanRecord, RepositoryError>;

    /// All records belonging to `user`, in no particular order
    async fn query_by_user(&self, user: &UserId) -> Result<Vec<ScanRecord>, RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// One profile document per identity
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// None until the first write
    async fn get(&self, user: &UserId) -> Result<Option<Profile>, RepositoryError>;

    /// Merge `patch` into the stored document, creating it if needed
    async fn merge_write(&self, user: &UserId, patch: &ProfilePatch)
        -> Result<Profile, RepositoryError>;
}
