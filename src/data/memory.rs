//! In-memory repositories for deterministic testing
//!
//! Implement the repository and blob contracts without touching disk, with
//! switches to simulate backend failures and counters for assertions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::blob::{BlobError, BlobRef, BlobStore};
use super::models::{NewScanRecord, Profile, ProfilePatch, ScanRecord};
use super::repository::{ProfileRepository, RepositoryError, ScanRepository};
use crate::identity::UserId;

fn unavailable(op: &str) -> RepositoryError {
    RepositoryError::Unavailable(format!("simulated {op} failure"))
}

/// Scan collection held in memory
#[derive(Default)]
pub struct InMemoryScanRepository {
    records: Mutex<Vec<ScanRecord>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    fail_deletes: AtomicBool,
    writes: AtomicUsize,
    write_delay: Mutex<Duration>,
    read_delays: Mutex<HashMap<UserId, Duration>>,
}

impl InMemoryScanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record as-is (including a missing timestamp)
    pub fn insert(&self, record: ScanRecord) {
        self.records.lock().push(record);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Suspend every `add` for `delay` before storing
    pub fn delay_writes(&self, delay: Duration) {
        *self.write_delay.lock() = delay;
    }

    /// Suspend `query_by_user(user)` for `delay` before answering
    pub fn delay_reads(&self, user: &UserId, delay: Duration) {
        self.read_delays.lock().insert(user.clone(), delay);
    }

    /// Every stored record, in insertion order
    pub fn records(&self) -> Vec<ScanRecord> {
        self.records.lock().clone()
    }

    /// Number of successful `add` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScanRepository for InMemoryScanRepository {
    async fn add(&self, scan: NewScanRecord) -> Result<ScanRecord, RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable("write"));
        }
        let delay = *self.write_delay.lock();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        let record = scan.into_record(Uuid::new_v4());
        self.records.lock().push(record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn query_by_user(&self, user: &UserId) -> Result<Vec<ScanRecord>, RepositoryError> {
        let delay = self.read_delays.lock().get(user).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable("read"));
        }
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|record| &record.user_id == user)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(unavailable("delete"));
        }
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}

/// Profile documents held in memory
#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<UserId, Profile>>,
    fail_writes: AtomicBool,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self, user: &UserId) -> Option<Profile> {
        self.profiles.lock().get(user).cloned()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get(&self, user: &UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.profiles.lock().get(user).cloned())
    }

    async fn merge_write(
        &self,
        user: &UserId,
        patch: &ProfilePatch,
    ) -> Result<Profile, RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable("write"));
        }
        let mut profiles = self.profiles.lock();
        let profile = profiles
            .entry(user.clone())
            .or_insert_with(|| Profile::empty(user.clone()));
        profile.apply(patch);
        Ok(profile.clone())
    }
}

/// Blob store held in memory. URLs use the `memory://` scheme.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
    fail_urls: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_urls(&self, fail: bool) {
        self.fail_urls.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.lock().get(path).cloned()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<BlobRef, BlobError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("simulated upload failure".to_string()));
        }
        self.blobs.lock().insert(path.to_string(), bytes.to_vec());
        Ok(BlobRef {
            path: path.to_string(),
        })
    }

    async fn download_url(&self, blob: &BlobRef) -> Result<String, BlobError> {
        if self.fail_urls.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("simulated url failure".to_string()));
        }
        if !self.blobs.lock().contains_key(&blob.path) {
            return Err(BlobError::NotFound(blob.path.clone()));
        }
        Ok(format!("memory://{}", blob.path))
    }
}
