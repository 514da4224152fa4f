//! Fixtures for integration tests

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;
use thyroscan::data::{Database, LocalBlobStore, NewScanRecord, ProfileStore, ScanStore};
use thyroscan::inference::mock::sample_payload;
use thyroscan::{Identity, ImageUpload, UserId};

/// Fixed timestamp for testing (2024-01-01 00:00:00 UTC)
pub const TEST_TIMESTAMP: &str = "2024-01-01T00:00:00Z";

pub fn test_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(TEST_TIMESTAMP)
        .expect("Invalid test timestamp")
        .with_timezone(&Utc)
}

/// Smallest byte sequence recognised as a PNG
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 13];

pub fn png(name: &str) -> ImageUpload {
    ImageUpload::from_bytes(name, PNG_BYTES.to_vec())
}

pub fn identity(id: &str) -> Identity {
    Identity::new(UserId::from_string(id))
        .with_display_name(id)
        .with_email(format!("{id}@example.org"))
}

/// SQLite and filesystem stores living in one temporary directory
pub struct TestStores {
    pub db: Database,
    pub scans: Arc<ScanStore>,
    pub profiles: Arc<ProfileStore>,
    pub blobs: Arc<LocalBlobStore>,
    pub dir: TempDir,
}

pub fn create_test_stores() -> TestStores {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open(dir.path().join("test.db")).expect("Failed to open database");
    TestStores {
        scans: Arc::new(ScanStore::new(db.clone())),
        profiles: Arc::new(ProfileStore::new(db.clone())),
        blobs: Arc::new(LocalBlobStore::new(dir.path().join("blobs"))),
        db,
        dir,
    }
}

/// A record for `user` taken `minutes_ago` before [`test_now`]
pub fn scan_at(user: &str, subtype: &str, minutes_ago: i64) -> NewScanRecord {
    let diagnosis = if subtype == "Benign" { "Benign" } else { "Malignant" };
    NewScanRecord::from_payload(
        UserId::from_string(user),
        &sample_payload(subtype, diagnosis),
        test_now() - Duration::minutes(minutes_ago),
    )
}
