//! Data persistence layer
//!
//! Repository contracts for profiles, scan records and blobs, with SQLite and
//! filesystem implementations plus in-memory doubles.

mod blob;
mod database;
pub mod memory;
mod migrations;
mod models;
mod profile;
mod repository;
mod scan;

pub use blob::{BlobError, BlobRef, BlobStore, LocalBlobStore};
pub use database::{Database, DatabaseError};
pub use memory::{InMemoryBlobStore, InMemoryProfileRepository, InMemoryScanRepository};
pub use models::{Diagnosis, NewScanRecord, Profile, ProfilePatch, ScanRecord};
pub use profile::ProfileStore;
pub use repository::{ProfileRepository, RepositoryError, ScanRepository};
pub use scan::ScanStore;
