//! Blob storage for uploaded profile images

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),
    #[error("Blob not found: {0}")]
    NotFound(String),
    #[error("Blob storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blob storage unavailable: {0}")]
    Unavailable(String),
}

/// Reference to a stored blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub path: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`, overwriting any previous blob
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<BlobRef, BlobError>;

    /// Retrievable URL for a stored blob
    async fn download_url(&self, blob: &BlobRef) -> Result<String, BlobError>;
}

/// Blob store rooted at a local directory. URLs are `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a relative blob path under the root, rejecting traversal
    fn resolve(&self, path: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<BlobRef, BlobError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        Ok(BlobRef {
            path: path.to_string(),
        })
    }

    async fn download_url(&self, blob: &BlobRef) -> Result<String, BlobError> {
        let target = self.resolve(&blob.path)?;
        if !tokio::fs::try_exists(&target).await? {
            return Err(BlobError::NotFound(blob.path.clone()));
        }
        Ok(format!("file://{}", target.display()))
    }
}
