//! Crate-wide error type for callers that drive several components

use thiserror::Error;

use crate::data::{BlobError, DatabaseError, RepositoryError};
use crate::identity::AuthError;
use crate::inference::InferenceError;
use crate::profile::ProfileError;
use crate::report::ExportError;
use crate::workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("No completed scan to export")]
    NoCompletedScan,
    #[error("No identity is signed in")]
    NotSignedIn,
}

pub type Result<T> = std::result::Result<T, Error>;
