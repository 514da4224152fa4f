use std::time::Duration;

use thiserror::Error;

/// Message shown when the service reports a failure without explaining it
pub const DEFAULT_FAILURE_MESSAGE: &str = "Unknown error";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceError {
    /// Transport failure reaching the analysis service
    #[error("Network error: {0}")]
    Network(String),
    #[error("Analysis request timed out after {0:?}")]
    Timeout(Duration),
    /// The service answered with an explicit `error` message
    #[error("Analysis service error: {0}")]
    Service(String),
    /// Malformed or incomplete response
    #[error("Invalid analysis response: {0}")]
    Validation(String),
}

impl InferenceError {
    /// Message surfaced to the user when a submission fails
    pub fn user_message(&self) -> String {
        match self {
            InferenceError::Service(message) => message.clone(),
            InferenceError::Validation(_) => DEFAULT_FAILURE_MESSAGE.to_string(),
            InferenceError::Network(_) => "Error connecting to diagnostic server".to_string(),
            InferenceError::Timeout(_) => "Diagnostic server did not respond in time".to_string(),
        }
    }
}
