//! Analysis service client

mod assets;
mod client;
mod error;
pub mod explanations;
pub mod mock;
mod payload;

pub use assets::AssetUrls;
pub use client::{HttpInferenceClient, ImageUpload, InferenceClient, ServiceHealth};
pub use error::{InferenceError, DEFAULT_FAILURE_MESSAGE};
pub use explanations::{medical_explanation, recommendation_for};
pub use mock::MockInferenceClient;
pub use payload::DiagnosisPayload;
