//! Mock inference client for deterministic testing
//!
//! Replays queued responses, each after an optional delay, and records every
//! upload it receives. Delays use tokio time so paused-clock tests stay exact.
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use thyroscan::inference::mock::{sample_payload, MockInferenceClient};
//!
//! let client = MockInferenceClient::new()
//!     .respond_after(Duration::from_secs(5), Ok(sample_payload("Papillary", "Malignant")))
//!     .respond(Err(thyroscan::InferenceError::Service("model unavailable".into())));
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::client::{ImageUpload, InferenceClient};
use super::error::InferenceError;
use super::payload::DiagnosisPayload;
use crate::data::Diagnosis;

/// One scripted reply
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub delay: Duration,
    pub result: Result<DiagnosisPayload, InferenceError>,
}

/// Build a plausible payload for tests
pub fn sample_payload(result: &str, diagnosis: &str) -> DiagnosisPayload {
    let slug = result.to_lowercase().replace(' ', "_");
    DiagnosisPayload {
        result: result.to_string(),
        diagnosis: Diagnosis::parse(diagnosis),
        confidence: "92.00%".to_string(),
        recommendation: super::explanations::recommendation_for(result).to_string(),
        heatmap_url: format!("/results/heatmap_{slug}.png"),
        original_url: format!("/uploads/{slug}.png"),
    }
}

#[derive(Default)]
pub struct MockInferenceClient {
    responses: Mutex<VecDeque<MockResponse>>,
    fallback: Mutex<Option<MockResponse>>,
    captured: Mutex<Vec<ImageUpload>>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an immediate reply
    pub fn respond(self, result: Result<DiagnosisPayload, InferenceError>) -> Self {
        self.respond_after(Duration::ZERO, result)
    }

    /// Queue a reply delivered after `delay`
    pub fn respond_after(
        self,
        delay: Duration,
        result: Result<DiagnosisPayload, InferenceError>,
    ) -> Self {
        self.responses.lock().push_back(MockResponse { delay, result });
        self
    }

    /// Reply used once the queue is exhausted
    pub fn with_fallback(self, delay: Duration, result: Result<DiagnosisPayload, InferenceError>) -> Self {
        *self.fallback.lock() = Some(MockResponse { delay, result });
        self
    }

    /// Uploads received so far, oldest first
    pub fn captured_uploads(&self) -> Vec<ImageUpload> {
        self.captured.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured.lock().len()
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn predict(&self, image: &ImageUpload) -> Result<DiagnosisPayload, InferenceError> {
        self.captured.lock().push(image.clone());

        let next = self
            .responses
            .lock()
            .pop_front()
            .or_else(|| self.fallback.lock().clone());
        let Some(response) = next else {
            return Err(InferenceError::Network("no mock response queued".to_string()));
        };

        if response.delay > Duration::ZERO {
            tokio::time::sleep(response.delay).await;
        }
        response.result
    }
}
