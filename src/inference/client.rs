use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::error::InferenceError;
use super::payload::DiagnosisPayload;

/// An image selected for analysis.
///
/// Cloning shares the underlying bytes; the clone doubles as the local
/// preview reference while a submission is in flight.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    data: Arc<[u8]>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: bytes.into(),
        }
    }

    /// Build an upload with the content type guessed from the file name
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self::new(file_name, content_type, bytes)
    }

    /// Read an upload from disk
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Client for the remote analysis endpoint
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn predict(&self, image: &ImageUpload) -> Result<DiagnosisPayload, InferenceError>;
}

/// `/health` response
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
}

/// HTTP client for the analysis service
#[derive(Clone, Debug)]
pub struct HttpInferenceClient {
    base_url: String,
    client: Client,
}

impl HttpInferenceClient {
    /// `timeout` bounds each request end to end
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Network(e.to_string()))?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<ServiceHealth, InferenceError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await.map_err(map_transport)?;
        if !response.status().is_success() {
            return Err(InferenceError::Validation(format!(
                "health check returned {}",
                response.status()
            )));
        }
        response
            .json::<ServiceHealth>()
            .await
            .map_err(|e| InferenceError::Validation(e.to_string()))
    }
}

fn map_transport(err: reqwest::Error) -> InferenceError {
    if err.is_timeout() {
        InferenceError::Network(format!("request timed out: {err}"))
    } else {
        InferenceError::Network(err.to_string())
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn predict(&self, image: &ImageUpload) -> Result<DiagnosisPayload, InferenceError> {
        let url = format!("{}/predict", self.base_url);
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| InferenceError::Validation(format!("invalid content type: {e}")))?;
        let form = Form::new().part("file", part);

        tracing::debug!(url = %url, file = %image.file_name, bytes = image.len(), "Submitting image for analysis");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport)?;

        DiagnosisPayload::from_response(status.is_success(), &body)
    }
}
