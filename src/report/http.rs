use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{ExportError, ReportRenderer, ReportRequest};

/// Renders reports through the analysis service's `/generate_report`
#[derive(Clone, Debug)]
pub struct HttpReportRenderer {
    base_url: String,
    client: Client,
}

impl HttpReportRenderer {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ExportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExportError::Network(e.to_string()))?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl ReportRenderer for HttpReportRenderer {
    async fn render(&self, request: &ReportRequest) -> Result<Vec<u8>, ExportError> {
        let url = format!("{}/generate_report", self.base_url);
        tracing::debug!(url = %url, report = request.id, "Requesting report");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ExportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::Rejected {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
