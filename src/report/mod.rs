//! PDF report export for completed diagnoses

mod http;
pub mod mock;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::inference::DiagnosisPayload;

pub use http::HttpReportRenderer;
pub use mock::MockReportRenderer;

/// Dataset label sent with every report request
pub const REPORT_DATASET: &str = "Thyroid Ultrasound";

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Report service rejected the request with status {status}")]
    Rejected { status: u16 },
    #[error("Report service did not return a PDF document")]
    InvalidDocument,
    #[error("Failed to save report: {0}")]
    Io(#[from] std::io::Error),
}

/// Body of `POST /generate_report`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Millisecond timestamp; also names the saved file
    pub id: i64,
    pub dataset: String,
    pub prediction: DiagnosisPayload,
    /// Local date, e.g. `3/7/2025`
    pub date: String,
}

impl ReportRequest {
    pub fn new(prediction: DiagnosisPayload, now: DateTime<Local>) -> Self {
        Self {
            id: now.timestamp_millis(),
            dataset: REPORT_DATASET.to_string(),
            prediction,
            date: now.format("%-m/%-d/%Y").to_string(),
        }
    }
}

/// Renders a report request into document bytes
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render(&self, request: &ReportRequest) -> Result<Vec<u8>, ExportError>;
}

pub fn report_file_name(id: i64) -> String {
    format!("Thyroid_Report_{}.pdf", id)
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Requests reports and saves them under an output directory
#[derive(Clone)]
pub struct ReportExporter {
    renderer: Arc<dyn ReportRenderer>,
    output_dir: PathBuf,
}

impl ReportExporter {
    pub fn new(renderer: Arc<dyn ReportRenderer>, output_dir: PathBuf) -> Self {
        Self {
            renderer,
            output_dir,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Export `payload` as a PDF and return the saved path. No retry.
    pub async fn export(&self, payload: &DiagnosisPayload) -> Result<PathBuf, ExportError> {
        self.export_at(payload, Local::now()).await
    }

    pub async fn export_at(
        &self,
        payload: &DiagnosisPayload,
        now: DateTime<Local>,
    ) -> Result<PathBuf, ExportError> {
        let request = ReportRequest::new(payload.clone(), now);
        let document = self.renderer.render(&request).await?;
        if !is_pdf(&document) {
            tracing::warn!(report = request.id, bytes = document.len(), "Report response is not a PDF");
            return Err(ExportError::InvalidDocument);
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(report_file_name(request.id));
        tokio::fs::write(&path, &document).await?;

        tracing::info!(path = %path.display(), "Report saved");
        Ok(path)
    }
}
