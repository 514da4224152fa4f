//! Scripted report renderer for tests

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ExportError, ReportRenderer, ReportRequest};

#[derive(Default)]
pub struct MockReportRenderer {
    responses: Mutex<VecDeque<Result<Vec<u8>, ExportError>>>,
    requests: Mutex<Vec<ReportRequest>>,
}

impl MockReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, result: Result<Vec<u8>, ExportError>) -> Self {
        self.responses.lock().push_back(result);
        self
    }

    pub fn requests(&self) -> Vec<ReportRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ReportRenderer for MockReportRenderer {
    async fn render(&self, request: &ReportRequest) -> Result<Vec<u8>, ExportError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ExportError::Network("no scripted response".to_string())))
    }
}
