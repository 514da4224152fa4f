use serde::{Deserialize, Serialize};

use super::stage::{SubmissionMode, WorkflowStage};
use crate::data::ScanRecord;
use crate::inference::{DiagnosisPayload, ImageUpload};

/// Identity of one submission; a newer session always has a larger id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkflowSessionId(pub(crate) u64);

impl WorkflowSessionId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WorkflowSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scan-{}", self.0)
    }
}

/// In-memory state of one in-flight or finished submission
#[derive(Debug, Clone)]
pub struct WorkflowSession {
    pub id: WorkflowSessionId,
    pub mode: SubmissionMode,
    /// The selected image; also serves as the local preview
    pub source: ImageUpload,
    pub stage: WorkflowStage,
    pub payload: Option<DiagnosisPayload>,
    /// Set once the record has been written
    pub record: Option<ScanRecord>,
    /// User-facing failure message
    pub error: Option<String>,
}

impl WorkflowSession {
    pub(crate) fn acquired(id: WorkflowSessionId, mode: SubmissionMode, source: ImageUpload) -> Self {
        Self {
            id,
            mode,
            source,
            stage: WorkflowStage::Acquired,
            payload: None,
            record: None,
            error: None,
        }
    }

    pub fn preview(&self) -> &ImageUpload {
        &self.source
    }

    /// Whether the diagnosis is on screen
    pub fn has_result(&self) -> bool {
        self.payload.is_some()
    }
}
