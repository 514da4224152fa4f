use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::data::ScanRecord;
use crate::inference::DiagnosisPayload;

use super::session::WorkflowSessionId;
use super::stage::WorkflowStage;

/// Side-channel notifications published by the scan workflow
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// A session entered a new stage
    StageChanged {
        session: WorkflowSessionId,
        stage: WorkflowStage,
        at: Instant,
    },
    /// The diagnosis is shown but could not be saved
    PersistenceFailed {
        session: WorkflowSessionId,
        message: String,
    },
    /// Saved, but the history list could not be refreshed
    HistoryRefreshFailed {
        session: WorkflowSessionId,
        message: String,
    },
    /// A newer session (or a reset) replaced this one before it finished
    Superseded { session: WorkflowSessionId },
}

impl WorkflowEvent {
    pub fn session(&self) -> WorkflowSessionId {
        match self {
            WorkflowEvent::StageChanged { session, .. }
            | WorkflowEvent::PersistenceFailed { session, .. }
            | WorkflowEvent::HistoryRefreshFailed { session, .. }
            | WorkflowEvent::Superseded { session } => *session,
        }
    }
}

/// How a submission ended, from the submitter's point of view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkflowOutcome {
    Completed {
        session: WorkflowSessionId,
        payload: DiagnosisPayload,
        /// None when nobody was signed in or the write failed
        record: Option<ScanRecord>,
    },
    Failed {
        session: WorkflowSessionId,
        message: String,
    },
    /// Discarded because a newer submission started
    Superseded { session: WorkflowSessionId },
}

impl WorkflowOutcome {
    pub fn session(&self) -> WorkflowSessionId {
        match self {
            WorkflowOutcome::Completed { session, .. }
            | WorkflowOutcome::Failed { session, .. }
            | WorkflowOutcome::Superseded { session } => *session,
        }
    }
}
