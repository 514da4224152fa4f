//! Scan submission workflow: stages, sessions, and the engine driving them

mod engine;
mod events;
mod session;
mod stage;

pub use engine::{ScanWorkflow, WorkflowError, WorkflowTimings};
pub use events::{WorkflowEvent, WorkflowOutcome};
pub use session::{WorkflowSession, WorkflowSessionId};
pub use stage::{SubmissionMode, WorkflowStage};
