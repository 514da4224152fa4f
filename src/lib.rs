pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod history;
pub mod identity;
pub mod inference;
pub mod profile;
pub mod report;
pub mod util;
pub mod workflow;

pub use config::Config;
pub use dashboard::{Backends, Dashboard};
pub use data::{
    Database, Diagnosis, LocalBlobStore, ProfileStore, RepositoryError, ScanRecord, ScanStore,
};
pub use error::{Error, Result};
pub use history::HistoryViewModel;
pub use identity::{Identity, LocalSessionStore, SessionStore, UserId};
pub use inference::{DiagnosisPayload, HttpInferenceClient, ImageUpload, InferenceClient, InferenceError};
pub use profile::{ProfileForm, ProfileService};
pub use report::{ExportError, HttpReportRenderer, ReportExporter};
pub use workflow::{
    ScanWorkflow, SubmissionMode, WorkflowError, WorkflowEvent, WorkflowOutcome, WorkflowStage,
    WorkflowTimings,
};
