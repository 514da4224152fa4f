//! Application root
//!
//! Owns the single session-store subscription. Identity changes fan out to
//! the profile and history; submissions are routed to the guided or fast
//! path according to the stored preference.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::data::{BlobStore, ProfileRepository, ScanRepository};
use crate::error::{Error, Result};
use crate::history::HistoryViewModel;
use crate::identity::{Identity, SessionStore};
use crate::inference::{AssetUrls, ImageUpload, InferenceClient};
use crate::profile::ProfileService;
use crate::report::{ReportExporter, ReportRenderer};
use crate::workflow::{ScanWorkflow, SubmissionMode, WorkflowError, WorkflowOutcome};

/// External collaborators the dashboard is wired to
#[derive(Clone)]
pub struct Backends {
    pub session: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub scans: Arc<dyn ScanRepository>,
    pub blobs: Arc<dyn BlobStore>,
    pub inference: Arc<dyn InferenceClient>,
    pub reports: Arc<dyn ReportRenderer>,
}

#[derive(Clone)]
pub struct Dashboard {
    session: Arc<dyn SessionStore>,
    identity: Arc<RwLock<Option<Identity>>>,
    workflow: ScanWorkflow,
    history: HistoryViewModel,
    profile: ProfileService,
    exporter: ReportExporter,
    assets: AssetUrls,
}

impl Dashboard {
    pub fn new(backends: Backends, config: &Config) -> Self {
        let history = HistoryViewModel::new(backends.scans.clone());
        let workflow = ScanWorkflow::new(
            backends.inference,
            backends.scans,
            history.clone(),
            config.workflow_timings(),
        );
        let profile = ProfileService::new(
            backends.session.clone(),
            backends.profiles,
            backends.blobs,
        );
        let exporter = ReportExporter::new(backends.reports, config.reports_dir.clone());

        Self {
            session: backends.session,
            identity: Arc::new(RwLock::new(None)),
            workflow,
            history,
            profile,
            exporter,
            assets: AssetUrls::new(config.service.base_url.clone()),
        }
    }

    /// Follow the session store until it closes. The current identity is
    /// applied immediately.
    pub fn spawn_identity_listener(&self) -> JoinHandle<()> {
        let dashboard = self.clone();
        let mut rx = self.session.subscribe();
        tokio::spawn(async move {
            loop {
                let identity = rx.borrow_and_update().clone();
                dashboard.on_identity_changed(identity).await;
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Re-derive profile and history for a new identity, or clear them on sign-out.
    ///
    /// Switching to a different user drops the in-flight scan and the previous
    /// user's state before loading. Republishing the same user keeps both.
    pub async fn on_identity_changed(&self, identity: Option<Identity>) {
        let previous = std::mem::replace(&mut *self.identity.write(), identity.clone());

        let Some(identity) = identity else {
            tracing::debug!("Identity cleared");
            self.profile.clear();
            self.history.clear();
            self.workflow.reset();
            return;
        };

        tracing::debug!(user = %identity.id, "Identity changed");
        if previous.is_some_and(|previous| previous.id != identity.id) {
            self.workflow.reset();
            self.profile.clear();
            self.history.clear();
        }
        // History logs its own failures and keeps the previous list
        let (profile, _history) = tokio::join!(
            self.profile.load_profile(&identity),
            self.history.load(&identity.id)
        );
        if let Err(e) = profile {
            tracing::warn!(user = %identity.id, error = %e, "Failed to load profile");
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity.read().clone()
    }

    pub fn submission_mode(&self) -> SubmissionMode {
        SubmissionMode::from_preference(self.profile.show_process_flow())
    }

    /// Submit an image using the current identity and process-flow preference
    pub async fn submit_scan(
        &self,
        upload: ImageUpload,
    ) -> std::result::Result<WorkflowOutcome, WorkflowError> {
        let mode = self.submission_mode();
        self.workflow.submit(upload, mode, self.identity()).await
    }

    /// Export the diagnosis currently on screen
    pub async fn export_latest_report(&self) -> Result<PathBuf> {
        let payload = self
            .workflow
            .current()
            .and_then(|session| session.payload)
            .ok_or(Error::NoCompletedScan)?;
        Ok(self.exporter.export(&payload).await?)
    }

    /// Absolute heatmap URL for the diagnosis on screen, cache-busted
    pub fn heatmap_url(&self) -> Option<String> {
        let session = self.workflow.current()?;
        let payload = session.payload?;
        Some(
            self.assets
                .resolve_fresh(&payload.heatmap_url, Utc::now().timestamp_millis()),
        )
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.session.sign_out().await?;
        self.on_identity_changed(None).await;
        Ok(())
    }

    pub fn workflow(&self) -> &ScanWorkflow {
        &self.workflow
    }

    pub fn history(&self) -> &HistoryViewModel {
        &self.history
    }

    pub fn profile(&self) -> &ProfileService {
        &self.profile
    }

    pub fn exporter(&self) -> &ReportExporter {
        &self.exporter
    }

    pub fn assets(&self) -> &AssetUrls {
        &self.assets
    }
}
