//! Scan submission workflow
//!
//! Drives one image from selection to a displayed, persisted diagnosis:
//!
//! ```text
//! Idle -> Acquired -> Preprocessing -> Analyzing -> Visualizing -> Persisting -> Complete
//!                 \_____________ fast path _______/              \__ no identity __/
//! ```
//!
//! `Failed` is reachable from every non-terminal stage. Every transition is
//! tagged with the session it belongs to; once a newer session starts, late
//! timers and responses from the older one are dropped without touching state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;

use super::events::{WorkflowEvent, WorkflowOutcome};
use super::session::{WorkflowSession, WorkflowSessionId};
use super::stage::{SubmissionMode, WorkflowStage};
use crate::data::{NewScanRecord, ScanRecord, ScanRepository};
use crate::history::HistoryViewModel;
use crate::identity::{Identity, UserId};
use crate::inference::{DiagnosisPayload, ImageUpload, InferenceClient, InferenceError};

const EVENT_CAPACITY: usize = 64;

/// Guided path choreography and the inference deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowTimings {
    /// Offset from acquisition at which preprocessing is shown
    pub preprocess_after: Duration,
    /// Offset from acquisition at which analysis is shown; also the minimum
    /// time before a guided result can appear
    pub analyze_after: Duration,
    pub request_timeout: Duration,
}

impl Default for WorkflowTimings {
    fn default() -> Self {
        Self {
            preprocess_after: Duration::from_millis(1500),
            analyze_after: Duration::from_millis(3500),
            request_timeout: Duration::from_secs(45),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("The selected image is empty")]
    EmptyImage,
    #[error("Illegal stage transition from {from:?} to {to:?}")]
    IllegalTransition {
        from: WorkflowStage,
        to: WorkflowStage,
    },
}

/// Why a session stopped making progress
#[derive(Debug)]
enum Halt {
    /// A newer session owns the workflow
    Stale,
    Illegal(WorkflowStage, WorkflowStage),
}

enum Interrupt {
    Halt(Halt),
    Inference(InferenceError),
}

#[derive(Default)]
struct WorkflowState {
    last_id: u64,
    active: Option<WorkflowSession>,
}

struct Inner {
    inference: Arc<dyn InferenceClient>,
    scans: Arc<dyn ScanRepository>,
    history: HistoryViewModel,
    timings: WorkflowTimings,
    state: Mutex<WorkflowState>,
    snapshot: watch::Sender<Option<WorkflowSession>>,
    events: broadcast::Sender<WorkflowEvent>,
}

/// Client-side scan workflow engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ScanWorkflow {
    inner: Arc<Inner>,
}

impl ScanWorkflow {
    pub fn new(
        inference: Arc<dyn InferenceClient>,
        scans: Arc<dyn ScanRepository>,
        history: HistoryViewModel,
        timings: WorkflowTimings,
    ) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                inference,
                scans,
                history,
                timings,
                state: Mutex::new(WorkflowState::default()),
                snapshot,
                events,
            }),
        }
    }

    /// Latest session snapshot for renderers; None while idle
    pub fn subscribe(&self) -> watch::Receiver<Option<WorkflowSession>> {
        self.inner.snapshot.subscribe()
    }

    /// Stage changes and side-channel failures
    pub fn events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.inner.events.subscribe()
    }

    pub fn current(&self) -> Option<WorkflowSession> {
        self.inner.state.lock().active.clone()
    }

    pub fn stage(&self) -> WorkflowStage {
        self.inner
            .state
            .lock()
            .active
            .as_ref()
            .map(|session| session.stage)
            .unwrap_or(WorkflowStage::Idle)
    }

    pub fn timings(&self) -> WorkflowTimings {
        self.inner.timings
    }

    /// Abandon the current session and return to `Idle`
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        if let Some(previous) = state.active.take() {
            if !previous.stage.is_terminal() {
                self.emit(WorkflowEvent::Superseded {
                    session: previous.id,
                });
            }
        }
        self.inner.snapshot.send_replace(None);
    }

    /// Run one submission to its end.
    ///
    /// Starting a submission supersedes any session still in flight; the
    /// superseded call resolves to [`WorkflowOutcome::Superseded`] and never
    /// persists. `identity` is None for anonymous use, in which case nothing
    /// is written.
    pub async fn submit(
        &self,
        upload: ImageUpload,
        mode: SubmissionMode,
        identity: Option<Identity>,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        if upload.is_empty() {
            return Err(WorkflowError::EmptyImage);
        }

        let started = Instant::now();
        let id = self.begin(upload.clone(), mode);

        match self.run(id, started, &upload, mode, identity.as_ref()).await {
            Ok(outcome) => Ok(outcome),
            Err(Halt::Stale) => {
                tracing::debug!(session = %id, "Discarding superseded scan session");
                Ok(WorkflowOutcome::Superseded { session: id })
            }
            Err(Halt::Illegal(from, to)) => {
                tracing::error!(session = %id, ?from, ?to, "Illegal stage transition");
                Err(WorkflowError::IllegalTransition { from, to })
            }
        }
    }

    fn begin(&self, upload: ImageUpload, mode: SubmissionMode) -> WorkflowSessionId {
        let mut state = self.inner.state.lock();
        state.last_id += 1;
        let id = WorkflowSessionId(state.last_id);

        let session = WorkflowSession::acquired(id, mode, upload);
        if let Some(previous) = state.active.replace(session.clone()) {
            if !previous.stage.is_terminal() {
                self.emit(WorkflowEvent::Superseded {
                    session: previous.id,
                });
            }
        }

        self.inner.snapshot.send_replace(Some(session));
        self.emit(WorkflowEvent::StageChanged {
            session: id,
            stage: WorkflowStage::Acquired,
            at: Instant::now(),
        });
        tracing::info!(session = %id, mode = mode.as_str(), "Scan session started");
        id
    }

    async fn run(
        &self,
        id: WorkflowSessionId,
        started: Instant,
        upload: &ImageUpload,
        mode: SubmissionMode,
        identity: Option<&Identity>,
    ) -> Result<WorkflowOutcome, Halt> {
        let inference = self.infer(upload);

        let response = match mode {
            SubmissionMode::Fast => inference.await,
            SubmissionMode::Guided => {
                // Visualizing waits for the later of the choreography and the response
                let joined = tokio::try_join!(
                    async { self.choreograph(id, started).await.map_err(Interrupt::Halt) },
                    async { inference.await.map_err(Interrupt::Inference) },
                );
                match joined {
                    Ok(((), payload)) => Ok(payload),
                    Err(Interrupt::Halt(halt)) => return Err(halt),
                    Err(Interrupt::Inference(e)) => Err(e),
                }
            }
        };

        let payload = match response {
            Ok(payload) => payload,
            Err(e) => return self.fail(id, e),
        };

        self.advance(id, WorkflowStage::Visualizing, |session| {
            session.payload = Some(payload.clone());
        })?;
        tracing::info!(
            session = %id,
            result = %payload.result,
            diagnosis = %payload.diagnosis,
            "Scan analysis complete"
        );

        let Some(identity) = identity else {
            self.advance(id, WorkflowStage::Complete, |_| {})?;
            return Ok(WorkflowOutcome::Completed {
                session: id,
                payload,
                record: None,
            });
        };

        self.advance(id, WorkflowStage::Persisting, |_| {})?;
        let record = self.persist(id, &identity.id, &payload).await;

        let completed = self.advance(id, WorkflowStage::Complete, |session| {
            session.record = record.clone();
        });
        completed?;
        if record.is_some() {
            self.refresh_history(id, &identity.id).await;
        }

        Ok(WorkflowOutcome::Completed {
            session: id,
            payload,
            record,
        })
    }

    /// Presentation-only stages of the guided path, timed from acquisition
    async fn choreograph(&self, id: WorkflowSessionId, started: Instant) -> Result<(), Halt> {
        let timings = self.inner.timings;

        tokio::time::sleep_until(started + timings.preprocess_after).await;
        self.advance(id, WorkflowStage::Preprocessing, |_| {})?;

        tokio::time::sleep_until(started + timings.analyze_after).await;
        self.advance(id, WorkflowStage::Analyzing, |_| {})?;

        Ok(())
    }

    async fn infer(&self, upload: &ImageUpload) -> Result<DiagnosisPayload, InferenceError> {
        let limit = self.inner.timings.request_timeout;
        tokio::time::timeout(limit, self.inner.inference.predict(upload))
            .await
            .unwrap_or_else(|_| Err(InferenceError::Timeout(limit)))
    }

    fn fail(&self, id: WorkflowSessionId, error: InferenceError) -> Result<WorkflowOutcome, Halt> {
        let message = error.user_message();
        self.advance(id, WorkflowStage::Failed, |session| {
            session.error = Some(message.clone());
        })?;
        tracing::warn!(session = %id, error = %error, "Scan analysis failed");
        Ok(WorkflowOutcome::Failed { session: id, message })
    }

    /// Write the record once. Failure is reported on the event channel only.
    async fn persist(
        &self,
        id: WorkflowSessionId,
        user: &UserId,
        payload: &DiagnosisPayload,
    ) -> Option<ScanRecord> {
        let scan = NewScanRecord::from_payload(user.clone(), payload, Utc::now());
        match self.inner.scans.add(scan).await {
            Ok(record) => {
                tracing::info!(session = %id, scan = %record.id, "Scan record saved");
                Some(record)
            }
            Err(e) => {
                tracing::error!(session = %id, error = %e, "Failed to save scan record");
                self.emit(WorkflowEvent::PersistenceFailed {
                    session: id,
                    message: e.to_string(),
                });
                None
            }
        }
    }

    async fn refresh_history(&self, id: WorkflowSessionId, user: &UserId) {
        if let Err(e) = self.inner.history.load(user).await {
            self.emit(WorkflowEvent::HistoryRefreshFailed {
                session: id,
                message: e.to_string(),
            });
        }
    }

    /// Apply a transition if `id` is still the active session
    fn advance(
        &self,
        id: WorkflowSessionId,
        next: WorkflowStage,
        update: impl FnOnce(&mut WorkflowSession),
    ) -> Result<(), Halt> {
        let mut state = self.inner.state.lock();
        let Some(session) = state.active.as_mut().filter(|session| session.id == id) else {
            return Err(Halt::Stale);
        };
        if !session.stage.can_transition_to(next, session.mode) {
            return Err(Halt::Illegal(session.stage, next));
        }

        update(session);
        session.stage = next;
        tracing::debug!(session = %id, stage = ?next, "Scan stage changed");

        self.inner.snapshot.send_replace(Some(session.clone()));
        self.emit(WorkflowEvent::StageChanged {
            session: id,
            stage: next,
            at: Instant::now(),
        });
        Ok(())
    }

    fn emit(&self, event: WorkflowEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}
