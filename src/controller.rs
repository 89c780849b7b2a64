use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_with::skip_serializing_none;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    client::{preview, Transport},
    error::SubmitError,
    models::{FormState, Mode, Payload, UploadedFile},
    outcome::{transition, Event, RequestOutcome},
};

#[derive(Debug, Default)]
struct ControllerState {
    form: FormState,
    file: Option<UploadedFile>,
    outcome: RequestOutcome,
    submission_id: Option<Uuid>,
    completed_at: Option<DateTime<Utc>>,
}

/// Plain view of a controller for rendering.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub form: FormState,
    pub file_name: Option<String>,
    pub status: &'static str,
    pub loading: bool,
    pub payload: Option<Payload>,
    pub message: Option<String>,
    pub submission_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One workflow's form, selected file and request outcome.
///
/// The lock is never held across the network call; the Loading outcome is
/// what keeps a second request from going out. The call itself runs in its
/// own task, so its result is recorded even if the caller stops waiting.
pub struct Controller {
    mode: Mode,
    transport: Arc<dyn Transport>,
    state: Arc<Mutex<ControllerState>>,
}

impl Controller {
    pub fn new(mode: Mode, transport: Arc<dyn Transport>) -> Self {
        Self { mode, transport, state: Arc::default() }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Callers are expected to have checked `Mode::accepts_field`.
    pub fn set_field(&self, field: impl Into<String>, value: impl Into<String>) {
        self.state.lock().form.set(field, value);
    }

    pub fn select_file(&self, file: UploadedFile) {
        info!(
            mode = %self.mode,
            file = %file.name,
            bytes = file.bytes.len(),
            "📎 File selected"
        );
        self.state.lock().file = Some(file);
    }

    /// Back to a fresh form. An in-flight request still lands when it returns.
    pub fn reset(&self) {
        let mut st = self.state.lock();
        let loading = st.outcome.is_loading();
        *st = ControllerState::default();
        if loading {
            st.outcome = RequestOutcome::Loading;
        }
    }

    pub fn outcome(&self) -> RequestOutcome {
        self.state.lock().outcome.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        let st = self.state.lock();
        Snapshot {
            mode: self.mode,
            form: st.form.clone(),
            file_name: st.file.as_ref().map(|f| f.name.clone()),
            status: st.outcome.status(),
            loading: st.outcome.is_loading(),
            payload: st.outcome.payload().cloned(),
            message: st.outcome.error().map(|e| e.message()),
            submission_id: st.submission_id,
            completed_at: st.completed_at,
        }
    }

    /// Validates the current form and file, sends one request, and records the result.
    ///
    /// Returns `None` when a request is already in flight; nothing changes then.
    /// Dropping the returned future does not leave the controller Loading.
    pub async fn submit(&self) -> Option<RequestOutcome> {
        let (request, submission_id) = {
            let mut st = self.state.lock();
            if st.outcome.is_loading() {
                debug!(mode = %self.mode, "Submit ignored, request already in flight");
                return None;
            }
            let built = self.mode.build_request(&st.form, st.file.as_ref());
            match built {
                Err(e) => {
                    warn!(mode = %self.mode, "⚠️ Submit rejected locally: {}", e);
                    st.outcome = transition(&st.outcome, Event::Reject(e))?;
                    st.completed_at = Some(Utc::now());
                    return Some(st.outcome.clone());
                }
                Ok(request) => {
                    st.outcome = transition(&st.outcome, Event::Submit)?;
                    let id = Uuid::new_v4();
                    st.submission_id = Some(id);
                    st.completed_at = None;
                    (request, id)
                }
            }
        };

        info!(mode = %self.mode, %submission_id, "🚀 Submitting");
        let mode = self.mode;
        let transport = self.transport.clone();
        let state = self.state.clone();
        let task = tokio::spawn(async move {
            let result = transport.send(request).await;
            record(&state, mode, submission_id, result)
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(mode = %self.mode, %submission_id, "❌ Submission task failed: {}", e);
                let failed = Err(SubmitError::Transport(e.to_string()));
                record(&self.state, self.mode, submission_id, failed)
            }
        }
    }
}

fn record(
    state: &Mutex<ControllerState>,
    mode: Mode,
    submission_id: Uuid,
    result: Result<Payload, SubmitError>,
) -> Option<RequestOutcome> {
    match &result {
        Ok(payload) => {
            let urls: Vec<String> = payload.image_urls().into_iter().map(preview).collect();
            info!(%mode, %submission_id, ?urls, "✅ Submission succeeded");
        }
        Err(e) => warn!(%mode, %submission_id, kind = e.kind(), "❌ Submission failed: {}", e),
    }
    let mut st = state.lock();
    st.outcome = transition(&st.outcome, Event::Complete(result))?;
    st.completed_at = Some(Utc::now());
    Some(st.outcome.clone())
}
