//! Upload/analyze session controller.
//!
//! A [`Session`] owns one [`SessionState`] and drives the two server calls.
//! Upload and analyze are independent: each has its own busy flag, either
//! may run while the other is in flight, and neither checks what the other
//! did. The status message is shared and the last writer wins.
//!
//! Busy flags are held by a [`BusyGuard`] for the duration of the call, so
//! they are released on every exit path, including a panicking backend and
//! a future that is dropped before it completes.

pub mod messages;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::{AnalysisResult, Backend, Reply};
use crate::files::SelectedFile;
use crate::view::View;

/// Everything the page shows, in one owned value.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Replaced wholesale by each selection; never cleared after an upload.
    pub selection: Option<Arc<Vec<SelectedFile>>>,
    /// Feedback from the most recent action.
    pub status: String,
    /// Replaced wholesale by each successful analysis.
    pub result: Option<AnalysisResult>,
    pub uploading: bool,
    pub analyzing: bool,
}

impl SessionState {
    /// Number of files currently selected.
    pub fn selected_count(&self) -> usize {
        self.selection.as_ref().map(|s| s.len()).unwrap_or(0)
    }
}

/// What an upload call ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Nothing selected; no request was sent.
    NoFiles,
    Uploaded,
    /// Non-2xx reply carrying this error text.
    Rejected(String),
    /// Transport or parse failure.
    Failed,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded)
    }
}

/// What an analyze call ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    Completed,
    /// Non-2xx reply carrying this error text.
    Rejected(String),
    /// Transport or parse failure.
    Failed,
}

impl AnalyzeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalyzeOutcome::Completed)
    }
}

#[derive(Debug, Clone, Copy)]
enum Busy {
    Uploading,
    Analyzing,
}

/// Holds one busy flag raised until dropped.
struct BusyGuard<'a> {
    state: &'a Mutex<SessionState>,
    flag: Busy,
}

impl<'a> BusyGuard<'a> {
    fn acquire(state: &'a Mutex<SessionState>, flag: Busy) -> Self {
        set_flag(&mut lock(state), flag, true);
        Self { state, flag }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        set_flag(&mut lock(self.state), self.flag, false);
    }
}

fn set_flag(state: &mut SessionState, flag: Busy, value: bool) {
    match flag {
        Busy::Uploading => state.uploading = value,
        Busy::Analyzing => state.analyzing = value,
    }
}

// A panic while the lock is held cannot leave the state half-written: every
// critical section is a plain field assignment.
fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The session controller.
pub struct Session<B: Backend> {
    backend: B,
    state: Mutex<SessionState>,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    /// Render the current state.
    pub fn view(&self, base_url: &str) -> View {
        View::build(&lock(&self.state), base_url)
    }

    /// Replace the selection. Status and result are left alone.
    pub fn select_files(&self, files: Vec<SelectedFile>) {
        let mut state = lock(&self.state);
        state.selection = Some(Arc::new(files));
    }

    fn set_status(&self, status: impl Into<String>) {
        lock(&self.state).status = status.into();
    }

    /// Send the current selection to the upload endpoint.
    pub async fn upload(&self) -> UploadOutcome {
        let files = {
            let mut state = lock(&self.state);
            match state.selection.clone().filter(|s| !s.is_empty()) {
                Some(files) => files,
                None => {
                    state.status = messages::NO_FILES_SELECTED.to_string();
                    return UploadOutcome::NoFiles;
                }
            }
        };

        let _busy = BusyGuard::acquire(&self.state, Busy::Uploading);
        self.set_status(messages::UPLOADING);

        match self.backend.upload(&files).await {
            Ok(reply) if reply.is_success() => {
                tracing::info!(files = files.len(), status = reply.status, "upload accepted");
                self.set_status(messages::UPLOAD_SUCCEEDED);
                UploadOutcome::Uploaded
            }
            Ok(reply) => {
                let text = reply.error_text();
                tracing::warn!(status = reply.status, error = %text, "upload rejected");
                self.set_status(format!("{}{}", messages::UPLOAD_ERROR_PREFIX, text));
                UploadOutcome::Rejected(text)
            }
            Err(e) => {
                tracing::error!(error = %e, "upload failed");
                self.set_status(messages::UPLOAD_FAILED);
                UploadOutcome::Failed
            }
        }
    }

    /// Ask the server to analyze, replacing the result on success.
    pub async fn analyze(&self) -> AnalyzeOutcome {
        let _busy = BusyGuard::acquire(&self.state, Busy::Analyzing);

        let reply = match self.backend.analyze().await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "analysis failed");
                self.set_status(messages::ANALYZE_FAILED);
                return AnalyzeOutcome::Failed;
            }
        };

        if !reply.is_success() {
            let text = reply.error_text();
            tracing::warn!(status = reply.status, error = %text, "analysis rejected");
            self.set_status(format!("{}{}", messages::ANALYZE_ERROR_PREFIX, text));
            return AnalyzeOutcome::Rejected(text);
        }

        self.apply_analysis(reply)
    }

    fn apply_analysis(&self, reply: Reply) -> AnalyzeOutcome {
        match AnalysisResult::from_body(reply.body) {
            Ok(result) => {
                tracing::info!(
                    responses = result.responses.as_ref().map(|r| r.len()).unwrap_or(0),
                    excel_files = result.excel_files.as_ref().map(|e| e.len()).unwrap_or(0),
                    "analysis completed"
                );
                lock(&self.state).result = Some(result);
                AnalyzeOutcome::Completed
            }
            Err(e) => {
                tracing::error!(error = %e, "analysis reply did not match the expected shape");
                self.set_status(messages::ANALYZE_FAILED);
                AnalyzeOutcome::Failed
            }
        }
    }
}
