//! Session synchronizer
//!
//! The only entry points the page calls. Each handler takes the relevant
//! gate family, talks to the [`ChatService`], reconciles local state with
//! what the service returned, and reports failures through the
//! [`UiSurface`]. Gates and transient indicators are released by drop
//! guards, so no exit path leaves a control disabled.
//!
//! A failed send rolls back its optimistic entry and puts the text back in
//! the message input, so the transcript always matches the last snapshot
//! the service confirmed (plus at most one in-flight message). The text is
//! not put back if an upload prefilled the input while the send was out.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared_types::{Message, UploadedFile};

use crate::api::{ChatService, HttpChatService};
use crate::config::{ClientConfig, UploadMode};
use crate::error::{ClientError, Result, ValidationError};
use crate::gate::{GateGuard, OperationFamily, OperationGate, OperationState};
use crate::intake::{stage, FileCandidate};
use crate::transcript::{TranscriptEntry, TranscriptError, TranscriptStore};
use crate::ui::{Notice, UiSurface};

pub const RESET_PROMPT: &str =
    "Are you sure you want to reset the chat? This clears the whole conversation.";

/// How a handler finished when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Message trimmed to nothing
    EmptyMessage,
    /// The user answered "no" to a confirmation
    Declined,
}

/// Page-lifetime state, written only by the synchronizer
#[derive(Debug, Default)]
struct SessionState {
    transcript: TranscriptStore,
    files: Vec<UploadedFile>,
    /// Bumped each time an upload writes into the message input
    input_revision: u64,
}

/// Text that would be sent for `text`, trimmed
pub fn validate_message(text: &str) -> std::result::Result<&str, ValidationError> {
    let message = text.trim();
    if message.is_empty() {
        Err(ValidationError::EmptyMessage)
    } else {
        Ok(message)
    }
}

/// Hides a transient indicator when dropped
struct TypingIndicator<'a> {
    ui: &'a dyn UiSurface,
}

impl<'a> TypingIndicator<'a> {
    fn show(ui: &'a dyn UiSurface) -> Self {
        ui.set_typing(true);
        Self { ui }
    }
}

impl Drop for TypingIndicator<'_> {
    fn drop(&mut self) {
        self.ui.set_typing(false);
    }
}

pub struct SessionSynchronizer {
    service: Arc<dyn ChatService>,
    ui: Arc<dyn UiSurface>,
    gate: OperationGate,
    state: Mutex<SessionState>,
    upload_mode: UploadMode,
}

impl SessionSynchronizer {
    pub fn new(
        service: Arc<dyn ChatService>,
        ui: Arc<dyn UiSurface>,
        upload_mode: UploadMode,
    ) -> Self {
        Self {
            gate: OperationGate::new(Arc::clone(&ui)),
            service,
            ui,
            state: Mutex::new(SessionState::default()),
            upload_mode,
        }
    }

    /// Synchronizer over HTTP using `config`
    pub fn connect(config: &ClientConfig, ui: Arc<dyn UiSurface>) -> Result<Self> {
        let service = HttpChatService::new(config)?;
        tracing::info!(base_url = %service.base_url(), mode = ?config.upload_mode, "Chat session configured");
        Ok(Self::new(Arc::new(service), ui, config.upload_mode))
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.state().transcript.entries().to_vec()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().transcript.messages()
    }

    pub fn files(&self) -> Vec<UploadedFile> {
        self.state().files.clone()
    }

    pub fn operation_state(&self, family: OperationFamily) -> OperationState {
        self.gate.state(family)
    }

    pub fn upload_mode(&self) -> UploadMode {
        self.upload_mode
    }

    // ========================================================================
    // Handlers
    // ========================================================================

    /// Initial fetches made once when the page opens. Failures are shown, not retried.
    pub async fn start(&self) {
        if self.upload_mode == UploadMode::Library {
            let _ = futures::join!(self.load_history(), self.list_files());
        } else {
            let _ = self.load_history().await;
        }
    }

    pub async fn load_history(&self) -> Result<Outcome> {
        tracing::debug!("Loading chat history");
        match self.service.load_history().await {
            Ok(history) => {
                let count = history.len();
                self.reconcile(history);
                tracing::info!(messages = count, "Chat history loaded");
                Ok(Outcome::Completed)
            }
            Err(e) => Err(self.surface("load history", e)),
        }
    }

    pub async fn send_message(&self, text: &str) -> Result<Outcome> {
        let message = match validate_message(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring message");
                return Ok(Outcome::Skipped(SkipReason::EmptyMessage));
            }
        };

        let _gate = self.acquire(OperationFamily::Send)?;

        let (handle, revision) = {
            let mut state = self.state();
            let handle = state
                .transcript
                .insert_optimistic(Message::user(message))
                .map_err(|e| match e {
                    TranscriptError::TentativeInFlight => {
                        ClientError::AlreadyInFlight(OperationFamily::Send)
                    }
                })?;
            self.ui.render_transcript(&state.transcript.render());
            (handle, state.input_revision)
        };
        self.ui.set_input("");

        let typing = TypingIndicator::show(self.ui.as_ref());
        tracing::debug!(chars = message.len(), "Sending message");
        let result = self.service.send_message(message).await;
        drop(typing);

        match result {
            Ok(history) => {
                let count = history.len();
                self.reconcile(history);
                tracing::info!(messages = count, "Message confirmed");
                Ok(Outcome::Completed)
            }
            Err(e) => {
                {
                    let mut state = self.state();
                    state.transcript.rollback(handle);
                    self.ui.render_transcript(&state.transcript.render());
                    if state.input_revision == revision {
                        self.ui.set_input(text);
                    } else {
                        tracing::debug!("Input prefilled while sending; leaving it in place");
                    }
                }
                Err(self.surface("send message", e))
            }
        }
    }

    pub async fn upload_file(&self, candidate: Option<FileCandidate>) -> Result<Outcome> {
        let staged = match stage(candidate) {
            Ok(staged) => staged,
            Err(e) => return Err(self.surface("upload file", e.into())),
        };

        let gate = self.acquire(OperationFamily::Upload)?;
        let file_name = staged.file_name().to_string();
        tracing::debug!(%file_name, "Uploading file");

        let result = self.service.upload_file(staged).await;
        self.ui.clear_file_picker();

        let response = match result {
            Ok(response) => response,
            Err(e) => return Err(self.surface("upload file", e)),
        };

        match self.upload_mode {
            UploadMode::Prefill => {
                let Some(content) = response.content else {
                    return Err(self.surface(
                        "upload file",
                        ClientError::Protocol("upload response is missing `content`".to_string()),
                    ));
                };
                tracing::info!(%file_name, chars = content.len(), "Upload extracted into input");
                let mut state = self.state();
                state.input_revision += 1;
                self.ui.set_input(&content);
                drop(state);
            }
            UploadMode::Library => {
                tracing::info!(%file_name, "File uploaded");
                self.ui.notify(Notice::Info(format!("Uploaded {file_name}")));
                drop(gate);
                let _ = self.list_files().await;
            }
        }

        Ok(Outcome::Completed)
    }

    pub async fn reset_session(&self) -> Result<Outcome> {
        if !self.ui.confirm(RESET_PROMPT) {
            tracing::debug!("Reset declined");
            return Ok(Outcome::Skipped(SkipReason::Declined));
        }

        let _gate = self.acquire(OperationFamily::Reset)?;
        match self.service.reset().await {
            Ok(()) => {
                let mut state = self.state();
                state.transcript.clear();
                self.ui.render_transcript(&[]);
                tracing::info!("Chat session reset");
                Ok(Outcome::Completed)
            }
            Err(e) => Err(self.surface("reset session", e)),
        }
    }

    pub async fn list_files(&self) -> Result<Outcome> {
        match self.service.list_files().await {
            Ok(files) => {
                let mut state = self.state();
                self.ui.render_files(&files);
                tracing::info!(files = files.len(), "File list refreshed");
                state.files = files;
                Ok(Outcome::Completed)
            }
            Err(e) => Err(self.surface("list files", e)),
        }
    }

    pub async fn delete_file(&self, id: &str) -> Result<Outcome> {
        let label = self
            .state()
            .files
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.original_filename.clone())
            .unwrap_or_else(|| id.to_string());
        if !self.ui.confirm(&format!("Delete {label}?")) {
            tracing::debug!(%id, "Delete declined");
            return Ok(Outcome::Skipped(SkipReason::Declined));
        }

        let gate = self.acquire(OperationFamily::Delete)?;
        let result = self.service.delete_file(id).await;
        drop(gate);

        match result {
            Ok(()) => {
                tracing::info!(%id, "File deleted");
                let _ = self.list_files().await;
                Ok(Outcome::Completed)
            }
            Err(e) => Err(self.surface("delete file", e)),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self, family: OperationFamily) -> Result<GateGuard> {
        self.gate.acquire(family)
    }

    fn reconcile(&self, history: Vec<Message>) {
        let mut state = self.state();
        state.transcript.reconcile(history);
        self.ui.render_transcript(&state.transcript.render());
    }

    /// Report a failure to the user and hand it back to the caller
    fn surface(&self, operation: &'static str, error: ClientError) -> ClientError {
        match &error {
            ClientError::Validation(_) => {
                tracing::debug!(operation, error = %error, "Rejected locally");
            }
            _ => tracing::error!(operation, error = %error, "Operation failed"),
        }
        if error.is_user_visible() {
            self.ui.notify(Notice::Error(error.to_string()));
        }
        error
    }
}

impl std::fmt::Debug for SessionSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSynchronizer")
            .field("gate", &self.gate)
            .field("upload_mode", &self.upload_mode)
            .finish_non_exhaustive()
    }
}
