//! Presentation boundary
//!
//! The session drives the page only through [`UiSurface`]. A DOM binding,
//! a native toolkit, or [`HeadlessUi`] can sit behind it.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use shared_types::UploadedFile;

use crate::transcript::RenderedMessage;

/// Interactive controls whose enabled state the operation gate owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Control {
    MessageInput,
    SendButton,
    FilePicker,
    UploadButton,
    ResetButton,
    DeleteButtons,
}

/// User-visible notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Info(String),
}

/// Everything the session may do to the page.
///
/// Implementations must not call back into the session or gate from these
/// methods; the gate invokes them while holding its lock.
pub trait UiSurface: Send + Sync {
    fn render_transcript(&self, messages: &[RenderedMessage]);

    fn render_files(&self, files: &[UploadedFile]);

    fn set_input(&self, text: &str);

    fn set_control_enabled(&self, control: Control, enabled: bool);

    /// Blocking indicator shown while any operation is in flight
    fn set_loading(&self, visible: bool);

    /// Transient "assistant is typing" indicator
    fn set_typing(&self, visible: bool);

    fn clear_file_picker(&self);

    fn notify(&self, notice: Notice);

    /// Yes/no decision point; `true` means proceed
    fn confirm(&self, prompt: &str) -> bool;
}

// ============================================================================
// Headless surface
// ============================================================================

/// Recorded page state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessState {
    pub transcript: Vec<RenderedMessage>,
    pub files: Vec<UploadedFile>,
    pub input: String,
    pub disabled: BTreeSet<Control>,
    pub loading: bool,
    pub typing: bool,
    /// Every typing indicator transition, in order
    pub typing_log: Vec<bool>,
    pub picker_clears: usize,
    pub notices: Vec<Notice>,
    pub prompts: Vec<String>,
}

impl HeadlessState {
    pub fn is_enabled(&self, control: Control) -> bool {
        !self.disabled.contains(&control)
    }

    pub fn errors(&self) -> Vec<&str> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Error(text) => Some(text.as_str()),
                Notice::Info(_) => None,
            })
            .collect()
    }
}

/// In-memory [`UiSurface`] with scripted confirmation answers
#[derive(Debug, Default)]
pub struct HeadlessUi {
    state: Mutex<HeadlessState>,
    confirmations: Mutex<VecDeque<bool>>,
}

impl HeadlessUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue answers for upcoming confirmation prompts.
    ///
    /// Prompts with no queued answer are declined.
    pub fn answer_confirmations(&self, answers: impl IntoIterator<Item = bool>) {
        lock(&self.confirmations).extend(answers);
    }

    /// Simulate the user typing into the message input
    pub fn type_input(&self, text: &str) {
        lock(&self.state).input = text.to_string();
    }

    pub fn snapshot(&self) -> HeadlessState {
        lock(&self.state).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl UiSurface for HeadlessUi {
    fn render_transcript(&self, messages: &[RenderedMessage]) {
        lock(&self.state).transcript = messages.to_vec();
    }

    fn render_files(&self, files: &[UploadedFile]) {
        lock(&self.state).files = files.to_vec();
    }

    fn set_input(&self, text: &str) {
        lock(&self.state).input = text.to_string();
    }

    fn set_control_enabled(&self, control: Control, enabled: bool) {
        let mut state = lock(&self.state);
        if enabled {
            state.disabled.remove(&control);
        } else {
            state.disabled.insert(control);
        }
    }

    fn set_loading(&self, visible: bool) {
        lock(&self.state).loading = visible;
    }

    fn set_typing(&self, visible: bool) {
        let mut state = lock(&self.state);
        state.typing = visible;
        state.typing_log.push(visible);
    }

    fn clear_file_picker(&self) {
        lock(&self.state).picker_clears += 1;
    }

    fn notify(&self, notice: Notice) {
        lock(&self.state).notices.push(notice);
    }

    fn confirm(&self, prompt: &str) -> bool {
        lock(&self.state).prompts.push(prompt.to_string());
        lock(&self.confirmations).pop_front().unwrap_or(false)
    }
}

// ============================================================================
// Markup
// ============================================================================

/// Fixed markup around already-escaped fragments
pub mod html {
    use crate::format::{escape_html, Fragment, LineKind};
    use crate::transcript::RenderedMessage;
    use shared_types::{Role, UploadedFile};

    pub fn line_class(kind: LineKind) -> &'static str {
        match kind {
            LineKind::BulletPoint => "bullet-point",
            LineKind::NumberedItem => "numbered-item",
            LineKind::ParagraphBreak => "paragraph-break",
            LineKind::TextLine => "text-line",
        }
    }

    pub fn role_class(role: Role) -> &'static str {
        match role {
            Role::User => "user-message",
            Role::Assistant => "ai-message",
        }
    }

    pub fn fragment(fragment: &Fragment) -> String {
        let class = line_class(fragment.kind);
        match fragment.kind {
            LineKind::ParagraphBreak => format!("<div class=\"{class}\"></div>"),
            _ => format!("<div class=\"{class}\">{}</div>", fragment.text),
        }
    }

    pub fn message(message: &RenderedMessage) -> String {
        let body: String = message.fragments.iter().map(fragment).collect();
        let pending = if message.pending { " pending" } else { "" };
        format!(
            "<div class=\"message {}{pending}\"><div class=\"message-header\">{}</div><div class=\"message-content\">{body}</div></div>",
            role_class(message.role),
            message.role.display_label(),
        )
    }

    pub fn transcript(messages: &[RenderedMessage]) -> String {
        messages.iter().map(message).collect()
    }

    pub fn file_item(file: &UploadedFile) -> String {
        format!(
            "<li class=\"uploaded-file\" data-file-id=\"{}\"><span class=\"file-name\">{}</span><time>{}</time><button class=\"delete-file\">Delete</button></li>",
            escape_html(&file.id).replace('"', "&quot;"),
            escape_html(&file.original_filename),
            file.uploaded_at.format("%Y-%m-%d %H:%M"),
        )
    }
}
