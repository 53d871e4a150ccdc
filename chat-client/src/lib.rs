//! Document Chat client
//!
//! Client-side controller for the single-page chat: keeps the visible
//! transcript in step with the service's history, guards overlapping
//! operations, stages uploads, and turns untrusted message text into
//! escaped display fragments. Toolkit-independent; the page talks to it
//! through [`session::SessionSynchronizer`] and implements [`ui::UiSurface`].

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod gate;
pub mod intake;
pub mod session;
pub mod transcript;
pub mod ui;

pub use api::{ChatService, HttpChatService};
pub use config::{ClientConfig, UploadMode};
pub use error::{ClientError, ValidationError};
pub use format::{format_message, Fragment, LineKind};
pub use gate::{OperationFamily, OperationGate, OperationState};
pub use intake::{stage, FileCandidate, IntakeSource, StagedFile};
pub use session::{validate_message, Outcome, SessionSynchronizer, SkipReason};
pub use transcript::{Provenance, RenderedMessage, TranscriptStore};
pub use ui::{Control, HeadlessUi, Notice, UiSurface};
