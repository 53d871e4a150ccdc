//! Error taxonomy crossing the session boundary

use crate::gate::OperationFamily;

/// Rejected locally; never reaches the network
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Please select a file first.")]
    NoFileSelected,

    #[error("Please upload only TXT or PDF files (got {file_name}).")]
    UnsupportedType {
        file_name: String,
        extension: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request could not be completed
    #[error("Request failed: {0}")]
    Network(String),

    /// Non-2xx answer; `message` is what the service reported
    #[error("{message}")]
    Service { status: u16, message: String },

    /// Body was not the JSON shape the endpoint promises
    #[error("Failed to parse response: {0}")]
    Protocol(String),

    #[error("{0} operation already in flight")]
    AlreadyInFlight(OperationFamily),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Whether the failure should be shown to the user.
    ///
    /// Re-entrant clicks on a busy control are dropped silently.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, ClientError::AlreadyInFlight(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Protocol(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
