//! Shared types between the chat page controller and the chat service
//!
//! These types describe the JSON bodies exchanged over HTTP:
//! - `GET /history`, `POST /chat`, `POST /reset`
//! - `POST /upload` (multipart field `file`)
//! - `GET /files`, `DELETE /files/{id}`
//!
//! Serializable with serde; exportable to TypeScript with ts-rs for the page markup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Conversation
// ============================================================================

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../chat-client/bindings/generated.ts")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Header shown above a message in the transcript view
    pub fn display_label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "AI",
        }
    }
}

/// One conversation entry. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../chat-client/bindings/generated.ts")]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Set by the service when the entry was persisted
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "iso8601::deserialize_option"
    )]
    #[ts(as = "Option<String>", optional)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: None,
        }
    }
}

/// `GET /history` and `POST /chat` success body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../chat-client/bindings/generated.ts")]
pub struct HistoryResponse {
    pub history: Vec<Message>,
    /// Assistant reply alone; `POST /chat` only. The history is authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub response: Option<String>,
}

/// `POST /chat` request body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../chat-client/bindings/generated.ts")]
pub struct ChatRequest {
    pub message: String,
}

// ============================================================================
// Uploads
// ============================================================================

/// `POST /upload` success body.
///
/// Prefill-mode services answer `{content}`; library-mode services answer `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../chat-client/bindings/generated.ts")]
pub struct UploadResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub content: Option<String>,
}

/// Metadata of a document held by the service. Read-only to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../../chat-client/bindings/generated.ts")]
pub struct UploadedFile {
    /// Services key files by integer or string; both are read as text
    #[serde(deserialize_with = "file_id::deserialize")]
    #[ts(type = "string")]
    pub id: String,
    pub original_filename: String,
    #[serde(deserialize_with = "iso8601::deserialize")]
    #[ts(type = "string")]
    pub uploaded_at: DateTime<Utc>,
}

/// `GET /files` success body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../chat-client/bindings/generated.ts")]
pub struct FilesResponse {
    pub files: Vec<UploadedFile>,
}

// ============================================================================
// Errors
// ============================================================================

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../chat-client/bindings/generated.ts")]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Multipart field carrying the uploaded document
pub const UPLOAD_FIELD: &str = "file";

// ============================================================================
// Identifiers
// ============================================================================

mod file_id {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => id,
            RawId::Signed(id) => id.to_string(),
            RawId::Unsigned(id) => id.to_string(),
        })
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// ISO-8601 parsing that also accepts offset-less timestamps (read as UTC)
mod iso8601 {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid ISO-8601 timestamp: {raw}"))
        })
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse(&raw).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid ISO-8601 timestamp: {raw}"))
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ts_rs::Config;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = serde_json::from_str::<Message>(r#"{"role":"system","content":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_history_accepts_service_timestamps() {
        let body = r#"{
            "response": "Hi!",
            "history": [
                {"role": "user", "content": "Hello", "timestamp": "2024-03-01T10:00:00"},
                {"role": "assistant", "content": "Hi!"}
            ]
        }"#;
        let parsed: HistoryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.history.len(), 2);
        assert_eq!(
            parsed.history[0].timestamp.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-03-01T10:00:00+00:00")
        );
        assert_eq!(parsed.history[1], Message::assistant("Hi!"));
        assert_eq!(parsed.response.as_deref(), Some("Hi!"));
    }

    #[test]
    fn test_message_without_timestamp_omits_field() {
        let json = serde_json::to_string(&Message::user("hey")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hey"}"#);
    }

    #[test]
    fn test_files_response_parses_iso_dates() {
        let body = r#"{"files":[{"id":"7","original_filename":"notes.pdf","uploaded_at":"2024-05-02T08:30:00Z"}]}"#;
        let parsed: FilesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.files[0].original_filename, "notes.pdf");
        assert_eq!(parsed.files[0].uploaded_at.to_rfc3339(), "2024-05-02T08:30:00+00:00");
    }

    #[test]
    fn test_integer_file_ids_read_as_text() {
        let body = r#"{"files":[{"id":7,"original_filename":"notes.pdf","uploaded_at":"2024-05-02T08:30:00"}]}"#;
        let parsed: FilesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.files[0].id, "7");
        assert_eq!(parsed.files[0].uploaded_at.to_rfc3339(), "2024-05-02T08:30:00+00:00");

        let json = serde_json::to_value(&parsed.files[0]).unwrap();
        assert_eq!(json["id"], "7");
    }

    #[test]
    fn test_fractional_file_id_rejected() {
        let body = r#"{"id":1.5,"original_filename":"a.txt","uploaded_at":"2024-05-02T08:30:00"}"#;
        assert!(serde_json::from_str::<UploadedFile>(body).is_err());
    }

    #[test]
    fn test_garbage_timestamp_rejected() {
        let body = r#"{"id":"1","original_filename":"a.txt","uploaded_at":"yesterday"}"#;
        assert!(serde_json::from_str::<UploadedFile>(body).is_err());
    }

    #[test]
    fn test_empty_upload_response() {
        let parsed: UploadResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, UploadResponse::default());
    }

    #[test]
    fn export_types() {
        let config = Config::default();
        Role::export(&config).unwrap();
        Message::export(&config).unwrap();
        HistoryResponse::export(&config).unwrap();
        ChatRequest::export(&config).unwrap();
        UploadResponse::export(&config).unwrap();
        UploadedFile::export(&config).unwrap();
        FilesResponse::export(&config).unwrap();
        ErrorBody::export(&config).unwrap();
    }
}
