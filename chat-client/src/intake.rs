//! File intake
//!
//! The file picker and the drop target both hand their candidate to
//! [`stage`]; there is no other way to obtain a [`StagedFile`].

use reqwest::multipart::{Form, Part};
use shared_types::UPLOAD_FIELD;

use crate::error::ValidationError;

/// Where the candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeSource {
    Picker,
    Drop,
}

/// A file the user selected or dropped, not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub source: IntakeSource,
}

impl FileCandidate {
    pub fn picked(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            source: IntakeSource::Picker,
        }
    }

    pub fn dropped(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
            source: IntakeSource::Drop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
}

impl DocumentKind {
    fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "txt" => Some(DocumentKind::PlainText),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::PlainText => "text/plain",
            DocumentKind::Pdf => "application/pdf",
        }
    }
}

/// A validated file, ready to become the `file` field of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    file_name: String,
    kind: DocumentKind,
    bytes: Vec<u8>,
    source: IntakeSource,
}

impl StagedFile {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn source(&self) -> IntakeSource {
        self.source
    }

    /// Consume the staged file into a multipart body with a single `file` field
    pub fn into_form(self) -> reqwest::Result<Form> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.kind.mime_type())?;
        Ok(Form::new().part(UPLOAD_FIELD, part))
    }
}

/// Lowercased text after the last dot, if any
fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Validate a candidate from either entry path
pub fn stage(candidate: Option<FileCandidate>) -> Result<StagedFile, ValidationError> {
    let candidate = candidate.ok_or(ValidationError::NoFileSelected)?;
    if candidate.file_name.trim().is_empty() {
        return Err(ValidationError::NoFileSelected);
    }

    let extension = extension_of(&candidate.file_name);
    let kind = extension
        .as_deref()
        .and_then(DocumentKind::from_extension)
        .ok_or_else(|| ValidationError::UnsupportedType {
            file_name: candidate.file_name.clone(),
            extension: extension.clone(),
        })?;

    tracing::debug!(
        file_name = %candidate.file_name,
        source = ?candidate.source,
        size = candidate.bytes.len(),
        "Staged file for upload"
    );

    Ok(StagedFile {
        file_name: candidate.file_name,
        kind,
        bytes: candidate.bytes,
        source: candidate.source,
    })
}
