//! Client configuration
//!
//! Read from the process environment after loading the nearest `.env`.
//!
//! - `CHAT_API_BASE`: service origin, default `http://localhost:5000`
//! - `CHAT_UPLOAD_MODE`: `prefill` (default) or `library`

use std::str::FromStr;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const API_BASE_VAR: &str = "CHAT_API_BASE";
pub const UPLOAD_MODE_VAR: &str = "CHAT_UPLOAD_MODE";

/// What a successful upload does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    /// Extracted text is placed in the message input
    #[default]
    Prefill,
    /// The service keeps the document; the file list is refreshed
    Library,
}

impl FromStr for UploadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prefill" => Ok(UploadMode::Prefill),
            "library" => Ok(UploadMode::Library),
            other => Err(format!("unknown upload mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub upload_mode: UploadMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            upload_mode: UploadMode::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, upload_mode: UploadMode) -> Self {
        Self {
            base_url: normalize_base(base_url.into()),
            upload_mode,
        }
    }

    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Self {
        load_env_file();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base) = lookup(API_BASE_VAR).filter(|v| !v.trim().is_empty()) {
            config.base_url = normalize_base(base);
        }

        if let Some(raw) = lookup(UPLOAD_MODE_VAR).filter(|v| !v.trim().is_empty()) {
            match raw.parse() {
                Ok(mode) => config.upload_mode = mode,
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "Ignoring {UPLOAD_MODE_VAR}");
                }
            }
        }

        config
    }
}

fn normalize_base(base: String) -> String {
    base.trim().trim_end_matches('/').to_string()
}

/// Load the first `.env` found in the current directory or its ancestors
fn load_env_file() {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "Could not determine current directory for .env lookup");
            return;
        }
    };

    for dir in cwd.ancestors() {
        let candidate = dir.join(".env");
        if !candidate.exists() {
            continue;
        }
        match dotenvy::from_path(&candidate) {
            Ok(_) => tracing::info!(path = %candidate.display(), "Loaded environment from .env"),
            Err(e) => tracing::warn!(
                path = %candidate.display(),
                error = %e,
                "Failed to load .env file"
            ),
        }
        return;
    }

    tracing::debug!(cwd = %cwd.display(), "No .env file found; using process environment only");
}
