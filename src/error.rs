// src/error.rs

//! Unified error handling for the archivist application.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for archivist operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Upstream rejected or never received a credential
    #[error("Auth error: {0}")]
    Auth(String),

    /// The allow-list could not be read; there is no safe default
    #[error("Allow-list unavailable at {path}: {message}")]
    AllowList { path: PathBuf, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Fetch error scoped to one container
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// Corpus could not be persisted; the previous corpus is untouched
    #[error("Persist error: {0}")]
    Persist(String),
}

impl AppError {
    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create an allow-list error.
    pub fn allow_list(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::AllowList {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a fetch error with container context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a persist error.
    pub fn persist(message: impl fmt::Display) -> Self {
        Self::Persist(message.to_string())
    }

    /// Whether this error must abort the process before any fetch.
    ///
    /// Everything else is caught at the orchestrator boundary and lands
    /// in the run log instead of the exit status.
    pub fn is_fatal_startup(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::AllowList { .. })
    }
}
