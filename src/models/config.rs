//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Upstream source and HTTP behavior settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Persisted file names, relative to the storage directory
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.source.api_base)
            .map_err(|e| AppError::validation(format!("source.api_base is not a valid URL: {e}")))?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.source.max_concurrent == 0 {
            return Err(AppError::validation("source.max_concurrent must be > 0"));
        }
        if self.source.page_size == 0 || self.source.page_size > 100 {
            return Err(AppError::validation("source.page_size must be in 1..=100"));
        }
        if self.source.token_env.trim().is_empty() {
            return Err(AppError::validation("source.token_env is empty"));
        }
        if self.ingest.allowlist_file.trim().is_empty() {
            return Err(AppError::validation("ingest.allowlist_file is empty"));
        }
        if self.storage.corpus_file.trim().is_empty() {
            return Err(AppError::validation("storage.corpus_file is empty"));
        }
        if self.storage.run_log_file.trim().is_empty() {
            return Err(AppError::validation("storage.run_log_file is empty"));
        }
        if self.storage.corpus_file == self.storage.run_log_file {
            return Err(AppError::validation(
                "storage.corpus_file and storage.run_log_file must differ",
            ));
        }
        Ok(())
    }
}

/// Upstream source and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// REST API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between history pages in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrently fetched containers
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// History page size (the upstream caps this at 100)
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Environment variable holding the bot token
    #[serde(default = "defaults::token_env")]
    pub token_env: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            page_size: defaults::page_size(),
            token_env: defaults::token_env(),
        }
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Allow-list file name, one author per line
    #[serde(default = "defaults::allowlist_file")]
    pub allowlist_file: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            allowlist_file: defaults::allowlist_file(),
        }
    }
}

/// Persisted file names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Corpus file (JSON Lines)
    #[serde(default = "defaults::corpus_file")]
    pub corpus_file: String,

    /// Run log file (JSON Lines, append-only)
    #[serde(default = "defaults::run_log_file")]
    pub run_log_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            corpus_file: defaults::corpus_file(),
            run_log_file: defaults::run_log_file(),
        }
    }
}

mod defaults {
    pub fn api_base() -> String {
        "https://discord.com/api/v10".to_string()
    }

    pub fn user_agent() -> String {
        "archivist/0.1".to_string()
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn request_delay() -> u64 {
        200
    }

    pub fn max_concurrent() -> usize {
        4
    }

    pub fn page_size() -> usize {
        100
    }

    pub fn token_env() -> String {
        "DISCORD_TOKEN".to_string()
    }

    pub fn allowlist_file() -> String {
        "allowlist.txt".to_string()
    }

    pub fn corpus_file() -> String {
        "corpus.jsonl".to_string()
    }

    pub fn run_log_file() -> String {
        "runs.jsonl".to_string()
    }
}
