// src/models/mod.rs

//! Domain models for the archivist application.

mod config;
mod corpus;
mod record;
mod runlog;

// Re-export all public types
pub use config::{Config, IngestConfig, SourceConfig, StorageConfig};
pub use corpus::Corpus;
pub use record::{RawMessage, Record};
pub use runlog::RunLogEntry;
