//! Durable store gateway.
//!
//! The pipeline reads and writes opaque blobs through [`StoreGateway`];
//! the corpus write is atomic so a concurrent reader (the dashboard that
//! consumes the corpus) never observes a partial file.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStore;

/// Trait for corpus and run-log persistence backends.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Read the corpus blob, `None` when none has been written yet.
    async fn read_corpus(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the corpus atomically.
    ///
    /// On failure the previously committed corpus must remain intact.
    async fn write_corpus(&self, bytes: &[u8]) -> Result<()>;

    /// Read the run log blob, `None` when none has been written yet.
    async fn read_log(&self) -> Result<Option<Vec<u8>>>;

    /// Append bytes to the run log without touching prior entries.
    async fn append_log(&self, bytes: &[u8]) -> Result<()>;
}
