//! Local filesystem storage backend.
//!
//! Keeps the corpus and the run log as flat files under one storage
//! directory. Corpus writes go to a temporary sibling first and are
//! renamed into place, so readers see either the old or the new corpus,
//! never a partial one.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::StorageConfig;
use crate::storage::StoreGateway;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
    corpus_file: String,
    run_log_file: String,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, config: &StorageConfig) -> Self {
        Self {
            root_dir: root_dir.into(),
            corpus_file: config.corpus_file.clone(),
            run_log_file: config.run_log_file.clone(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl StoreGateway for LocalStore {
    async fn read_corpus(&self) -> Result<Option<Vec<u8>>> {
        self.read_bytes(&self.corpus_file).await
    }

    async fn write_corpus(&self, bytes: &[u8]) -> Result<()> {
        self.write_bytes(&self.corpus_file, bytes).await
    }

    async fn read_log(&self) -> Result<Option<Vec<u8>>> {
        self.read_bytes(&self.run_log_file).await
    }

    async fn append_log(&self, bytes: &[u8]) -> Result<()> {
        let path = self.path(&self.run_log_file);
        self.ensure_dir(&path).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StorageConfig;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> LocalStore {
        LocalStore::new(tmp.path(), &StorageConfig::default())
    }

    #[tokio::test]
    async fn test_corpus_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        store.write_corpus(b"hello").await.unwrap();
        let data = store.read_corpus().await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_read_missing_corpus() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        assert!(store.read_corpus().await.unwrap().is_none());
        assert!(store.read_log().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corpus_replace_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        store.write_corpus(b"one").await.unwrap();
        store.write_corpus(b"two").await.unwrap();

        assert_eq!(store.read_corpus().await.unwrap(), Some(b"two".to_vec()));
        assert!(!tmp.path().join("corpus.tmp").exists());
    }

    #[tokio::test]
    async fn test_log_appends_preserve_prior_entries() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        store.append_log(b"first\n").await.unwrap();
        store.append_log(b"second\n").await.unwrap();

        let log = store.read_log().await.unwrap().unwrap();
        assert_eq!(log, b"first\nsecond\n");
    }
}
