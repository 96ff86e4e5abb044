//! Run log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One audit row per invocation, appended to the run log store.
///
/// Entries are written for successful and failed runs alike; the only
/// invocation that leaves no entry is a declined reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunLogEntry {
    /// When the run started (UTC)
    pub run_time: DateTime<Utc>,

    /// Rows the merge actually added to the corpus
    pub rows_added: u64,

    /// Corpus row count after the run
    pub total_rows: u64,

    pub duration_minutes: f64,

    pub success: bool,

    /// Captured error, empty on success
    pub error_message: String,

    /// Retain cap requested for the run, if any
    pub limit: Option<u64>,

    /// Whether a destructive reset was requested
    pub reset: bool,
}

impl RunLogEntry {
    /// Entry for a run that persisted successfully.
    pub fn success(
        run_time: DateTime<Utc>,
        rows_added: u64,
        total_rows: u64,
        duration_minutes: f64,
        limit: Option<u64>,
        reset: bool,
    ) -> Self {
        Self {
            run_time,
            rows_added,
            total_rows,
            duration_minutes,
            success: true,
            error_message: String::new(),
            limit,
            reset,
        }
    }

    /// Entry for a run that failed after startup.
    pub fn failure(
        run_time: DateTime<Utc>,
        error_message: impl Into<String>,
        duration_minutes: f64,
        limit: Option<u64>,
        reset: bool,
    ) -> Self {
        Self {
            run_time,
            rows_added: 0,
            total_rows: 0,
            duration_minutes,
            success: false,
            error_message: error_message.into(),
            limit,
            reset,
        }
    }

    /// Encode as one JSON line ready for an append.
    pub fn encode_line(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }

    /// Decode a run log blob, skipping lines that no longer parse.
    pub fn decode_lines(bytes: &[u8]) -> Vec<RunLogEntry> {
        String::from_utf8_lossy(bytes)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_round_trip() {
        let entry = RunLogEntry::success(Utc::now(), 12, 240, 1.5, Some(500), false);
        let line = entry.encode_line().unwrap();
        assert!(line.ends_with(b"\n"));

        let decoded = RunLogEntry::decode_lines(&line);
        assert_eq!(decoded, vec![entry]);
    }

    #[test]
    fn test_failure_entry_has_message() {
        let entry = RunLogEntry::failure(Utc::now(), "persist failed", 0.2, None, true);
        assert!(!entry.success);
        assert!(!entry.error_message.is_empty());
        assert_eq!(entry.rows_added, 0);
        assert!(entry.reset);
    }

    #[test]
    fn test_decode_skips_garbage_lines() {
        let good = RunLogEntry::success(Utc::now(), 1, 1, 0.1, None, false);
        let mut bytes = good.encode_line().unwrap();
        bytes.extend_from_slice(b"not json\n");
        bytes.extend_from_slice(&good.encode_line().unwrap());

        assert_eq!(RunLogEntry::decode_lines(&bytes).len(), 2);
    }
}
