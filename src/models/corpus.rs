//! The persisted corpus and its JSON Lines codec.

use crate::error::{AppError, Result};
use crate::models::Record;

/// The persisted, unordered collection of records.
///
/// Encoded as JSON Lines, one record object per line. Lines that no longer
/// decode as records are quarantined in `malformed`: they are excluded from
/// checkpointing and merging, but re-emitted verbatim on persist so a run
/// never drops rows it could not read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub records: Vec<Record>,
    pub malformed: Vec<String>,
}

impl Corpus {
    /// An empty corpus, used for first runs and confirmed resets.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of decoded records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Decode a corpus blob.
    ///
    /// Fails only when the blob is not valid UTF-8; individual undecodable
    /// lines are kept as malformed passthrough lines instead.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| AppError::validation(format!("corpus is not valid UTF-8: {e}")))?;

        let mut corpus = Self::empty();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Record>(line) {
                Ok(record) => corpus.records.push(record),
                Err(_) => corpus.malformed.push(line.to_string()),
            }
        }
        Ok(corpus)
    }

    /// Encode the corpus as JSON Lines, malformed lines last.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for record in &self.records {
            out.extend_from_slice(serde_json::to_string(record)?.as_bytes());
            out.push(b'\n');
        }
        for line in &self.malformed {
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;

    fn sample_record() -> Record {
        let timestamp = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        Record {
            author: "ada".to_string(),
            body: "hello".to_string(),
            timestamp,
            channel: "general".to_string(),
            thread: None,
            permalink: "https://discord.com/channels/1/2/3".to_string(),
            has_attachment: false,
            attachment_urls: vec![],
            total_reaction_count: 0,
            max_reaction_count: 0,
            has_spoiler: false,
            date: timestamp.date_naive(),
            hour: 15,
            year: 2025,
        }
    }

    #[test]
    fn test_round_trip() {
        let corpus = Corpus {
            records: vec![sample_record()],
            malformed: vec![],
        };

        let bytes = corpus.encode().unwrap();
        let decoded = Corpus::decode(&bytes).unwrap();
        assert_eq!(decoded, corpus);
    }

    #[test]
    fn test_decode_keeps_malformed_lines() {
        let mut bytes = Corpus {
            records: vec![sample_record()],
            malformed: vec![],
        }
        .encode()
        .unwrap();
        bytes.extend_from_slice(b"{\"author\": \"broken\"\n");

        let corpus = Corpus::decode(&bytes).unwrap();
        assert_eq!(corpus.records.len(), 1);
        assert_eq!(corpus.malformed.len(), 1);

        // Malformed lines survive a re-encode untouched.
        let again = Corpus::decode(&corpus.encode().unwrap()).unwrap();
        assert_eq!(again.malformed, corpus.malformed);
    }

    #[test]
    fn test_decode_empty_blob() {
        let corpus = Corpus::decode(b"").unwrap();
        assert!(corpus.is_empty());
        assert!(corpus.malformed.is_empty());
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(Corpus::decode(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let corpus = Corpus::decode(b"\n\n  \n").unwrap();
        assert!(corpus.is_empty());
        assert!(corpus.malformed.is_empty());
    }
}
