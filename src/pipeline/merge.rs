//! Dedup merge engine.
//!
//! Merging concatenates existing and incoming rows and drops exact
//! duplicates, so re-fetching an overlapping window never grows the
//! corpus. The dedup key is the full row: two genuinely distinct
//! messages with identical fields collapse into one record.

use std::collections::HashSet;

use crate::models::{Corpus, Record};

/// Result of a merge.
#[derive(Debug)]
pub struct MergeOutcome {
    pub corpus: Corpus,

    /// Incoming rows that were not already present
    pub rows_added: usize,
}

/// Merge incoming records into the corpus, keeping each distinct row once.
///
/// First occurrence wins; malformed passthrough lines are carried along
/// untouched. Surviving row order is not a meaningful property.
pub fn merge(existing: Corpus, incoming: Vec<Record>) -> MergeOutcome {
    let Corpus { records, malformed } = existing;

    let mut seen: HashSet<Record> = HashSet::with_capacity(records.len() + incoming.len());
    let mut merged: Vec<Record> = Vec::with_capacity(records.len() + incoming.len());

    for record in records {
        if seen.insert(record.clone()) {
            merged.push(record);
        }
    }
    let existing_distinct = merged.len();

    for record in incoming {
        if seen.insert(record.clone()) {
            merged.push(record);
        }
    }
    let rows_added = merged.len() - existing_distinct;

    MergeOutcome {
        corpus: Corpus {
            records: merged,
            malformed,
        },
        rows_added,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike, Utc};

    fn record(author: &str, body: &str) -> Record {
        let ts = Utc.with_ymd_and_hms(2024, 7, 1, 8, 30, 0).unwrap();
        Record {
            author: author.to_string(),
            body: body.to_string(),
            timestamp: ts,
            channel: "general".to_string(),
            thread: None,
            permalink: "https://discord.com/channels/1/2/3".to_string(),
            has_attachment: false,
            attachment_urls: vec![],
            total_reaction_count: 0,
            max_reaction_count: 0,
            has_spoiler: false,
            date: ts.date_naive(),
            hour: ts.hour(),
            year: ts.year(),
        }
    }

    #[test]
    fn test_merge_with_empty_incoming_is_identity() {
        let corpus = Corpus {
            records: vec![record("ada", "one"), record("grace", "two")],
            malformed: vec![],
        };

        let outcome = merge(corpus.clone(), vec![]);
        assert_eq!(outcome.corpus, corpus);
        assert_eq!(outcome.rows_added, 0);
    }

    #[test]
    fn test_merge_into_empty_dedups_incoming() {
        let incoming = vec![record("ada", "one"), record("ada", "one"), record("ada", "two")];

        let outcome = merge(Corpus::empty(), incoming);
        assert_eq!(outcome.corpus.len(), 2);
        assert_eq!(outcome.rows_added, 2);
    }

    #[test]
    fn test_self_merge_is_idempotent() {
        let corpus = Corpus {
            records: vec![record("ada", "one"), record("grace", "two")],
            malformed: vec![],
        };

        let outcome = merge(corpus.clone(), corpus.records.clone());
        assert_eq!(outcome.corpus, corpus);
        assert_eq!(outcome.rows_added, 0);
    }

    #[test]
    fn test_only_new_rows_are_counted() {
        let corpus = Corpus {
            records: vec![record("ada", "one")],
            malformed: vec![],
        };
        let incoming = vec![record("ada", "one"), record("grace", "two")];

        let outcome = merge(corpus, incoming);
        assert_eq!(outcome.corpus.len(), 2);
        assert_eq!(outcome.rows_added, 1);
    }

    #[test]
    fn test_any_field_difference_is_a_distinct_row() {
        let base = record("ada", "one");
        let mut reacted = base.clone();
        reacted.total_reaction_count = 5;

        let outcome = merge(Corpus::empty(), vec![base, reacted]);
        assert_eq!(outcome.corpus.len(), 2);
    }

    #[test]
    fn test_malformed_lines_pass_through() {
        let corpus = Corpus {
            records: vec![record("ada", "one")],
            malformed: vec!["not json".to_string()],
        };

        let outcome = merge(corpus, vec![record("grace", "two")]);
        assert_eq!(outcome.corpus.malformed, vec!["not json".to_string()]);
        assert_eq!(outcome.corpus.len(), 2);
    }
}
