//! Record data structures.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One archived message, the row type of the corpus.
///
/// Every field participates in equality and hashing: the merge engine
/// dedups on the full row, not on a synthetic id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Record {
    /// Author name
    pub author: String,

    /// Message text
    pub body: String,

    /// UTC creation instant; the source guarantees no ordering
    pub timestamp: DateTime<Utc>,

    /// Channel name
    pub channel: String,

    /// Thread name; `None` when the message was posted directly in the channel
    pub thread: Option<String>,

    /// Permanent link built from guild/container/message identifiers
    pub permalink: String,

    pub has_attachment: bool,

    /// Attachment URLs in upstream order
    pub attachment_urls: Vec<String>,

    pub total_reaction_count: u64,

    /// Largest single reaction count, 0 when there are no reactions
    pub max_reaction_count: u64,

    pub has_spoiler: bool,

    /// Calendar fields derived from `timestamp` (UTC)
    pub date: NaiveDate,
    pub hour: u32,
    pub year: i32,
}

/// A message retained by the fetcher, before normalization.
///
/// Carries the container identifiers and the reaction/attachment data that
/// only exist on the upstream message object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub guild_id: String,

    /// Channel or thread id, whichever the message was fetched from
    pub container_id: String,

    pub message_id: String,
    pub author: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub channel: String,
    pub thread: Option<String>,
    pub attachment_urls: Vec<String>,
    pub total_reaction_count: u64,
    pub max_reaction_count: u64,
}
