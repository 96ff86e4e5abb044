//! Record normalization.
//!
//! Pure transform from a fetched message to the canonical corpus row.
//! No I/O, deterministic: calling it twice on the same input yields
//! field-for-field identical records.

use chrono::{Datelike, Timelike};

use crate::models::{RawMessage, Record};

/// Marker the platform puts in attachment URLs of flagged uploads.
const SPOILER_MARKER: &str = "spoiler_";

/// Build the canonical record for a retained message.
pub fn normalize(raw: &RawMessage) -> Record {
    let has_spoiler = raw
        .attachment_urls
        .iter()
        .any(|url| url.to_ascii_lowercase().contains(SPOILER_MARKER));

    Record {
        author: raw.author.clone(),
        body: raw.body.clone(),
        timestamp: raw.timestamp,
        channel: raw.channel.clone(),
        thread: raw.thread.clone(),
        permalink: permalink(raw),
        has_attachment: !raw.attachment_urls.is_empty(),
        attachment_urls: raw.attachment_urls.clone(),
        total_reaction_count: raw.total_reaction_count,
        max_reaction_count: raw.max_reaction_count,
        has_spoiler,
        date: raw.timestamp.date_naive(),
        hour: raw.timestamp.hour(),
        year: raw.timestamp.year(),
    }
}

fn permalink(raw: &RawMessage) -> String {
    format!(
        "https://discord.com/channels/{}/{}/{}",
        raw.guild_id, raw.container_id, raw.message_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_raw() -> RawMessage {
        RawMessage {
            guild_id: "10".to_string(),
            container_id: "20".to_string(),
            message_id: "30".to_string(),
            author: "ada".to_string(),
            body: "look at this".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 12, 31, 23, 5, 0).unwrap(),
            channel: "general".to_string(),
            thread: Some("side quest".to_string()),
            attachment_urls: vec!["https://cdn.example/a/photo.png".to_string()],
            total_reaction_count: 4,
            max_reaction_count: 3,
        }
    }

    #[test]
    fn test_derived_fields() {
        let record = normalize(&sample_raw());

        assert_eq!(record.permalink, "https://discord.com/channels/10/20/30");
        assert!(record.has_attachment);
        assert!(!record.has_spoiler);
        assert_eq!(record.date.to_string(), "2024-12-31");
        assert_eq!(record.hour, 23);
        assert_eq!(record.year, 2024);
        assert_eq!(record.thread.as_deref(), Some("side quest"));
    }

    #[test]
    fn test_spoiler_marker_is_case_insensitive() {
        let mut raw = sample_raw();
        raw.attachment_urls = vec!["https://cdn.example/a/SPOILER_photo.png".to_string()];
        assert!(normalize(&raw).has_spoiler);

        raw.attachment_urls = vec!["https://cdn.example/a/Spoiler_photo.png".to_string()];
        assert!(normalize(&raw).has_spoiler);

        raw.attachment_urls = vec!["https://cdn.example/a/photo.png".to_string()];
        assert!(!normalize(&raw).has_spoiler);
    }

    #[test]
    fn test_no_attachments() {
        let mut raw = sample_raw();
        raw.attachment_urls = vec![];

        let record = normalize(&raw);
        assert!(!record.has_attachment);
        assert!(!record.has_spoiler);
        assert!(record.attachment_urls.is_empty());
    }

    #[test]
    fn test_determinism() {
        let raw = sample_raw();
        assert_eq!(normalize(&raw), normalize(&raw));
    }
}
