//! Per-platform posted logs (`content/sns/<platform>/.posted.json`).
//!
//! One append-only JSON array per platform. `contentReference` is the
//! idempotence key: a log never holds the same reference twice, and a record
//! is written only after the platform confirmed the post.
//!
//! Older logs used per-platform field names (`filename`, `postId`, `tweetId`,
//! `statusId`, `uri`, `slug`, `subreddit`) and the oldest Dev.to log is a bare
//! array of strings. Both read transparently; writes use the current layout.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedRecord {
    #[serde(alias = "filename")]
    pub content_reference: String,
    #[serde(
        default,
        alias = "postId",
        alias = "tweetId",
        alias = "statusId",
        alias = "uri"
    )]
    pub external_post_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub posted_at: Option<NaiveDate>,
    #[serde(default, alias = "slug")]
    pub entity_slug: String,
    /// Sub-destination within the platform (a subreddit, for example).
    #[serde(default, alias = "subreddit", skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<String>,
}

/// Accepts `YYYY-MM-DD`, a full RFC 3339 timestamp, or nothing.
fn lenient_date<'de, D>(de: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(&s).ok().map(|t| t.date_naive()))
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Record(PostedRecord),
    Legacy(String),
}

impl From<StoredEntry> for PostedRecord {
    fn from(entry: StoredEntry) -> Self {
        match entry {
            StoredEntry::Record(r) => r,
            StoredEntry::Legacy(reference) => PostedRecord {
                content_reference: reference,
                external_post_id: String::new(),
                url: String::new(),
                posted_at: None,
                entity_slug: String::new(),
                destination: None,
                title: None,
                angle: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<StoredEntry>", into = "Vec<PostedRecord>")]
pub struct PostedLog {
    records: Vec<PostedRecord>,
}

impl From<Vec<StoredEntry>> for PostedLog {
    fn from(entries: Vec<StoredEntry>) -> Self {
        Self {
            records: entries.into_iter().map(PostedRecord::from).collect(),
        }
    }
}

impl From<PostedLog> for Vec<PostedRecord> {
    fn from(log: PostedLog) -> Self {
        log.records
    }
}

impl PostedLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[PostedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, content_reference: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.content_reference == content_reference)
    }

    /// Number of posts recorded for an entity on this platform.
    pub fn count_for(&self, slug: &str) -> usize {
        self.records.iter().filter(|r| r.entity_slug == slug).count()
    }

    /// Most recent post date to an exact sub-destination.
    pub fn last_to_destination(&self, destination: &str) -> Option<NaiveDate> {
        self.records
            .iter()
            .filter(|r| r.destination.as_deref() == Some(destination))
            .filter_map(|r| r.posted_at)
            .max()
    }

    /// Append a record. Returns `false` and leaves the log untouched when the
    /// reference is already present.
    pub fn push(&mut self, record: PostedRecord) -> bool {
        if self.contains(&record.content_reference) {
            return false;
        }
        self.records.push(record);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(reference: &str, slug: &str) -> PostedRecord {
        PostedRecord {
            content_reference: reference.to_string(),
            external_post_id: "1".to_string(),
            url: "https://example.test/1".to_string(),
            posted_at: NaiveDate::from_ymd_opt(2026, 5, 1),
            entity_slug: slug.to_string(),
            destination: None,
            title: None,
            angle: None,
        }
    }

    #[test]
    fn reads_legacy_string_array() {
        let log: PostedLog = serde_json::from_str(r#"["2025-01-01-alpha","2025-01-08-beta"]"#)
            .unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.contains("2025-01-08-beta"));
        assert_eq!(log.count_for("alpha"), 0);
    }

    #[test]
    fn reads_legacy_field_names() {
        let log: PostedLog = serde_json::from_str(
            r#"[{"filename":"2026-01-04-alpha.json","postId":"t3_abc","url":"https://reddit.test/x",
                 "postedAt":"2026-01-04","slug":"alpha","subreddit":"webdev"},
                {"filename":"2026-01-05-alpha.txt","uri":"at://did/app.bsky.feed.post/1","cid":"bafy",
                 "postedAt":"2026-01-05T09:00:00.000Z","slug":"alpha"}]"#,
        )
        .unwrap();
        let first = &log.records()[0];
        assert_eq!(first.external_post_id, "t3_abc");
        assert_eq!(first.entity_slug, "alpha");
        assert_eq!(first.destination.as_deref(), Some("webdev"));
        let second = &log.records()[1];
        assert_eq!(second.external_post_id, "at://did/app.bsky.feed.post/1");
        assert_eq!(second.posted_at, NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(log.count_for("alpha"), 2);
        assert_eq!(
            log.last_to_destination("webdev"),
            NaiveDate::from_ymd_opt(2026, 1, 4)
        );
        assert_eq!(log.last_to_destination("rust"), None);
    }

    #[test]
    fn push_rejects_duplicate_reference() {
        let mut log = PostedLog::new();
        assert!(log.push(record("2026-05-01-alpha", "alpha")));
        assert!(!log.push(record("2026-05-01-alpha", "alpha")));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn writes_current_layout() {
        let mut log = PostedLog::new();
        log.push(record("2026-05-01-alpha", "alpha"));
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "contentReference": "2026-05-01-alpha",
                "externalPostId": "1",
                "url": "https://example.test/1",
                "postedAt": "2026-05-01",
                "entitySlug": "alpha"
            }])
        );
    }
}
