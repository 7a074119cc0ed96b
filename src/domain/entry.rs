use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Per-user read state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    Unread,
    Read,
}

impl Marker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Marker::Unread => "unread",
            Marker::Read => "read",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unread" => Some(Marker::Unread),
            "read" => Some(Marker::Read),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    /// Stable dedup key; at most one stored entry per fingerprint per feed.
    pub fingerprint: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub marker: Marker,
    pub published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(user_id: i64, feed_id: i64, fingerprint: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id,
            feed_id,
            fingerprint,
            title: None,
            link: None,
            content: None,
            summary: None,
            author: None,
            marker: Marker::Unread,
            published_at: now,
            fetched_at: now,
        }
    }

    /// Derive a deterministic fingerprint from the subscription URL and the
    /// source-provided entry identifier (or its link when the source has none).
    pub fn fingerprint(subscription: &str, source_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(subscription.as_bytes());
        hasher.update(source_id.as_bytes());
        hex::encode(hasher.finalize())
    }
}
