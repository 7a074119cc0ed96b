use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub title: Option<String>,
    /// URL the feed is polled from.
    pub subscription: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Feed {
    pub fn new(user_id: i64, subscription: String) -> Self {
        Self {
            id: 0,
            user_id,
            category_id: None,
            title: None,
            subscription,
            etag: None,
            last_modified: None,
            last_synced_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.subscription)
    }
}

/// Partial update; only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct FeedUpdate {
    pub title: Option<String>,
    pub subscription: Option<String>,
    pub category_id: Option<i64>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}
