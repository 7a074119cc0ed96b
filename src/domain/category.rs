use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named group of feeds. A feed belongs to at most one category per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(user_id: i64, name: String) -> Self {
        Self {
            id: 0,
            user_id,
            name,
            created_at: Utc::now(),
        }
    }
}
