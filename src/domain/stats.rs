use serde::{Deserialize, Serialize};

/// Marker counts for a feed or a whole user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub unread: i64,
    pub read: i64,
    pub total: i64,
}
