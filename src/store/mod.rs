pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{Category, Entry, Feed, FeedUpdate, Marker, Page, Stats};

pub use sqlite::SqliteStore;

/// Minimal user rows; everything else about accounts lives outside the core.
pub trait UserRepo {
    fn add_user(&self, username: &str) -> Result<i64>;
}

pub trait FeedRepo {
    fn add_feed(&self, feed: &Feed) -> Result<i64>;
    fn feed_with_id(&self, user_id: i64, id: i64) -> Result<Option<Feed>>;
    fn feeds_for_user(&self, user_id: i64) -> Result<Vec<Feed>>;
    /// Every feed across every user, for scheduler enumeration.
    fn all_feeds(&self) -> Result<Vec<Feed>>;
    /// Returns false when the feed does not exist or is owned by someone else.
    fn update_feed(&self, user_id: i64, id: i64, update: &FeedUpdate) -> Result<bool>;
    fn delete_feed(&self, user_id: i64, id: i64) -> Result<bool>;
}

pub trait EntryRepo {
    /// Insert a sync batch atomically; duplicate fingerprints within a feed
    /// are ignored. Returns the number of newly inserted entries.
    fn add_entries(&self, entries: &[Entry]) -> Result<usize>;
    fn entry_with_id(&self, user_id: i64, id: i64) -> Result<Option<Entry>>;
    fn list_entries(&self, user_id: i64, page: &Page) -> Result<Vec<Entry>>;
    fn set_marker(&self, user_id: i64, entry_id: i64, marker: Marker) -> Result<bool>;
    fn set_marker_by_feed(&self, user_id: i64, feed_id: i64, marker: Marker) -> Result<usize>;
    fn set_marker_by_category(
        &self,
        user_id: i64,
        category_id: i64,
        marker: Marker,
    ) -> Result<usize>;
    /// Delete entries published before `cutoff`, across all users and feeds.
    fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
    fn stats_for_feed(&self, user_id: i64, feed_id: i64) -> Result<Stats>;
    fn stats_for_user(&self, user_id: i64) -> Result<Stats>;
}

pub trait CategoryRepo {
    fn add_category(&self, category: &Category) -> Result<i64>;
    fn category_with_id(&self, user_id: i64, id: i64) -> Result<Option<Category>>;
    fn categories_for_user(&self, user_id: i64) -> Result<Vec<Category>>;
    fn rename_category(&self, user_id: i64, id: i64, name: &str) -> Result<bool>;
    fn delete_category(&self, user_id: i64, id: i64) -> Result<bool>;
    fn feeds_in_category(&self, user_id: i64, category_id: i64) -> Result<Vec<Feed>>;
}

/// Umbrella bound for everything the services and scheduler need.
pub trait Store: UserRepo + FeedRepo + EntryRepo + CategoryRepo + Send + Sync {}

impl<T: UserRepo + FeedRepo + EntryRepo + CategoryRepo + Send + Sync> Store for T {}
