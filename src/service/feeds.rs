use std::sync::Arc;

use chrono::Utc;
use url::Url;

use crate::app::{Result, TributaryError};
use crate::domain::{Feed, FeedUpdate, Marker, Stats};
use crate::fetcher::{FetchResult, Fetcher};
use crate::normalizer::Normalizer;
use crate::store::Store;

/// Feed subscription lifecycle: create (with a validation fetch), edit,
/// delete, and feed-wide marking.
pub struct FeedService<S> {
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
}

impl<S> Clone for FeedService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            fetcher: self.fetcher.clone(),
            normalizer: self.normalizer.clone(),
        }
    }
}

impl<S: Store> FeedService<S> {
    pub fn new(
        store: Arc<S>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            store,
            fetcher,
            normalizer,
        }
    }

    /// Subscribe a user to a feed.
    ///
    /// The URL must be fetchable and parsable right now; otherwise the
    /// creation fails with [`TributaryError::FetchFeed`] and nothing is
    /// persisted. Entries from the validation fetch are stored immediately.
    pub async fn create(
        &self,
        user_id: i64,
        title: &str,
        subscription: &str,
        category_id: Option<i64>,
    ) -> Result<Feed> {
        if subscription.trim().is_empty() {
            return Err(TributaryError::Validation("empty subscription URL".into()));
        }
        Url::parse(subscription)
            .map_err(|e| TributaryError::FetchFeed(format!("{subscription}: {e}")))?;

        if let Some(category_id) = category_id {
            self.store
                .category_with_id(user_id, category_id)?
                .ok_or(TributaryError::CategoryNotFound(category_id))?;
        }

        let fetched = self.fetcher.fetch(subscription, None, None).await?;

        let (body, etag, last_modified) = match fetched {
            FetchResult::Content {
                body,
                etag,
                last_modified,
            } => (body, etag, last_modified),
            // A 304 on an unconditional request still proves the URL serves a
            // feed we have seen; subscribe with no initial entries.
            FetchResult::NotModified => (Vec::new(), None, None),
        };

        let parsed = if body.is_empty() {
            None
        } else {
            Some(
                self.normalizer
                    .normalize(user_id, 0, subscription, &body)
                    .map_err(|e| TributaryError::FetchFeed(e.to_string()))?,
            )
        };

        let mut feed = Feed::new(user_id, subscription.to_string());
        feed.category_id = category_id;
        feed.etag = etag;
        feed.last_modified = last_modified;
        feed.last_synced_at = Some(Utc::now());
        feed.title = if title.trim().is_empty() {
            parsed.as_ref().and_then(|(meta, _)| meta.title.clone())
        } else {
            Some(title.to_string())
        };

        feed.id = self.store.add_feed(&feed)?;

        if let Some((_, mut entries)) = parsed {
            for entry in &mut entries {
                entry.feed_id = feed.id;
            }
            self.store.add_entries(&entries)?;
        }

        Ok(feed)
    }

    pub fn feed(&self, user_id: i64, id: i64) -> Result<Feed> {
        self.store
            .feed_with_id(user_id, id)?
            .ok_or(TributaryError::FeedNotFound(id))
    }

    pub fn feeds(&self, user_id: i64) -> Result<Vec<Feed>> {
        self.store.feeds_for_user(user_id)
    }

    pub fn update(&self, user_id: i64, id: i64, update: &FeedUpdate) -> Result<()> {
        if let Some(category_id) = update.category_id {
            self.store
                .category_with_id(user_id, category_id)?
                .ok_or(TributaryError::CategoryNotFound(category_id))?;
        }
        if !self.store.update_feed(user_id, id, update)? {
            return Err(TributaryError::FeedNotFound(id));
        }
        Ok(())
    }

    pub fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        if !self.store.delete_feed(user_id, id)? {
            return Err(TributaryError::FeedNotFound(id));
        }
        Ok(())
    }

    /// Mark every entry of the feed.
    pub fn mark(&self, user_id: i64, id: i64, marker: Marker) -> Result<()> {
        self.feed(user_id, id)?;
        self.store.set_marker_by_feed(user_id, id, marker)?;
        Ok(())
    }

    pub fn stats(&self, user_id: i64, id: i64) -> Result<Stats> {
        self.feed(user_id, id)?;
        self.store.stats_for_feed(user_id, id)
    }
}
