use std::sync::Arc;

use crate::app::{Result, TributaryError};
use crate::domain::{Cursor, Entry, Marker, Page, Stats};
use crate::store::Store;

/// Read path over accumulated entries: cursor pagination and per-entry
/// marking.
pub struct EntryService<S> {
    store: Arc<S>,
}

impl<S> Clone for EntryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> EntryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn entry(&self, user_id: i64, id: i64) -> Result<Entry> {
        self.store
            .entry_with_id(user_id, id)?
            .ok_or(TributaryError::EntryNotFound(id))
    }

    /// One page of entries plus the continuation token for the next page.
    ///
    /// An exhausted or empty result returns `(vec![], None)`, never an error;
    /// a filter on a missing feed or category simply matches nothing.
    pub fn list(&self, user_id: i64, page: &Page) -> Result<(Vec<Entry>, Option<String>)> {
        let entries = self.store.list_entries(user_id, page)?;

        let next = if page.count > 0 && entries.len() == page.count {
            entries.last().map(|last| {
                Cursor {
                    published_at: last.published_at,
                    id: last.id,
                }
                .encode()
            })
        } else {
            None
        };

        Ok((entries, next))
    }

    pub fn mark(&self, user_id: i64, id: i64, marker: Marker) -> Result<()> {
        if !self.store.set_marker(user_id, id, marker)? {
            return Err(TributaryError::EntryNotFound(id));
        }
        Ok(())
    }

    pub fn stats(&self, user_id: i64) -> Result<Stats> {
        self.store.stats_for_user(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::domain::{Feed, Filter};
    use crate::store::{EntryRepo, FeedRepo, SqliteStore, UserRepo};

    fn service_with_feed() -> (EntryService<SqliteStore>, Arc<SqliteStore>, i64, i64) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let user_id = store.add_user("gopher").unwrap();
        let feed_id = store
            .add_feed(&Feed::new(user_id, "https://example.com/feed.xml".into()))
            .unwrap();
        (EntryService::new(store.clone()), store, user_id, feed_id)
    }

    fn seed_entries(store: &SqliteStore, user_id: i64, feed_id: i64, n: usize) {
        let base = Utc::now();
        let entries: Vec<Entry> = (0..n)
            .map(|i| {
                let mut e = Entry::new(user_id, feed_id, format!("fp-{i}"));
                e.published_at = base - Duration::minutes(i as i64);
                e
            })
            .collect();
        store.add_entries(&entries).unwrap();
    }

    #[test]
    fn test_list_chains_cursors_without_gaps_or_repeats() {
        let (service, store, user_id, feed_id) = service_with_feed();
        seed_entries(&store, user_id, feed_id, 7);

        let mut page = Page::new(Filter::Feed(feed_id), 3);
        let mut seen = Vec::new();
        loop {
            let (entries, next) = service.list(user_id, &page).unwrap();
            assert!(entries.len() <= 3);
            seen.extend(entries.into_iter().map(|e| e.id));
            match next {
                Some(token) => page.cursor = Some(Cursor::decode(&token).unwrap()),
                None => break,
            }
        }

        assert_eq!(seen.len(), 7);
        let mut deduped = seen.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), 7);
    }

    #[test]
    fn test_list_empty_is_not_an_error() {
        let (service, _, user_id, _) = service_with_feed();

        let page = Page::new(Filter::Feed(999), 5);
        let (entries, next) = service.list(user_id, &page).unwrap();
        assert!(entries.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn test_list_short_page_has_no_cursor() {
        let (service, store, user_id, feed_id) = service_with_feed();
        seed_entries(&store, user_id, feed_id, 2);

        let page = Page::new(Filter::Feed(feed_id), 5);
        let (entries, next) = service.list(user_id, &page).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(next.is_none());
    }

    #[test]
    fn test_mark_entry() {
        let (service, store, user_id, feed_id) = service_with_feed();
        seed_entries(&store, user_id, feed_id, 1);
        let id = store
            .list_entries(user_id, &Page::new(Filter::Feed(feed_id), 1))
            .unwrap()[0]
            .id;

        service.mark(user_id, id, Marker::Read).unwrap();
        assert_eq!(service.entry(user_id, id).unwrap().marker, Marker::Read);

        service.mark(user_id, id, Marker::Unread).unwrap();
        assert_eq!(service.entry(user_id, id).unwrap().marker, Marker::Unread);
    }

    #[test]
    fn test_mark_missing_entry() {
        let (service, _, user_id, _) = service_with_feed();
        let err = service.mark(user_id, 999, Marker::Read).unwrap_err();
        assert!(matches!(err, TributaryError::EntryNotFound(999)));
    }

    #[test]
    fn test_entries_invisible_across_users() {
        let (service, store, user_id, feed_id) = service_with_feed();
        seed_entries(&store, user_id, feed_id, 3);
        let other = store.add_user("ferris").unwrap();

        let (entries, _) = service.list(other, &Page::new(Filter::All, 10)).unwrap();
        assert!(entries.is_empty());
    }
}
