use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, TributaryError};
use crate::domain::{Category, Entry, Feed, FeedUpdate, Filter, Marker, Page, Stats};
use crate::store::{CategoryRepo, EntryRepo, FeedRepo, UserRepo};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Fixed-width RFC 3339 so that lexicographic order matches chronological
/// order; entry cursors and retention cutoffs compare these as strings.
fn fmt_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn row_to_feed(row: &Row<'_>) -> rusqlite::Result<Feed> {
    Ok(Feed {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        title: row.get(3)?,
        subscription: row.get(4)?,
        etag: row.get(5)?,
        last_modified: row.get(6)?,
        last_synced_at: row
            .get::<_, Option<String>>(7)?
            .and_then(|s| parse_ts(&s)),
        created_at: row
            .get::<_, String>(8)
            .ok()
            .and_then(|s| parse_ts(&s))
            .unwrap_or_else(Utc::now),
    })
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        feed_id: row.get(2)?,
        fingerprint: row.get(3)?,
        title: row.get(4)?,
        link: row.get(5)?,
        content: row.get(6)?,
        summary: row.get(7)?,
        author: row.get(8)?,
        marker: row
            .get::<_, String>(9)
            .ok()
            .and_then(|s| Marker::parse(&s))
            .unwrap_or(Marker::Unread),
        published_at: row
            .get::<_, String>(10)
            .ok()
            .and_then(|s| parse_ts(&s))
            .unwrap_or_else(Utc::now),
        fetched_at: row
            .get::<_, String>(11)
            .ok()
            .and_then(|s| parse_ts(&s))
            .unwrap_or_else(Utc::now),
    })
}

fn row_to_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        created_at: row
            .get::<_, String>(3)
            .ok()
            .and_then(|s| parse_ts(&s))
            .unwrap_or_else(Utc::now),
    })
}

const FEED_COLUMNS: &str =
    "id, user_id, category_id, title, subscription, etag, last_modified, last_synced_at, created_at";
const ENTRY_COLUMNS: &str = "id, user_id, feed_id, fingerprint, title, link, content, summary, author, marker, published_at, fetched_at";

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| TributaryError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            TributaryError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }
}

impl UserRepo for SqliteStore {
    fn add_user(&self, username: &str) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (username, created_at) VALUES (?1, ?2)",
            params![username, fmt_ts(&Utc::now())],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl FeedRepo for SqliteStore {
    fn add_feed(&self, feed: &Feed) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO feeds (user_id, category_id, title, subscription, etag, last_modified, last_synced_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                feed.user_id,
                feed.category_id,
                feed.title,
                feed.subscription,
                feed.etag,
                feed.last_modified,
                feed.last_synced_at.map(|dt| fmt_ts(&dt)),
                fmt_ts(&feed.created_at)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn feed_with_id(&self, user_id: i64, id: i64) -> Result<Option<Feed>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?1 AND user_id = ?2"),
                params![id, user_id],
                row_to_feed,
            )
            .optional()?;
        Ok(result)
    }

    fn feeds_for_user(&self, user_id: i64) -> Result<Vec<Feed>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE user_id = ?1 ORDER BY title, subscription"
        ))?;
        let feeds = stmt
            .query_map(params![user_id], row_to_feed)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(feeds)
    }

    fn all_feeds(&self) -> Result<Vec<Feed>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {FEED_COLUMNS} FROM feeds ORDER BY id"))?;
        let feeds = stmt
            .query_map([], row_to_feed)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(feeds)
    }

    fn update_feed(&self, user_id: i64, id: i64, update: &FeedUpdate) -> Result<bool> {
        let conn = self.conn()?;

        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM feeds WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(false);
        }

        if let Some(ref title) = update.title {
            conn.execute(
                "UPDATE feeds SET title = ?1 WHERE id = ?2",
                params![title, id],
            )?;
        }
        if let Some(ref subscription) = update.subscription {
            conn.execute(
                "UPDATE feeds SET subscription = ?1 WHERE id = ?2",
                params![subscription, id],
            )?;
        }
        if let Some(category_id) = update.category_id {
            conn.execute(
                "UPDATE feeds SET category_id = ?1 WHERE id = ?2",
                params![category_id, id],
            )?;
        }
        if let Some(ref etag) = update.etag {
            conn.execute("UPDATE feeds SET etag = ?1 WHERE id = ?2", params![etag, id])?;
        }
        if let Some(ref last_modified) = update.last_modified {
            conn.execute(
                "UPDATE feeds SET last_modified = ?1 WHERE id = ?2",
                params![last_modified, id],
            )?;
        }
        if let Some(ref last_synced_at) = update.last_synced_at {
            conn.execute(
                "UPDATE feeds SET last_synced_at = ?1 WHERE id = ?2",
                params![fmt_ts(last_synced_at), id],
            )?;
        }

        Ok(true)
    }

    fn delete_feed(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM feeds WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }
}

impl EntryRepo for SqliteStore {
    fn add_entries(&self, entries: &[Entry]) -> Result<usize> {
        let mut conn = self.conn()?;

        let tx = conn.transaction()?;
        let mut count = 0;

        for entry in entries {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO entries (user_id, feed_id, fingerprint, title, link, content, summary, author, marker, published_at, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    entry.user_id,
                    entry.feed_id,
                    entry.fingerprint,
                    entry.title,
                    entry.link,
                    entry.content,
                    entry.summary,
                    entry.author,
                    entry.marker.as_str(),
                    fmt_ts(&entry.published_at),
                    fmt_ts(&entry.fetched_at)
                ],
            )?;
            count += inserted;
        }

        tx.commit()?;
        Ok(count)
    }

    fn entry_with_id(&self, user_id: i64, id: i64) -> Result<Option<Entry>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1 AND user_id = ?2"),
                params![id, user_id],
                row_to_entry,
            )
            .optional()?;
        Ok(result)
    }

    fn list_entries(&self, user_id: i64, page: &Page) -> Result<Vec<Entry>> {
        let conn = self.conn()?;

        let mut sql = String::from(
            "SELECT e.id, e.user_id, e.feed_id, e.fingerprint, e.title, e.link, e.content, \
             e.summary, e.author, e.marker, e.published_at, e.fetched_at FROM entries e",
        );
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if matches!(page.filter, Filter::Category(_)) {
            sql.push_str(" JOIN feeds f ON f.id = e.feed_id");
        }

        sql.push_str(" WHERE e.user_id = ?");
        values.push(Box::new(user_id));

        match page.filter {
            Filter::All => {}
            Filter::Feed(feed_id) => {
                sql.push_str(" AND e.feed_id = ?");
                values.push(Box::new(feed_id));
            }
            Filter::Category(category_id) => {
                sql.push_str(" AND f.category_id = ?");
                values.push(Box::new(category_id));
            }
        }

        if let Some(marker) = page.marker {
            sql.push_str(" AND e.marker = ?");
            values.push(Box::new(marker.as_str()));
        }

        if let Some(cursor) = &page.cursor {
            // Composite sort-key comparison, never a row offset, so pages stay
            // stable while syncs insert entries between calls.
            if page.newest {
                sql.push_str(" AND (e.published_at < ? OR (e.published_at = ? AND e.id < ?))");
            } else {
                sql.push_str(" AND (e.published_at > ? OR (e.published_at = ? AND e.id > ?))");
            }
            let ts = fmt_ts(&cursor.published_at);
            values.push(Box::new(ts.clone()));
            values.push(Box::new(ts));
            values.push(Box::new(cursor.id));
        }

        if page.newest {
            sql.push_str(" ORDER BY e.published_at DESC, e.id DESC");
        } else {
            sql.push_str(" ORDER BY e.published_at ASC, e.id ASC");
        }

        sql.push_str(" LIMIT ?");
        values.push(Box::new(page.count as i64));

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(values), row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn set_marker(&self, user_id: i64, entry_id: i64, marker: Marker) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE entries SET marker = ?1 WHERE id = ?2 AND user_id = ?3",
            params![marker.as_str(), entry_id, user_id],
        )?;
        Ok(updated > 0)
    }

    fn set_marker_by_feed(&self, user_id: i64, feed_id: i64, marker: Marker) -> Result<usize> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE entries SET marker = ?1 WHERE feed_id = ?2 AND user_id = ?3",
            params![marker.as_str(), feed_id, user_id],
        )?;
        Ok(updated)
    }

    fn set_marker_by_category(
        &self,
        user_id: i64,
        category_id: i64,
        marker: Marker,
    ) -> Result<usize> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE entries SET marker = ?1 WHERE user_id = ?2 AND feed_id IN
             (SELECT id FROM feeds WHERE user_id = ?2 AND category_id = ?3)",
            params![marker.as_str(), user_id, category_id],
        )?;
        Ok(updated)
    }

    fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM entries WHERE published_at < ?1",
            params![fmt_ts(&cutoff)],
        )?;
        Ok(deleted)
    }

    fn stats_for_feed(&self, user_id: i64, feed_id: i64) -> Result<Stats> {
        let conn = self.conn()?;
        let stats = conn.query_row(
            "SELECT COALESCE(SUM(marker = 'unread'), 0), COALESCE(SUM(marker = 'read'), 0), COUNT(*)
             FROM entries WHERE user_id = ?1 AND feed_id = ?2",
            params![user_id, feed_id],
            |row| {
                Ok(Stats {
                    unread: row.get(0)?,
                    read: row.get(1)?,
                    total: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }

    fn stats_for_user(&self, user_id: i64) -> Result<Stats> {
        let conn = self.conn()?;
        let stats = conn.query_row(
            "SELECT COALESCE(SUM(marker = 'unread'), 0), COALESCE(SUM(marker = 'read'), 0), COUNT(*)
             FROM entries WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(Stats {
                    unread: row.get(0)?,
                    read: row.get(1)?,
                    total: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }
}

impl CategoryRepo for SqliteStore {
    fn add_category(&self, category: &Category) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name, created_at) VALUES (?1, ?2, ?3)",
            params![
                category.user_id,
                category.name,
                fmt_ts(&category.created_at)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn category_with_id(&self, user_id: i64, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                "SELECT id, user_id, name, created_at FROM categories WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                row_to_category,
            )
            .optional()?;
        Ok(result)
    }

    fn categories_for_user(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, created_at FROM categories WHERE user_id = ?1 ORDER BY name",
        )?;
        let categories = stmt
            .query_map(params![user_id], row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn rename_category(&self, user_id: i64, id: i64, name: &str) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE categories SET name = ?1 WHERE id = ?2 AND user_id = ?3",
            params![name, id, user_id],
        )?;
        Ok(updated > 0)
    }

    fn delete_category(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM categories WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    fn feeds_in_category(&self, user_id: i64, category_id: i64) -> Result<Vec<Feed>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE user_id = ?1 AND category_id = ?2 ORDER BY title, subscription"
        ))?;
        let feeds = stmt
            .query_map(params![user_id, category_id], row_to_feed)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(feeds)
    }
}
