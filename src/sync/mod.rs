//! Feed synchronization engine: per-feed fetch→normalize→merge sequences,
//! bounded-concurrency cycles over every feed, retention sweeps, and the
//! interval scheduler driving it all.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::domain::{Feed, FeedUpdate};
use crate::fetcher::{FetchResult, Fetcher};
use crate::normalizer::Normalizer;
use crate::store::Store;

pub const DEFAULT_WORKERS: usize = 10;

/// Per-feed result of one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Fetch and merge completed; carries the number of new entries.
    Synced(usize),
    /// Another sync of the same feed was already in flight.
    Skipped,
}

/// Runs fetch-merge sequences. At most one sequence per feed is in flight at
/// any time; a cycle bounds its outbound fetches with a semaphore.
pub struct SyncService<S> {
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<i64>>>,
}

impl<S> Clone for SyncService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            fetcher: self.fetcher.clone(),
            normalizer: self.normalizer.clone(),
            semaphore: self.semaphore.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

/// Removes the feed from the in-flight set when the sequence ends, however it
/// ends.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<i64>>>,
    feed_id: i64,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<i64>>>, feed_id: i64) -> Option<Self> {
        let mut guard = set.lock().unwrap_or_else(|e| e.into_inner());
        if guard.insert(feed_id) {
            Some(Self {
                set: set.clone(),
                feed_id,
            })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut guard = self.set.lock().unwrap_or_else(|e| e.into_inner());
        guard.remove(&self.feed_id);
    }
}

impl<S: Store + 'static> SyncService<S> {
    pub fn new(store: Arc<S>, fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            store,
            fetcher,
            normalizer: Normalizer::new(),
            semaphore: Arc::new(Semaphore::new(workers)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// One fetch-merge sequence for a single feed.
    ///
    /// The merge is atomic: either the whole batch of new entries commits or
    /// none of it does. Concurrent calls for the same feed skip.
    pub async fn sync_feed(&self, feed: &Feed) -> Result<SyncOutcome> {
        let _guard = match InFlightGuard::acquire(&self.in_flight, feed.id) {
            Some(guard) => guard,
            None => {
                debug!(feed_id = feed.id, "sync already in flight, skipping");
                return Ok(SyncOutcome::Skipped);
            }
        };

        let fetched = self
            .fetcher
            .fetch(
                &feed.subscription,
                feed.etag.as_deref(),
                feed.last_modified.as_deref(),
            )
            .await?;

        let new_entries = match fetched {
            FetchResult::NotModified => {
                debug!(feed_id = feed.id, "feed not modified");
                let update = FeedUpdate {
                    last_synced_at: Some(Utc::now()),
                    ..Default::default()
                };
                self.store.update_feed(feed.user_id, feed.id, &update)?;
                0
            }
            FetchResult::Content {
                body,
                etag,
                last_modified,
            } => {
                let (meta, entries) =
                    self.normalizer
                        .normalize(feed.user_id, feed.id, &feed.subscription, &body)?;

                let new_entries = self.store.add_entries(&entries)?;

                let update = FeedUpdate {
                    // Only adopt the document title while we have none.
                    title: if feed.title.is_none() { meta.title } else { None },
                    etag,
                    last_modified,
                    last_synced_at: Some(Utc::now()),
                    ..Default::default()
                };
                self.store.update_feed(feed.user_id, feed.id, &update)?;

                new_entries
            }
        };

        if new_entries > 0 {
            info!(
                feed_id = feed.id,
                new_entries,
                "synced {}",
                feed.display_title()
            );
        }
        Ok(SyncOutcome::Synced(new_entries))
    }

    /// One cycle across every feed of every user.
    ///
    /// Feeds are synced independently with at most `workers` fetches in
    /// flight; one feed's failure never aborts its siblings.
    pub async fn sync_all(&self) -> Vec<(i64, Result<SyncOutcome>)> {
        let feeds = match self.store.all_feeds() {
            Ok(feeds) => feeds,
            Err(e) => {
                warn!(error = %e, "could not enumerate feeds for sync");
                return Vec::new();
            }
        };

        let mut handles = Vec::new();
        for feed in feeds {
            let service = self.clone();
            handles.push(tokio::spawn(async move {
                let _permit = service
                    .semaphore
                    .acquire()
                    .await
                    .expect("Semaphore closed");

                let result = service.sync_feed(&feed).await;
                (feed.id, result)
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                }
            }
        }

        results
    }
}

/// Retention sweep: delete entries published more than `delete_after_days`
/// before `now`. A non-positive age disables retention and deletes nothing.
pub fn sweep<S: Store>(store: &S, now: DateTime<Utc>, delete_after_days: i64) -> Result<usize> {
    if delete_after_days <= 0 {
        return Ok(0);
    }
    let cutoff = now - chrono::Duration::days(delete_after_days);
    store.delete_older_than(cutoff)
}

/// Drives sync cycles and retention sweeps on a fixed interval, with an
/// explicit start/stop lifecycle.
pub struct Scheduler<S> {
    sync: SyncService<S>,
    store: Arc<S>,
    interval: Duration,
    delete_after_days: i64,
}

/// Handle to a running scheduler; dropping it does not stop the task.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the loop to finish. In-flight fetches are
    /// abandoned; per-feed merges commit or roll back whole.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl<S: Store + 'static> Scheduler<S> {
    pub fn new(
        sync: SyncService<S>,
        store: Arc<S>,
        interval: Duration,
        delete_after_days: i64,
    ) -> Self {
        Self {
            sync,
            store,
            interval,
            delete_after_days,
        }
    }

    /// Spawn the scheduler loop. The first cycle runs immediately.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        SchedulerHandle { shutdown, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut timer = tokio::time::interval(self.interval);
        // Skip, don't queue, cycles that the previous one overran.
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.run_cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("scheduler stopped");
    }

    async fn run_cycle(&self) {
        let started = std::time::Instant::now();

        let mut new_entries = 0usize;
        let mut synced = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for (feed_id, result) in self.sync.sync_all().await {
            match result {
                Ok(SyncOutcome::Synced(count)) => {
                    synced += 1;
                    new_entries += count;
                }
                Ok(SyncOutcome::Skipped) => skipped += 1,
                Err(e) => {
                    failed += 1;
                    warn!(feed_id, error = %e, "feed sync failed");
                }
            }
        }

        match sweep(self.store.as_ref(), Utc::now(), self.delete_after_days) {
            Ok(deleted) if deleted > 0 => {
                info!(deleted, "retention sweep removed stale entries");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "retention sweep failed"),
        }

        info!(
            synced,
            skipped,
            failed,
            new_entries,
            elapsed_ms = started.elapsed().as_millis(),
            "sync cycle complete"
        );
    }
}
