use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::normalizer::Normalizer;
use crate::service::{CategoryService, EntryService, FeedService};
use crate::store::SqliteStore;
use crate::sync::SyncService;

/// Wires the store, fetcher, and services together.
pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub feeds: FeedService<SqliteStore>,
    pub entries: EntryService<SqliteStore>,
    pub categories: CategoryService<SqliteStore>,
    pub sync: SyncService<SqliteStore>,
}

impl AppContext {
    pub fn new(config: &Config) -> Result<Self> {
        let db_path = config.database_path()?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(config.fetch_timeout()?));

        Ok(Self {
            feeds: FeedService::new(store.clone(), fetcher.clone(), Normalizer::new()),
            entries: EntryService::new(store.clone()),
            categories: CategoryService::new(store.clone()),
            sync: SyncService::new(store.clone(), fetcher, config.sync.workers),
            store,
        })
    }
}
