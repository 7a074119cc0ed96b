//! # Tributary
//!
//! A multi-user RSS/Atom aggregation service core.
//!
//! ## Architecture
//!
//! Tributary follows a pipeline architecture per feed:
//!
//! ```text
//! Fetcher → Normalizer → Store ← Services
//!                          ↑
//!                      Scheduler
//! ```
//!
//! - [`fetcher`]: HTTP client with ETag/conditional request support
//! - [`normalizer`]: Converts RSS/Atom documents to unified domain models
//! - [`store`]: SQLite persistence behind repository traits
//! - [`service`]: Per-user feed, entry, and category operations
//! - [`sync`]: Background sync cycles, retention sweeps, and the scheduler
//!
//! Every stored row is scoped to a user; entries are deduplicated per feed
//! by a content fingerprint, and listings paginate with opaque cursors.

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires together the store, fetcher, and
/// services.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// TOML configuration: sync interval, retention age, worker count, and the
/// database path.
pub mod config;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): a user's subscription to a source URL
/// - [`Entry`](domain::Entry): an article with a read/unread marker
/// - [`Category`](domain::Category): a user's grouping of feeds
/// - [`Page`](domain::Page): cursor-based listing parameters
pub mod domain;

/// HTTP fetching with conditional request support.
pub mod fetcher;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0 and Atom 0.3/1.0 into [`Entry`](domain::Entry)
/// structs with SHA-256 fingerprints.
pub mod normalizer;

/// User-facing operations over the repositories: subscriptions, listings,
/// markers, categories, statistics.
pub mod service;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): umbrella over the repository traits
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Background synchronization.
///
/// - [`SyncService`](sync::SyncService): fetch-merge sequences with per-feed
///   exclusion and bounded concurrency
/// - [`Scheduler`](sync::Scheduler): interval-driven cycles and retention
///   sweeps
pub mod sync;
