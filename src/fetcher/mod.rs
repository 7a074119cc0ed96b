//! Outbound HTTP for feed documents.
//!
//! The trait is the seam the sync engine and feed creation test through;
//! [`HttpFetcher`] is the production implementation. Every failure mode of a
//! fetch, from DNS to a non-2xx status, surfaces as
//! [`TributaryError::FetchFeed`](crate::app::TributaryError::FetchFeed) so
//! callers treat the fetcher as a single fallible step.

pub mod http_fetcher;

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// Applied when the configuration does not say otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum FetchResult {
    /// The document body plus whatever cache validators the origin sent.
    Content {
        body: Vec<u8>,
        etag: Option<String>,
        last_modified: Option<String>,
    },
    /// Origin answered 304 to a conditional request.
    NotModified,
}

/// One conditional GET. Pass the stored validators from the previous fetch;
/// `None` for either makes the request unconditional on that axis.
#[async_trait]
pub trait Fetcher {
    async fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchResult>;
}
