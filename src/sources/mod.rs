//! Feed sources
//!
//! A source turns a URL into the list of [`CandidateItem`]s the pipeline
//! iterates over. The only concrete source is the RSS fetcher; the trait
//! exists so the orchestrator can be driven by a stub in tests.

use async_trait::async_trait;

use crate::errors::SourceResult;
use crate::models::CandidateItem;

pub mod rss;

pub use rss::{parse_rss_items, RssFeedFetcher};

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse the feed at `url`.
    ///
    /// Fails on transport errors, non-success statuses, empty bodies and
    /// documents that are not RSS. Items without a title and a link are
    /// dropped silently.
    async fn fetch(&self, url: &str, use_proxy: bool) -> SourceResult<Vec<CandidateItem>>;
}
