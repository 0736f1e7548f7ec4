//! External collaborators of the pipeline
//!
//! Each trait is one service the orchestrator consumes. The concrete
//! implementations in the submodules are what the binary wires up; tests
//! substitute their own.

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{MediaType, Notification, RecognizedMedia, SubscriptionResult};

pub mod library;
pub mod notification;
pub mod subscription;
pub mod tmdb;

pub use library::DirectoryLibraryIndex;
pub use notification::{LogNotifier, WebhookNotifier};
pub use subscription::JsonSubscriptionLedger;
pub use tmdb::TmdbClient;

/// Identifies a title against the metadata provider.
#[async_trait]
pub trait MediaRecognizer: Send + Sync {
    /// `None` when nothing matches or the lookup fails.
    async fn recognize(
        &self,
        title: &str,
        year: Option<&str>,
        media_type: MediaType,
    ) -> Option<RecognizedMedia>;
}

/// Resolves the authoritative air date of a recognised show.
#[async_trait]
pub trait AirDateResolver: Send + Sync {
    /// `YYYY-MM-DD`, or `None` when no date can be confirmed.
    async fn resolve_air_date(&self, tmdb_id: u64, season: Option<u32>) -> Option<String>;
}

#[async_trait]
pub trait LibraryIndex: Send + Sync {
    async fn exists(&self, media: &RecognizedMedia, season: Option<u32>) -> bool;
}

#[async_trait]
pub trait SubscriptionService: Send + Sync {
    async fn exists(&self, media: &RecognizedMedia, season: Option<u32>) -> bool;

    /// A result without an id means the subscription was refused; the
    /// message says why.
    async fn create(&self, media: &RecognizedMedia, season: Option<u32>) -> SubscriptionResult;
}

/// Fire-and-forget notifications. Callers log failures and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> AppResult<()>;
}
