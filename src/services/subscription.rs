//! Subscription ledger
//!
//! Subscriptions are kept in a JSON file owned by this service. A season of
//! `None` is stored and matched as season 1, the same convention the
//! notifications use.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::SubscriptionService;
use crate::errors::RepositoryResult;
use crate::models::{MediaType, RecognizedMedia, SubscriptionResult};
use crate::utils::json_file::{read_json_or_default, write_json_atomically};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: u64,
    pub tmdb_id: u64,
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    pub media_type: MediaType,
    pub season: u32,
    pub username: String,
    pub created_at: String,
}

pub struct JsonSubscriptionLedger {
    path: PathBuf,
    subscriber_name: String,
    lock: Mutex<()>,
}

impl JsonSubscriptionLedger {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(path: P, subscriber_name: S) -> Self {
        Self {
            path: path.into(),
            subscriber_name: subscriber_name.into(),
            lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> RepositoryResult<Vec<Subscription>> {
        read_json_or_default(&self.path).await
    }

    fn find<'a>(
        subscriptions: &'a [Subscription],
        media: &RecognizedMedia,
        season: u32,
    ) -> Option<&'a Subscription> {
        subscriptions
            .iter()
            .find(|s| s.tmdb_id == media.tmdb_id && s.season == season)
    }

    async fn append(
        &self,
        media: &RecognizedMedia,
        season: u32,
    ) -> RepositoryResult<(u64, bool)> {
        let _guard = self.lock.lock().await;
        let mut subscriptions = self.list().await?;

        if let Some(existing) = Self::find(&subscriptions, media, season) {
            return Ok((existing.id, false));
        }

        let id = subscriptions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        subscriptions.push(Subscription {
            id,
            tmdb_id: media.tmdb_id,
            title: media.title.clone(),
            year: media.year.clone(),
            media_type: media.media_type,
            season,
            username: self.subscriber_name.clone(),
            created_at: Utc::now().to_rfc3339(),
        });
        write_json_atomically(&self.path, &subscriptions).await?;
        Ok((id, true))
    }
}

#[async_trait]
impl SubscriptionService for JsonSubscriptionLedger {
    async fn exists(&self, media: &RecognizedMedia, season: Option<u32>) -> bool {
        match self.list().await {
            Ok(subscriptions) => {
                Self::find(&subscriptions, media, season.unwrap_or(1)).is_some()
            }
            Err(e) => {
                warn!("Cannot read subscriptions {}: {}", self.path.display(), e);
                false
            }
        }
    }

    async fn create(&self, media: &RecognizedMedia, season: Option<u32>) -> SubscriptionResult {
        let season = season.unwrap_or(1);
        match self.append(media, season).await {
            Ok((id, true)) => {
                info!(
                    "Subscription {} added: {} season {}",
                    id,
                    media.title_year(),
                    season
                );
                SubscriptionResult {
                    id: Some(id),
                    message: "added".to_string(),
                }
            }
            Ok((id, false)) => SubscriptionResult {
                id: Some(id),
                message: "already subscribed".to_string(),
            },
            Err(e) => SubscriptionResult {
                id: None,
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(tmdb_id: u64) -> RecognizedMedia {
        RecognizedMedia {
            tmdb_id,
            title: "Show".to_string(),
            year: Some("2024".to_string()),
            media_type: MediaType::Tv,
            overview: None,
            poster_url: None,
            backdrop_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonSubscriptionLedger::new(dir.path().join("subs.json"), "tester");

        let first = ledger.create(&media(1), None).await;
        let second = ledger.create(&media(2), Some(2)).await;
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));

        let stored = ledger.list().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].season, 1);
        assert_eq!(stored[0].username, "tester");
        assert_eq!(stored[1].season, 2);
    }

    #[tokio::test]
    async fn test_exists_treats_missing_season_as_first() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonSubscriptionLedger::new(dir.path().join("subs.json"), "tester");

        assert!(!ledger.exists(&media(7), None).await);
        ledger.create(&media(7), Some(1)).await;
        assert!(ledger.exists(&media(7), None).await);
        assert!(!ledger.exists(&media(7), Some(2)).await);
    }

    #[tokio::test]
    async fn test_duplicate_create_returns_existing_id() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = JsonSubscriptionLedger::new(dir.path().join("subs.json"), "tester");

        let first = ledger.create(&media(3), None).await;
        let again = ledger.create(&media(3), None).await;
        assert_eq!(first.id, again.id);
        assert_eq!(ledger.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_ledger_refuses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let ledger = JsonSubscriptionLedger::new(&path, "tester");

        let result = ledger.create(&media(1), None).await;
        assert!(result.id.is_none());
        assert!(!result.message.is_empty());
    }
}
