//! History store
//!
//! The history is one ordered collection, loaded whole and saved whole. There
//! is no indexed lookup: callers build their own key set once per run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::RepositoryResult;
use crate::models::HistoryRecord;
use crate::utils::json_file::{read_json_or_default, write_json_atomically};

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Every record, in insertion order.
    async fn load(&self) -> RepositoryResult<Vec<HistoryRecord>>;

    /// Replace the whole persisted collection with `records`.
    async fn save(&self, records: &[HistoryRecord]) -> RepositoryResult<()>;

    /// Equivalent to saving an empty collection.
    async fn clear(&self) -> RepositoryResult<()> {
        self.save(&[]).await
    }
}

/// History persisted as a JSON array in a single file.
pub struct JsonFileHistoryStore {
    path: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn load(&self) -> RepositoryResult<Vec<HistoryRecord>> {
        let records: Vec<HistoryRecord> = read_json_or_default(&self.path).await?;
        debug!(
            "Loaded {} history records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    async fn save(&self, records: &[HistoryRecord]) -> RepositoryResult<()> {
        write_json_atomically(&self.path, records).await?;
        debug!(
            "Saved {} history records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn clear(&self) -> RepositoryResult<()> {
        self.save(&[]).await?;
        info!("History cleared: {}", self.path.display());
        Ok(())
    }
}

/// Process-local history, for tests and dry runs.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: RwLock<Vec<HistoryRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<HistoryRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self) -> RepositoryResult<Vec<HistoryRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn save(&self, records: &[HistoryRecord]) -> RepositoryResult<()> {
        *self.records.write().await = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(unique: &str) -> HistoryRecord {
        HistoryRecord {
            title: "Show".to_string(),
            year: "2024".to_string(),
            wish_count: 6000,
            air_date: "2024-05-13".to_string(),
            regions: vec!["美国".to_string()],
            genres: vec!["剧情".to_string()],
            link: "https://x/subject/1/".to_string(),
            tmdb_id: Some(7),
            poster: None,
            overview: None,
            time: "2024-05-10 09:00:00".to_string(),
            unique: unique.to_string(),
        }
    }

    #[tokio::test]
    async fn test_file_store_save_overwrites_whole_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history.json"));

        assert!(store.load().await.unwrap().is_empty());

        store.save(&[record("a"), record("b")]).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].unique, "a");

        store.save(&[record("c")]).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], record("c"));
    }

    #[tokio::test]
    async fn test_file_store_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history.json"));
        store.save(&[record("a")]).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_in_memory_store_clear_uses_default() {
        let store = InMemoryHistoryStore::with_records(vec![record("a")]);
        assert_eq!(store.load().await.unwrap().len(), 1);
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }
}
