//! Asynchronous facade over the media store.

use super::models::{CacheStats, MediaRecord};
use super::store::{MediaStore, SqliteMediaStore, StoreError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Asynchronous media cache with lazy, single-flight initialization.
///
/// Every operation is safe to call before explicit initialization: the first
/// one to need the store opens it (creating the schema if absent), and
/// concurrent first callers await that one in-flight open instead of racing
/// to create the schema twice. SQLite work runs on the blocking pool.
pub struct MediaCache {
    db_path: PathBuf,
    max_payload_bytes: Option<u64>,
    store: OnceCell<Arc<SqliteMediaStore>>,
}

impl MediaCache {
    /// Create a cache handle for the given database path. The backing store
    /// is not opened until first use; `max_payload_bytes`, when set, bounds
    /// the total cached payload size by pruning oldest records after writes.
    pub fn new(db_path: PathBuf, max_payload_bytes: Option<u64>) -> Self {
        Self {
            db_path,
            max_payload_bytes,
            store: OnceCell::new(),
        }
    }

    /// Open the backing store if it is not open yet.
    pub async fn ensure_ready(&self) -> Result<(), StoreError> {
        self.handle().await.map(|_| ())
    }

    /// Get a cached record by media id.
    pub async fn get(&self, id: &str) -> Result<Option<MediaRecord>, StoreError> {
        let store = Arc::clone(self.handle().await?);
        let id = id.to_string();
        tokio::task::spawn_blocking(move || store.get(&id))
            .await
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
    }

    /// Store a record, replacing any existing record with the same id. The
    /// write is durable once this returns.
    pub async fn put(
        &self,
        id: &str,
        payload: Vec<u8>,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError> {
        let store = Arc::clone(self.handle().await?);
        let id = id.to_string();
        let budget = self.max_payload_bytes;
        tokio::task::spawn_blocking(move || {
            store.put(&id, &payload, &metadata)?;
            if let Some(max_bytes) = budget {
                store.prune_to_budget(max_bytes)?;
            }
            Ok(())
        })
        .await
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?
    }

    /// Whether a record exists for the id.
    pub async fn has(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.get(id).await?.is_some())
    }

    /// Remove every cached record.
    pub async fn clear(&self) -> Result<usize, StoreError> {
        let store = Arc::clone(self.handle().await?);
        tokio::task::spawn_blocking(move || store.clear())
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?
    }

    /// Summary statistics for diagnostics.
    pub async fn stats(&self) -> Result<CacheStats, StoreError> {
        let store = Arc::clone(self.handle().await?);
        tokio::task::spawn_blocking(move || store.stats())
            .await
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
    }

    async fn handle(&self) -> Result<&Arc<SqliteMediaStore>, StoreError> {
        self.store
            .get_or_try_init(|| async {
                let path = self.db_path.clone();
                debug!("Opening media cache at {:?}", path);
                let store = tokio::task::spawn_blocking(move || SqliteMediaStore::open(path))
                    .await
                    .map_err(|e| StoreError::OpenFailed(e.to_string()))??;
                Ok(Arc::new(store))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_lazy_init_on_first_operation() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("cache.db");
        let cache = MediaCache::new(db_path.clone(), None);

        assert!(!db_path.exists());
        assert!(cache.get("anything").await.unwrap().is_none());
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_open_failure_is_typed() {
        let dir = tempdir().unwrap();
        // A directory is not a valid database file.
        let cache = MediaCache::new(dir.path().to_path_buf(), None);

        let result = cache.ensure_ready().await;
        assert!(matches!(result, Err(StoreError::OpenFailed(_))));
    }

    #[tokio::test]
    async fn test_concurrent_first_use_initializes_once() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(MediaCache::new(dir.path().join("cache.db"), None));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    cache
                        .put(&format!("vid-{i}"), vec![i as u8], json!({"n": i}))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(cache.stats().await.unwrap().record_count, 8);
    }

    #[tokio::test]
    async fn test_put_get_has_clear() {
        let dir = tempdir().unwrap();
        let cache = MediaCache::new(dir.path().join("cache.db"), None);
        let metadata = json!({"title": "Clip", "url": "https://m/x"});

        assert!(!cache.has("vid-1").await.unwrap());
        cache
            .put("vid-1", b"bytes".to_vec(), metadata.clone())
            .await
            .unwrap();
        assert!(cache.has("vid-1").await.unwrap());

        let record = cache.get("vid-1").await.unwrap().unwrap();
        assert_eq!(record.payload, b"bytes");
        assert_eq!(record.metadata, metadata);

        cache.clear().await.unwrap();
        assert!(cache.get("vid-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_byte_budget_enforced_after_put() {
        let dir = tempdir().unwrap();
        let cache = MediaCache::new(dir.path().join("cache.db"), Some(25));

        for i in 0..5 {
            cache
                .put(&format!("vid-{i}"), vec![0u8; 10], json!({}))
                .await
                .unwrap();
        }

        let stats = cache.stats().await.unwrap();
        assert!(stats.total_payload_bytes <= 25);
        assert!(stats.record_count >= 1);
    }
}
