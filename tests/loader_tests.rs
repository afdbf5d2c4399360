use async_trait::async_trait;
use framecheck_media::{
    CacheOutcome, FetchError, MediaCache, MediaInfo, MediaLoader, MediaSource, PeakSeries,
    WaveformSettings,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// Test double serving a fixed payload while counting backend calls.
struct CountingSource {
    metadata_calls: AtomicUsize,
    bytes_calls: AtomicUsize,
    payload: Vec<u8>,
    fail: bool,
}

impl CountingSource {
    fn new(payload: Vec<u8>) -> Self {
        Self {
            metadata_calls: AtomicUsize::new(0),
            bytes_calls: AtomicUsize::new(0),
            payload,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl MediaSource for CountingSource {
    async fn list_media(&self) -> Result<Vec<MediaInfo>, FetchError> {
        Ok(Vec::new())
    }

    async fn fetch_metadata(&self, id: &str) -> Result<MediaInfo, FetchError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FetchError::Status {
                status: 500,
                url: format!("http://test/videos/{}", id),
            });
        }
        Ok(MediaInfo {
            id: id.to_string(),
            title: format!("Clip {}", id),
            description: None,
            url: format!("http://test/media/{}", id),
            content_type: Some("video/mp4".to_string()),
        })
    }

    async fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        self.bytes_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FetchError::Status {
                status: 500,
                url: _url.to_string(),
            });
        }
        // Widen the window so concurrent loads genuinely overlap.
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(self.payload.clone())
    }
}

fn loader_with(
    cache: Arc<MediaCache>,
    source: Arc<CountingSource>,
    bucket_count: usize,
) -> MediaLoader {
    MediaLoader::new(
        cache,
        source,
        WaveformSettings {
            bucket_count,
            channel: 0,
        },
    )
}

#[tokio::test]
async fn test_miss_then_hit() {
    let dir = tempdir().unwrap();
    let cache = Arc::new(MediaCache::new(dir.path().join("cache.db"), None));
    let source = Arc::new(CountingSource::new(b"not really media".to_vec()));
    let loader = loader_with(cache, Arc::clone(&source), 100);

    let first = loader.load("vid-1").await.unwrap();
    assert_eq!(first.outcome, CacheOutcome::Miss);
    assert_eq!(first.record.payload, b"not really media");
    assert_eq!(first.record.metadata["title"], json!("Clip vid-1"));

    let second = loader.load("vid-1").await.unwrap();
    assert_eq!(second.outcome, CacheOutcome::Hit);
    assert_eq!(second.record.payload, b"not really media");

    assert_eq!(source.metadata_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.bytes_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_loads_fetch_once() {
    let dir = tempdir().unwrap();
    let cache = Arc::new(MediaCache::new(dir.path().join("cache.db"), None));
    let source = Arc::new(CountingSource::new(vec![7u8; 64]));
    let loader = Arc::new(loader_with(cache, Arc::clone(&source), 100));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.load("vid-1").await })
        })
        .collect();

    let mut misses = 0;
    for task in tasks {
        let loaded = task.await.unwrap().unwrap();
        assert_eq!(loaded.record.payload, vec![7u8; 64]);
        if loaded.outcome == CacheOutcome::Miss {
            misses += 1;
        }
    }

    assert_eq!(source.bytes_calls.load(Ordering::SeqCst), 1);
    assert_eq!(misses, 1);
}

#[tokio::test]
async fn test_backend_failure_reaches_caller() {
    let dir = tempdir().unwrap();
    let cache = Arc::new(MediaCache::new(dir.path().join("cache.db"), None));
    let loader = loader_with(cache, Arc::new(CountingSource::failing()), 100);

    let result = loader.load("vid-1").await;

    assert!(matches!(result, Err(FetchError::Status { status: 500, .. })));
}

#[tokio::test]
async fn test_unusable_cache_degrades_to_direct_fetch() {
    let dir = tempdir().unwrap();
    // The path is a directory, so the store can never open.
    let cache = Arc::new(MediaCache::new(dir.path().to_path_buf(), None));
    let source = Arc::new(CountingSource::new(b"payload".to_vec()));
    let loader = loader_with(cache, Arc::clone(&source), 100);

    let first = loader.load("vid-1").await.unwrap();
    let second = loader.load("vid-1").await.unwrap();

    assert_eq!(first.outcome, CacheOutcome::Miss);
    assert_eq!(second.outcome, CacheOutcome::Miss);
    assert_eq!(second.record.payload, b"payload");
    // Nothing can be cached, so every load goes to the backend.
    assert_eq!(source.bytes_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_undecodable_payload_renders_flat() {
    let dir = tempdir().unwrap();
    let cache = Arc::new(MediaCache::new(dir.path().join("cache.db"), None));
    let source = Arc::new(CountingSource::new(vec![0xAB; 512]));
    let loader = loader_with(cache, source, 100);

    let loaded = loader.load("vid-1").await.unwrap();

    assert_eq!(loaded.peaks.samples(), PeakSeries::flat(100).samples());
}
