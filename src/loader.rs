//! Fetch-or-populate media loading.
//!
//! Composes the cache, the media backend and the waveform extractor: cache
//! hits skip the network entirely; misses fetch, store and extract. Cache
//! faults degrade to direct fetching; decode faults degrade to a flat
//! waveform. Only a fetch failure reaches the caller.

use crate::media_cache::{MediaCache, MediaRecord};
use crate::media_source::{FetchError, MediaSource};
use crate::waveform::{extract_peaks, PeakSeries, WaveformSettings};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

/// Whether a load was served from the cache or from the media backend.
/// Exposed for diagnostics and UX ("loaded from cache").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

/// Everything the playback surface needs for one activated media item.
pub struct LoadedMedia {
    pub record: MediaRecord,
    pub peaks: PeakSeries,
    pub outcome: CacheOutcome,
}

/// Loads media items through the cache, fetching from the backend on miss.
pub struct MediaLoader {
    cache: Arc<MediaCache>,
    source: Arc<dyn MediaSource>,
    settings: WaveformSettings,
    // One async lock per media id so concurrent loads of the same uncached
    // item perform a single fetch instead of N.
    inflight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl MediaLoader {
    pub fn new(
        cache: Arc<MediaCache>,
        source: Arc<dyn MediaSource>,
        settings: WaveformSettings,
    ) -> Self {
        Self {
            cache,
            source,
            settings,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Load a media item: cache first, backend on miss, waveform always.
    pub async fn load(&self, id: &str) -> Result<LoadedMedia, FetchError> {
        let slot = self.inflight_slot(id);
        let guard = slot.lock().await;

        let (record, outcome) = self.fetch_or_populate(id).await?;
        let peaks = self.peaks_for(id, record.payload.clone()).await;

        drop(guard);
        self.release_idle_slots();

        Ok(LoadedMedia {
            record,
            peaks,
            outcome,
        })
    }

    async fn fetch_or_populate(&self, id: &str) -> Result<(MediaRecord, CacheOutcome), FetchError> {
        match self.cache.get(id).await {
            Ok(Some(record)) => {
                debug!("Media {} served from cache", id);
                return Ok((record, CacheOutcome::Hit));
            }
            Ok(None) => {}
            // Read faults are a cache miss, never fatal to the load.
            Err(e) => warn!("Media cache unavailable for {}, fetching directly: {}", id, e),
        }

        let info = self.source.fetch_metadata(id).await?;
        let payload = self.source.fetch_bytes(&info.url).await?;
        let metadata = serde_json::to_value(&info)
            .map_err(|e| FetchError::InvalidBody(e.to_string()))?;
        debug!("Fetched media {} ({} bytes) from backend", id, payload.len());

        if let Err(e) = self
            .cache
            .put(id, payload.clone(), metadata.clone())
            .await
        {
            warn!("Failed to cache media {}, continuing uncached: {}", id, e);
        }

        let record = MediaRecord {
            id: id.to_string(),
            payload,
            metadata,
            cached_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0),
        };
        Ok((record, CacheOutcome::Miss))
    }

    /// Extract peaks on the blocking pool; decode failure degrades to a flat
    /// series so the review session can continue without a waveform.
    async fn peaks_for(&self, id: &str, payload: Vec<u8>) -> PeakSeries {
        let settings = self.settings.clone();
        let bucket_count = settings.bucket_count;
        let extracted =
            tokio::task::spawn_blocking(move || extract_peaks(&payload, &settings)).await;

        match extracted {
            Ok(Ok(peaks)) => peaks,
            Ok(Err(e)) => {
                warn!("Waveform extraction failed for {}, rendering flat: {}", id, e);
                PeakSeries::flat(bucket_count)
            }
            Err(e) => {
                warn!("Waveform extraction panicked for {}, rendering flat: {}", id, e);
                PeakSeries::flat(bucket_count)
            }
        }
    }

    fn inflight_slot(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut slots = self.inflight.lock().unwrap();
        Arc::clone(
            slots
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    fn release_idle_slots(&self) {
        // A slot still held by a waiting loader has more than one reference.
        self.inflight
            .lock()
            .unwrap()
            .retain(|_, slot| Arc::strong_count(slot) > 1);
    }
}
