//! Framecheck Media Library
//!
//! Media-processing and caching subsystem of the framecheck video review
//! tool: waveform peak extraction from encoded media buffers, and a durable
//! local cache of fetched media payloads keyed by media id.

pub mod config;
pub mod loader;
pub mod media_cache;
pub mod media_source;
pub mod sqlite_persistence;
pub mod waveform;

// Re-export commonly used types for convenience
pub use loader::{CacheOutcome, LoadedMedia, MediaLoader};
pub use media_cache::{CacheStats, MediaCache, MediaRecord, StoreError};
pub use media_source::{FetchError, HttpMediaSource, MediaInfo, MediaSource};
pub use waveform::{extract_peaks, DecodeError, PeakSeries, WaveformSettings};
