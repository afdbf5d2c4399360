//! Media cache data models.

use serde::{Deserialize, Serialize};

/// A cached media item.
///
/// Created on first successful fetch and immutable thereafter; a re-save with
/// the same id replaces the whole record (last-writer-wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: String,
    /// The fetched media bytes, stored verbatim.
    pub payload: Vec<u8>,
    /// Descriptive fields (title, source URL, content type). Opaque to the
    /// cache; round-tripped unchanged.
    pub metadata: serde_json::Value,
    /// Unix seconds at insertion. Diagnostic, except when a byte budget is
    /// configured, in which case the oldest records are pruned first.
    pub cached_at: i64,
}

/// Summary statistics for the cache database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub record_count: usize,
    pub total_payload_bytes: u64,
}
