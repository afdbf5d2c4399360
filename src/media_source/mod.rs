//! External media backend, consumed as a fetch capability.
//!
//! The core is a pass-through consumer of whatever the backend returns: it
//! defines no wire format of its own and never retries automatically.

mod http;

pub use http::HttpMediaSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Descriptive metadata for one media item, as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Location of the binary payload.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Errors from the media backend. The one error class that is not silently
/// absorbed by the loading pipeline: without bytes there is nothing to play.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("media request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("media backend returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid media backend response: {0}")]
    InvalidBody(String),
}

/// Capability for fetching media metadata and payloads.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// List the media items available for review.
    async fn list_media(&self) -> Result<Vec<MediaInfo>, FetchError>;

    /// Fetch descriptive metadata for one media item.
    async fn fetch_metadata(&self, id: &str) -> Result<MediaInfo, FetchError>;

    /// Fetch the binary payload from the location named in the metadata.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
