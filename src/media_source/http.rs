//! HTTP implementation of the media source capability.

use super::{FetchError, MediaInfo, MediaSource};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the media backend.
pub struct HttpMediaSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMediaSource {
    /// Create a new media source client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the media backend (e.g., "http://localhost:3000/api")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    async fn get_checked(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    async fn list_media(&self) -> Result<Vec<MediaInfo>, FetchError> {
        let url = format!("{}/videos", self.base_url);
        self.get_checked(&url)
            .await?
            .json()
            .await
            .map_err(|e| FetchError::InvalidBody(e.to_string()))
    }

    async fn fetch_metadata(&self, id: &str) -> Result<MediaInfo, FetchError> {
        let url = format!("{}/videos/{}", self.base_url, id);
        self.get_checked(&url)
            .await?
            .json()
            .await
            .map_err(|e| FetchError::InvalidBody(e.to_string()))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self.get_checked(url).await?.bytes().await?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
