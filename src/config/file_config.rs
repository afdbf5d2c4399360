//! Optional TOML configuration file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Values loaded from a TOML config file. Every field is optional; values
/// present here override the corresponding CLI flags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub cache_db: Option<String>,
    pub source_url: Option<String>,
    pub request_timeout_sec: Option<u64>,
    pub waveform_buckets: Option<usize>,
    pub waveform_channel: Option<usize>,
    pub max_cache_bytes: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse config file {:?}", path))
    }
}
