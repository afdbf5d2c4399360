//! Layered configuration: CLI flags plus an optional TOML file.

mod file_config;

pub use file_config::FileConfig;

use crate::waveform::WaveformSettings;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that participate in config resolution. Mirrors the flags
/// that can be overridden by the TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub cache_db: Option<PathBuf>,
    pub source_url: Option<String>,
    pub request_timeout_sec: u64,
    pub waveform_buckets: usize,
    pub waveform_channel: usize,
    pub max_cache_bytes: Option<u64>,
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the SQLite cache database. Commands that only do offline
    /// extraction run without one.
    pub cache_db: Option<PathBuf>,
    pub source_url: Option<String>,
    pub request_timeout_sec: u64,
    pub waveform: WaveformSettings,
    pub max_cache_bytes: Option<u64>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let cache_db = file
            .cache_db
            .map(PathBuf::from)
            .or_else(|| cli.cache_db.clone());

        let source_url = file.source_url.or_else(|| cli.source_url.clone());

        let request_timeout_sec = file.request_timeout_sec.unwrap_or(cli.request_timeout_sec);
        if request_timeout_sec == 0 {
            bail!("request_timeout_sec must be positive");
        }

        let bucket_count = file.waveform_buckets.unwrap_or(cli.waveform_buckets);
        if bucket_count == 0 {
            bail!("waveform_buckets must be positive");
        }
        let channel = file.waveform_channel.unwrap_or(cli.waveform_channel);

        let max_cache_bytes = file.max_cache_bytes.or(cli.max_cache_bytes);

        Ok(Self {
            cache_db,
            source_url,
            request_timeout_sec,
            waveform: WaveformSettings {
                bucket_count,
                channel,
            },
            max_cache_bytes,
        })
    }
}
