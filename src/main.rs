use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use framecheck_media::config;
use framecheck_media::{
    extract_peaks, CacheOutcome, HttpMediaSource, MediaCache, MediaLoader, MediaSource, PeakSeries,
    WaveformSettings,
};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite media cache database. Can also be specified in config file.
    #[clap(long, value_parser = parse_path)]
    pub cache_db: Option<PathBuf>,

    /// Base URL of the media backend (e.g. http://localhost:3000/api).
    #[clap(long)]
    pub source_url: Option<String>,

    /// Timeout in seconds for media backend requests.
    #[clap(long, default_value_t = 30)]
    pub request_timeout_sec: u64,

    /// Number of peak buckets per waveform.
    #[clap(long, default_value_t = 1000)]
    pub waveform_buckets: usize,

    /// Zero-based audio channel to extract peaks from.
    #[clap(long, default_value_t = 0)]
    pub waveform_channel: usize,

    /// Maximum total payload bytes to keep cached. Unset disables eviction.
    #[clap(long)]
    pub max_cache_bytes: Option<u64>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract waveform peaks from a local media file.
    Peaks {
        /// Path to the media file to decode.
        #[clap(value_parser = parse_path)]
        file: PathBuf,

        /// Print the full peak series as JSON instead of a summary.
        #[clap(long)]
        json: bool,
    },
    /// List the media items available from the backend.
    List,
    /// Fetch a media item through the cache and extract its waveform.
    Fetch {
        /// Id of the media item to fetch.
        id: String,
    },
    /// Print cache statistics.
    Stats,
    /// Remove all cached media records.
    Clear,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            cache_db: args.cache_db.clone(),
            source_url: args.source_url.clone(),
            request_timeout_sec: args.request_timeout_sec,
            waveform_buckets: args.waveform_buckets,
            waveform_channel: args.waveform_channel,
            max_cache_bytes: args.max_cache_bytes,
        }
    }
}

/// Extraction never fails the command: an undecodable file is reported and
/// summarized as a flat series, the same fallback playback uses.
fn peaks_or_flat(bytes: &[u8], settings: &WaveformSettings) -> PeakSeries {
    match extract_peaks(bytes, settings) {
        Ok(peaks) => peaks,
        Err(e) => {
            warn!("Waveform extraction failed, rendering flat: {}", e);
            PeakSeries::flat(settings.bucket_count)
        }
    }
}

fn print_peak_summary(peaks: &PeakSeries) {
    let max = peaks
        .samples()
        .iter()
        .fold(0.0f32, |acc, s| acc.max(*s));
    let mean = if peaks.is_empty() {
        0.0
    } else {
        peaks.samples().iter().sum::<f32>() / peaks.len() as f32
    };
    println!("buckets: {}", peaks.len());
    println!("peak max: {:.4}", max);
    println!("peak mean: {:.4}", mean);
}

fn cache_for(app_config: &config::AppConfig) -> Result<Arc<MediaCache>> {
    let db_path = app_config
        .cache_db
        .clone()
        .context("--cache-db is required for this command")?;
    Ok(Arc::new(MediaCache::new(
        db_path,
        app_config.max_cache_bytes,
    )))
}

fn source_for(app_config: &config::AppConfig) -> Result<Arc<HttpMediaSource>> {
    let base_url = app_config
        .source_url
        .clone()
        .context("--source-url is required for this command")?;
    Ok(Arc::new(HttpMediaSource::new(
        base_url,
        app_config.request_timeout_sec,
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    match cli_args.command {
        Command::Peaks { file, json } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read media file {:?}", file))?;
            let peaks = peaks_or_flat(&bytes, &app_config.waveform);
            if json {
                println!("{}", serde_json::to_string(&peaks)?);
            } else {
                print_peak_summary(&peaks);
            }
        }
        Command::List => {
            let source = source_for(&app_config)?;
            let items = source.list_media().await?;
            if items.is_empty() {
                println!("No media items available");
            }
            for item in items {
                println!("{}  {}", item.id, item.title);
            }
        }
        Command::Fetch { id } => {
            let cache = cache_for(&app_config)?;
            let source = source_for(&app_config)?;
            let loader = MediaLoader::new(cache, source, app_config.waveform.clone());
            let loaded = loader.load(&id).await?;
            let outcome = match loaded.outcome {
                CacheOutcome::Hit => "cache hit",
                CacheOutcome::Miss => "cache miss",
            };
            println!("{} ({}, {} bytes)", id, outcome, loaded.record.payload.len());
            print_peak_summary(&loaded.peaks);
        }
        Command::Stats => {
            let cache = cache_for(&app_config)?;
            let stats = cache.stats().await?;
            println!("records: {}", stats.record_count);
            println!("payload bytes: {}", stats.total_payload_bytes);
        }
        Command::Clear => {
            let cache = cache_for(&app_config)?;
            let removed = cache.clear().await?;
            println!("Removed {} cached record(s)", removed);
        }
    }

    Ok(())
}
