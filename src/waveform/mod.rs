//! Waveform extraction.
//!
//! Decodes an encoded media buffer to PCM and reduces one channel to a
//! fixed-length sequence of amplitude peaks for rendering, plus the pure
//! pixel/time mapping used by the playhead and click-to-seek.

mod decode;
mod peaks;
mod timeline;

pub use decode::{decode_channel, DecodeError, DecodedChannel};
pub use peaks::{reduce_peaks, PeakSeries};
pub use timeline::{time_to_x, x_to_time, PlaybackCursor};

/// Extraction settings. Read-only after startup.
#[derive(Debug, Clone)]
pub struct WaveformSettings {
    /// Number of peaks produced for any decodable input, i.e. the number of
    /// bars the rendering surface draws.
    pub bucket_count: usize,
    /// Audio channel to reduce. Only this single channel contributes to the
    /// waveform; stereo/surround content loses separate-channel detail.
    pub channel: usize,
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self {
            bucket_count: 1000,
            channel: 0,
        }
    }
}

/// Decode `bytes` and reduce the configured channel to
/// `settings.bucket_count` peaks in `[0, 1]`.
///
/// An input with fewer samples than buckets yields an all-zero series of the
/// configured length. Callers should treat a [`DecodeError`] as "render a
/// flat waveform" (see [`PeakSeries::flat`]), never as fatal to playback.
pub fn extract_peaks(
    bytes: &[u8],
    settings: &WaveformSettings,
) -> Result<PeakSeries, DecodeError> {
    let audio = decode_channel(bytes, settings.channel)?;
    Ok(reduce_peaks(&audio.samples, settings.bucket_count))
}
