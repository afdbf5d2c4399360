//! Peak reduction of a PCM sample stream.

use serde::Serialize;

/// Fixed-length reduction of an audio channel: one amplitude peak per
/// time-bucket, each in `[0, 1]`.
///
/// Derived data, recomputed whenever a media item is activated; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakSeries {
    samples: Vec<f32>,
}

impl PeakSeries {
    /// An all-zero series, the caller-visible fallback when decoding fails.
    pub fn flat(bucket_count: usize) -> Self {
        Self {
            samples: vec![0.0; bucket_count],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Partition `samples` into `bucket_count` contiguous equal-width buckets and
/// take the maximum absolute value of each.
///
/// Bucket width is `floor(len / bucket_count)`; remainder samples past the
/// last full bucket are dropped, not redistributed. Peak detection (not RMS)
/// keeps transient spikes visible. Inputs shorter than `bucket_count` yield
/// an all-zero series of the requested length.
pub fn reduce_peaks(samples: &[f32], bucket_count: usize) -> PeakSeries {
    if bucket_count == 0 {
        return PeakSeries {
            samples: Vec::new(),
        };
    }
    let bucket_width = samples.len() / bucket_count;
    if bucket_width == 0 {
        return PeakSeries::flat(bucket_count);
    }

    let mut peaks = Vec::with_capacity(bucket_count);
    for bucket in 0..bucket_count {
        let start = bucket * bucket_width;
        let peak = samples[start..start + bucket_width]
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        peaks.push(peak.min(1.0));
    }

    PeakSeries { samples: peaks }
}
