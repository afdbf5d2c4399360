//! Media buffer decoding via symphonia.

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Errors that can occur while decoding a media buffer.
///
/// All variants are recoverable: the caller renders a flat waveform and
/// playback continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The container has no decodable audio track, or the requested channel
    /// does not exist in the one it has.
    #[error("no audio track available")]
    NoAudioTrack,

    /// The container or codec is not one the decoder understands.
    #[error("unsupported media format: {0}")]
    UnsupportedFormat(String),

    /// The buffer could not be read as coherent media data.
    #[error("corrupt media data: {0}")]
    CorruptData(String),
}

/// PCM samples of a single channel at the file's native sample rate.
pub struct DecodedChannel {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Decode `bytes` and return the PCM samples of `channel`.
///
/// Any container/codec the registered symphonia decoders understand is
/// accepted; the audio track is located by probing, decoded packet by packet
/// and de-interleaved down to the requested channel.
pub fn decode_channel(bytes: &[u8], channel: usize) -> Result<DecodedChannel, DecodeError> {
    let stream = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(map_symphonia)?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
    let declared_channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(map_symphonia)?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut decoded_channels: Option<usize> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::CorruptData(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_buf.is_none() {
                    let spec = *decoded.spec();
                    decoded_channels = Some(spec.channels.count());
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = &mut sample_buf {
                    let channel_count = decoded_channels.unwrap_or(0);
                    buf.copy_interleaved_ref(decoded);
                    if channel < channel_count {
                        samples.extend(
                            buf.samples()
                                .iter()
                                .skip(channel)
                                .step_by(channel_count)
                                .copied(),
                        );
                    }
                }
            }
            // A corrupt packet mid-stream is skipped; the surrounding audio
            // still yields a usable waveform.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(DecodeError::CorruptData(e.to_string())),
        }
    }

    let channel_count = decoded_channels.or(declared_channels).unwrap_or(0);
    if channel_count == 0 || channel >= channel_count {
        return Err(DecodeError::NoAudioTrack);
    }

    Ok(DecodedChannel {
        samples,
        sample_rate,
    })
}

fn map_symphonia(e: SymphoniaError) -> DecodeError {
    match e {
        SymphoniaError::Unsupported(what) => DecodeError::UnsupportedFormat(what.to_string()),
        other => DecodeError::CorruptData(other.to_string()),
    }
}
