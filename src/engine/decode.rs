//! Audio decoding
//!
//! Turns encoded input bytes into planar f32 buffers. WAV goes through
//! hound; compressed formats (MP3, AAC/M4A, FLAC, Vorbis, ALAC) go
//! through symphonia. Decoding is a pure transformation and every decoder
//! is `Send + Sync` so inputs can be decoded in parallel.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::engine::buffer::DecodedBuffer;
use crate::error::{MixError, Result};
use crate::mix::{RawAudioInput, Role};

/// Anything that can turn an input into samples
pub trait AudioDecoder: Send + Sync {
    /// Decode one input
    ///
    /// Fails with `MixError::Decode` carrying the input's role when the
    /// bytes are empty or not a parsable audio stream.
    fn decode(&self, input: &RawAudioInput<'_>) -> Result<DecodedBuffer>;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;
}

/// True when the bytes carry a RIFF/WAVE header
pub fn is_riff_wave(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

fn reject_empty(input: &RawAudioInput<'_>) -> Result<()> {
    if input.is_empty() {
        return Err(MixError::decode(input.role, "input contains no bytes"));
    }
    Ok(())
}

// ============================================================================
// WAV (hound)
// ============================================================================

/// Uncompressed WAV decoder backed by hound
///
/// Handles 8/16/24/32-bit integer and 32-bit float PCM.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn decode(&self, input: &RawAudioInput<'_>) -> Result<DecodedBuffer> {
        reject_empty(input)?;
        let role = input.role;

        let reader = WavReader::new(Cursor::new(input.as_bytes()))
            .map_err(|e| MixError::decode_with_source(role, "failed to open WAV data", e))?;

        let spec = reader.spec();
        let channels = spec.channels as usize;
        debug!(
            %role,
            sample_rate = spec.sample_rate,
            channels,
            bits = spec.bits_per_sample,
            "decoding WAV input"
        );

        let interleaved = read_samples_as_f32(reader, role, spec.bits_per_sample, spec.sample_format)?;
        if interleaved.len() < channels {
            return Err(MixError::decode(role, "WAV data contains no samples"));
        }

        DecodedBuffer::from_interleaved(&interleaved, channels, spec.sample_rate)
            .map_err(|e| MixError::decode(role, e.to_string()))
    }

    fn name(&self) -> &'static str {
        "wav"
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    role: Role,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let read_err = |e: hound::Error| MixError::decode_with_source(role, "failed to read WAV samples", e);

    match sample_format {
        // Float WAV may carry overs; keep the buffer within full scale
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v.clamp(-1.0, 1.0)))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(read_err),
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(read_err),
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(read_err),
            // 24-bit stored as i32 in hound
            24 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8388608.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(read_err),
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2147483648.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(read_err),
            other => Err(MixError::decode(
                role,
                format!("{}-bit integer WAV is not supported", other),
            )),
        },
    }
}

// ============================================================================
// Compressed formats (symphonia)
// ============================================================================

/// Probing decoder backed by symphonia
///
/// Format detection works from the bytes alone; no file name hint is
/// needed. Corrupt packets mid-stream are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, input: &RawAudioInput<'_>) -> Result<DecodedBuffer> {
        reject_empty(input)?;
        let role = input.role;

        let source = Cursor::new(input.as_bytes().to_vec());
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| MixError::decode_with_source(role, "unrecognized audio format", e))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| MixError::decode(role, "no audio track found"))?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count());

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| MixError::decode_with_source(role, "unsupported codec", e))?;

        let mut interleaved: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(MixError::decode_with_source(role, "failed to read packet", e));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate.get_or_insert(spec.rate);
                    channels.get_or_insert(spec.channels.count());

                    let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    sample_buf.copy_interleaved_ref(decoded);
                    interleaved.extend(sample_buf.samples().iter().map(|&s| s.clamp(-1.0, 1.0)));
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!(%role, error = e, "skipping corrupt packet");
                }
                Err(e) => {
                    return Err(MixError::decode_with_source(role, "decoder failure", e));
                }
            }
        }

        let (sample_rate, channels) = match (sample_rate, channels) {
            (Some(rate), Some(ch)) if rate > 0 && ch > 0 => (rate, ch),
            _ => return Err(MixError::decode(role, "stream has no sample rate or channel layout")),
        };

        if interleaved.len() < channels {
            return Err(MixError::decode(role, "stream decoded to zero frames"));
        }

        debug!(
            %role,
            sample_rate,
            channels,
            frames = interleaved.len() / channels,
            "decoded compressed input"
        );

        DecodedBuffer::from_interleaved(&interleaved, channels, sample_rate)
            .map_err(|e| MixError::decode(role, e.to_string()))
    }

    fn name(&self) -> &'static str {
        "symphonia"
    }
}

// ============================================================================
// Format sniffing
// ============================================================================

/// Default decoder: routes by magic bytes
///
/// RIFF/WAVE data is read with hound and falls back to symphonia if hound
/// rejects it (e.g. ADPCM payloads). Everything else is probed by
/// symphonia.
#[derive(Debug, Clone, Copy, Default)]
pub struct SniffingDecoder {
    wav: WavDecoder,
    compressed: SymphoniaDecoder,
}

impl SniffingDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioDecoder for SniffingDecoder {
    fn decode(&self, input: &RawAudioInput<'_>) -> Result<DecodedBuffer> {
        reject_empty(input)?;

        if is_riff_wave(input.as_bytes()) {
            match self.wav.decode(input) {
                Ok(buffer) => return Ok(buffer),
                Err(e) => {
                    debug!(role = %input.role, error = %e, "hound rejected WAV, retrying with symphonia");
                }
            }
        }

        self.compressed.decode(input)
    }

    fn name(&self) -> &'static str {
        "sniffing"
    }
}
