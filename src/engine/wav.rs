//! Canonical WAV encoding
//!
//! Writes the classic 44-byte RIFF/WAVE header followed by interleaved
//! 16-bit signed little-endian PCM. The layout is fixed:
//!
//! ```text
//! offset  size  field
//! 0       4     "RIFF"
//! 4       4     36 + data size
//! 8       4     "WAVE"
//! 12      4     "fmt "
//! 16      4     16
//! 20      2     1 (PCM)
//! 22      2     channels
//! 24      4     sample rate
//! 28      4     byte rate (rate * channels * 2)
//! 32      2     block align (channels * 2)
//! 34      2     16 bits per sample
//! 36      4     "data"
//! 40      4     data size (frames * channels * 2)
//! 44      ...   samples
//! ```

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::engine::buffer::DecodedBuffer;
use crate::error::{MixError, Result};
use crate::mix::MergedWaveform;

/// Size of the canonical header in bytes
pub const WAV_HEADER_LEN: usize = 44;

/// MIME type of encoded output
pub const WAV_MIME_TYPE: &str = "audio/wav";

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;
const PCM_FORMAT_TAG: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Fields of a canonical 16-bit PCM WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Header for `frames` frames of `channels`-channel 16-bit audio
    ///
    /// # Errors
    /// * `EncodingOverflow` - the RIFF size fields cannot hold the payload
    pub fn pcm16(channels: usize, sample_rate: u32, frames: usize) -> Result<Self> {
        let overflow = || MixError::EncodingOverflow { frames, channels };

        let channels_u16 = u16::try_from(channels).map_err(|_| overflow())?;
        let data_size = (frames as u64)
            .checked_mul(channels as u64 * BYTES_PER_SAMPLE as u64)
            .filter(|size| *size <= (u32::MAX - 36) as u64)
            .ok_or_else(overflow)? as u32;
        let block_align = channels_u16.checked_mul(BYTES_PER_SAMPLE as u16).ok_or_else(overflow)?;
        let byte_rate = sample_rate
            .checked_mul(block_align as u32)
            .ok_or_else(overflow)?;

        Ok(Self {
            channels: channels_u16,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            data_size,
        })
    }

    /// Number of frames the data chunk holds
    pub fn frames(&self) -> usize {
        if self.block_align == 0 {
            return 0;
        }
        self.data_size as usize / self.block_align as usize
    }

    /// Total file length this header describes
    pub fn file_len(&self) -> usize {
        WAV_HEADER_LEN + self.data_size as usize
    }

    /// Append the 44 header bytes to `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + self.data_size).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
        out.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.byte_rate.to_le_bytes());
        out.extend_from_slice(&self.block_align.to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&self.data_size.to_le_bytes());
    }

    /// Parse a canonical header from the start of `bytes`
    ///
    /// Only the exact layout this module writes is accepted.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let invalid = |reason: &str| MixError::InvalidWav {
            reason: reason.to_string(),
        };

        if bytes.len() < WAV_HEADER_LEN {
            return Err(invalid("shorter than a 44-byte header"));
        }

        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at =
            |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(invalid("missing RIFF/WAVE signature"));
        }
        if &bytes[12..16] != b"fmt " || u32_at(16) != FMT_CHUNK_LEN {
            return Err(invalid("fmt chunk is not a 16-byte PCM chunk"));
        }
        if u16_at(20) != PCM_FORMAT_TAG {
            return Err(invalid("audio format is not integer PCM"));
        }
        if &bytes[36..40] != b"data" {
            return Err(invalid("data chunk does not follow fmt chunk"));
        }

        let header = Self {
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        };

        if header.bits_per_sample != BITS_PER_SAMPLE {
            return Err(MixError::InvalidWav {
                reason: format!("{}-bit samples, expected 16", header.bits_per_sample),
            });
        }
        if header.channels == 0 || header.block_align as u32 != header.channels as u32 * 2 {
            return Err(invalid("block align does not match channel count"));
        }
        if header.byte_rate as u64 != header.sample_rate as u64 * header.block_align as u64 {
            return Err(invalid("byte rate does not match sample rate"));
        }
        if u32_at(4) as u64 != 36 + header.data_size as u64 {
            return Err(invalid("RIFF size does not match data size"));
        }

        Ok(header)
    }
}

/// Convert one float sample to 16-bit PCM
///
/// Clamps to [-1, 1]; negatives scale by 32768, non-negatives by 32767,
/// then truncate toward zero.
#[inline]
pub fn sample_to_pcm16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// A finished WAV file held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudio {
    bytes: Vec<u8>,
    header: WavHeader,
}

impl EncodedAudio {
    /// The complete file contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Always `audio/wav`
    pub fn mime_type(&self) -> &'static str {
        WAV_MIME_TYPE
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.header.sample_rate == 0 {
            return 0.0;
        }
        self.header.frames() as f64 / self.header.sample_rate as f64
    }

    /// Hex SHA-256 of the file contents
    pub fn sha256_hex(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest.iter() {
            let _ = write!(hex, "{:02x}", byte);
        }
        hex
    }

    /// Download name of the form `podcast-<unix millis>.wav`
    pub fn suggested_file_name(timestamp: DateTime<Utc>) -> String {
        format!("podcast-{}.wav", timestamp.timestamp_millis())
    }

    /// Write the file to disk
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        debug!(path = %path.display(), bytes = self.bytes.len(), "wrote WAV file");
        Ok(())
    }
}

/// Encode a rendered mix
pub fn encode(waveform: &MergedWaveform) -> Result<EncodedAudio> {
    encode_buffer(waveform.as_buffer())
}

/// Encode any decoded buffer as 16-bit PCM WAV
///
/// # Errors
/// * `EncodingOverflow` - more sample data than a WAV file can address
pub fn encode_buffer(buffer: &DecodedBuffer) -> Result<EncodedAudio> {
    let frames = buffer.len();
    let header = WavHeader::pcm16(buffer.channels(), buffer.sample_rate, frames)?;

    let mut bytes = Vec::with_capacity(header.file_len());
    header.write_to(&mut bytes);

    for sample in buffer.to_interleaved() {
        bytes.extend_from_slice(&sample_to_pcm16(sample).to_le_bytes());
    }

    debug!(
        frames,
        channels = header.channels,
        sample_rate = header.sample_rate,
        bytes = bytes.len(),
        "encoded WAV"
    );

    Ok(EncodedAudio { bytes, header })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Cursor;

    #[test]
    fn test_sample_conversion() {
        assert_eq!(sample_to_pcm16(0.0), 0);
        assert_eq!(sample_to_pcm16(1.0), 32767);
        assert_eq!(sample_to_pcm16(-1.0), -32768);
        assert_eq!(sample_to_pcm16(2.5), 32767);
        assert_eq!(sample_to_pcm16(-3.0), -32768);
        assert_eq!(sample_to_pcm16(0.5), 16383);
        assert_eq!(sample_to_pcm16(-0.5), -16384);
        // truncation toward zero
        assert_eq!(sample_to_pcm16(-0.00002), 0);
    }

    #[test]
    fn test_header_bytes() {
        let buffer = DecodedBuffer::silence(2, 10, 44100);
        let encoded = encode_buffer(&buffer).unwrap();
        let b = encoded.as_bytes();

        assert_eq!(&b[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([b[4], b[5], b[6], b[7]]), 36 + 40);
        assert_eq!(&b[8..16], b"WAVEfmt ");
        assert_eq!(&b[16..20], &16u32.to_le_bytes());
        assert_eq!(&b[20..22], &1u16.to_le_bytes());
        assert_eq!(&b[22..24], &2u16.to_le_bytes());
        assert_eq!(&b[24..28], &44100u32.to_le_bytes());
        assert_eq!(&b[28..32], &176400u32.to_le_bytes());
        assert_eq!(&b[32..34], &4u16.to_le_bytes());
        assert_eq!(&b[34..36], &16u16.to_le_bytes());
        assert_eq!(&b[36..40], b"data");
        assert_eq!(&b[40..44], &40u32.to_le_bytes());
        assert_eq!(b.len(), 84);
    }

    #[test]
    fn test_samples_are_interleaved() {
        let buffer =
            DecodedBuffer::from_channels(vec![vec![1.0, -1.0], vec![0.0, 0.5]], 8000).unwrap();
        let encoded = encode_buffer(&buffer).unwrap();
        let pcm: Vec<i16> = encoded.as_bytes()[WAV_HEADER_LEN..]
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();

        assert_eq!(pcm, vec![32767, 0, -32768, 16383]);
    }

    #[test]
    fn test_header_parse_roundtrip() {
        let buffer = DecodedBuffer::silence(2, 100, 48000);
        let encoded = encode_buffer(&buffer).unwrap();
        let parsed = WavHeader::parse(encoded.as_bytes()).unwrap();

        assert_eq!(&parsed, encoded.header());
        assert_eq!(parsed.sample_rate, 48000);
        assert_eq!(parsed.channels, 2);
        assert_eq!(parsed.data_size, 400);
        assert_eq!(parsed.frames(), 100);
    }

    #[test]
    fn test_parse_rejects_short_and_foreign_data() {
        assert!(WavHeader::parse(b"RIFF").is_err());
        assert!(WavHeader::parse(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_parse_rejects_float_wav() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let spec = hound::WavSpec {
                channels: 1,
                sample_rate: 8000,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            };
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(0.5_f32).unwrap();
            writer.finalize().unwrap();
        }
        assert!(WavHeader::parse(&cursor.into_inner()).is_err());
    }

    #[test]
    fn test_hound_reads_encoded_output() {
        let buffer =
            DecodedBuffer::from_channels(vec![vec![0.25; 32], vec![-0.25; 32]], 22050).unwrap();
        let encoded = encode_buffer(&buffer).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(encoded.as_bytes())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 64);
        assert_eq!(samples[0], 8191);
        assert_eq!(samples[1], -8192);
    }

    #[test]
    fn test_overflow_detected() {
        let err = WavHeader::pcm16(2, 44100, usize::MAX / 4).unwrap_err();
        assert!(matches!(err, MixError::EncodingOverflow { .. }));

        // Largest frame count whose data chunk still fits
        let max_frames = (u32::MAX as usize - 36) / 4;
        assert!(WavHeader::pcm16(2, 44100, max_frames).is_ok());
        assert!(WavHeader::pcm16(2, 44100, max_frames + 1).is_err());
    }

    #[test]
    fn test_encoded_metadata() {
        let buffer = DecodedBuffer::silence(2, 44100, 44100);
        let encoded = encode_buffer(&buffer).unwrap();

        assert_eq!(encoded.mime_type(), "audio/wav");
        assert!((encoded.duration_secs() - 1.0).abs() < 1e-9);
        assert_eq!(encoded.sha256_hex().len(), 64);

        let ts = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            EncodedAudio::suggested_file_name(ts),
            "podcast-1700000000123.wav"
        );
    }
}
