//! Decoded Audio Buffers
//!
//! Provides the planar floating-point buffer every decoder produces and
//! the renderer consumes. Samples are normalized to [-1.0, 1.0].

use crate::engine::resample::{resample_channels_to_len, resampled_len};
use crate::error::{MixError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Channel count of every rendered mix
pub const OUTPUT_CHANNELS: usize = 2;

/// Default rendering sample rate (44.1kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Calculate the peak absolute sample value across all channels
pub fn calculate_peak(buffer: &DecodedBuffer) -> f32 {
    buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max)
}

// ============================================================================
// Decoded Buffer
// ============================================================================

/// Planar audio decoded from one input
///
/// Each channel is a separate Vec<f32>; all channels have equal length.
///
/// # Example
/// ```
/// use podmix::engine::buffer::DecodedBuffer;
///
/// // One second of stereo silence at 44.1kHz
/// let buffer = DecodedBuffer::silence(2, 44100, 44100);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 44100);
/// assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedBuffer {
    /// Create a buffer from planar channel data
    ///
    /// Fails if there are no channels, the sample rate is zero or the
    /// channels differ in length.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(MixError::InvalidInputs {
                reason: "buffer must have at least one channel".to_string(),
            });
        }
        if sample_rate == 0 {
            return Err(MixError::InvalidInputs {
                reason: "buffer sample rate must be non-zero".to_string(),
            });
        }

        let len = samples[0].len();
        if let Some(ch) = samples.iter().position(|c| c.len() != len) {
            return Err(MixError::InvalidInputs {
                reason: format!(
                    "channel {} has {} samples, expected {}",
                    ch,
                    samples[ch].len(),
                    len
                ),
            });
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a zeroed buffer
    pub fn silence(channels: usize, num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; channels.max(1)],
            sample_rate,
        }
    }

    /// Create a buffer from interleaved sample data
    ///
    /// Trailing samples that do not fill a whole frame are dropped.
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(MixError::InvalidInputs {
                reason: "interleaved data must have at least one channel".to_string(),
            });
        }

        let num_samples = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(num_samples); channels];

        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Self::from_channels(samples, sample_rate)
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ... for stereo)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channels() * self.len());

        for sample_idx in 0..self.len() {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    /// Check if the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds (`len / sample_rate`)
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get an immutable reference to a channel's samples
    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        &self.samples[ch]
    }

    /// Get a mutable reference to a channel's samples
    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        &mut self.samples[ch]
    }

    /// Up- or down-mix to two channels
    ///
    /// Mono is duplicated to both sides. Stereo is returned unchanged.
    /// Wider layouts fold even-indexed channels to the left and
    /// odd-indexed channels to the right, averaging each side.
    pub fn to_stereo(&self) -> DecodedBuffer {
        let samples = match self.channels() {
            0 => vec![Vec::new(), Vec::new()],
            1 => vec![self.samples[0].clone(), self.samples[0].clone()],
            2 => self.samples.clone(),
            n => {
                let left_count = n.div_ceil(2) as f32;
                let right_count = (n / 2) as f32;
                let mut left = vec![0.0_f32; self.len()];
                let mut right = vec![0.0_f32; self.len()];

                for (ch, channel) in self.samples.iter().enumerate() {
                    let side = if ch % 2 == 0 { &mut left } else { &mut right };
                    for (out, &s) in side.iter_mut().zip(channel) {
                        *out += s;
                    }
                }
                left.iter_mut().for_each(|s| *s /= left_count);
                right.iter_mut().for_each(|s| *s /= right_count);

                vec![left, right]
            }
        };

        DecodedBuffer {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Resample to a target rate, returning self unchanged when rates match
    pub fn resampled(self, target_rate: u32) -> DecodedBuffer {
        let target_len = resampled_len(self.len(), self.sample_rate, target_rate);
        self.resampled_to_len(target_rate, target_len)
    }

    /// Resample to a target rate with an exact output length
    ///
    /// The timeline uses this so segment lengths follow cumulative
    /// boundaries instead of rounding each segment on its own.
    pub fn resampled_to_len(self, target_rate: u32, target_len: usize) -> DecodedBuffer {
        if self.sample_rate == target_rate && self.len() == target_len {
            return self;
        }

        DecodedBuffer {
            samples: resample_channels_to_len(&self.samples, self.sample_rate, target_rate, target_len),
            sample_rate: target_rate,
        }
    }
}

// ============================================================================
// Test signals
// ============================================================================

/// Generate a sine tone
///
/// Useful for exercising the pipeline without audio files.
pub fn generate_test_tone(
    frequency: f32,
    duration_secs: f32,
    sample_rate: u32,
    channels: usize,
) -> DecodedBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    let tone: Vec<f32> = (0..num_samples)
        .map(|i| (angular_freq * i as f32).sin())
        .collect();

    DecodedBuffer {
        samples: vec![tone; channels.max(1)],
        sample_rate,
    }
}

/// Generate a full-scale square wave alternating between +1.0 and -1.0
pub fn generate_square_wave(
    frequency: f32,
    duration_secs: f32,
    sample_rate: u32,
    channels: usize,
) -> DecodedBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let half_period = (sample_rate as f32 / frequency / 2.0).max(1.0) as usize;
    let wave: Vec<f32> = (0..num_samples)
        .map(|i| if (i / half_period) % 2 == 0 { 1.0 } else { -1.0 })
        .collect();

    DecodedBuffer {
        samples: vec![wave; channels.max(1)],
        sample_rate,
    }
}
