//! Gain envelopes
//!
//! Closed-form linear fades applied per segment. Positions are frame
//! offsets relative to the segment start. Before the window the gain is
//! `start_gain`, from the window end onward it is `end_gain`, and in
//! between it is linearly interpolated.

use serde::{Deserialize, Serialize};

/// Linear gain ramp over a window of frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainEnvelope {
    pub start_gain: f32,
    pub end_gain: f32,
    /// First frame of the ramp
    pub window_start: usize,
    /// Frame at which `end_gain` is reached
    pub window_end: usize,
}

impl GainEnvelope {
    /// Unity gain until `len - fade`, then ramp to silence at `len`
    ///
    /// A fade longer than the segment starts at frame 0.
    pub fn fade_out(segment_len: usize, fade_len: usize) -> Self {
        Self {
            start_gain: 1.0,
            end_gain: 0.0,
            window_start: segment_len.saturating_sub(fade_len),
            window_end: segment_len,
        }
    }

    /// Silence at frame 0, ramp to unity at `fade`, unity afterward
    ///
    /// A fade longer than the segment ends at the segment end.
    pub fn fade_in(segment_len: usize, fade_len: usize) -> Self {
        Self {
            start_gain: 0.0,
            end_gain: 1.0,
            window_start: 0,
            window_end: fade_len.min(segment_len),
        }
    }

    /// Length of the ramp in frames
    pub fn window_len(&self) -> usize {
        self.window_end.saturating_sub(self.window_start)
    }

    /// Gain at a frame offset within the segment
    pub fn gain_at(&self, frame: usize) -> f32 {
        if frame >= self.window_end {
            return self.end_gain;
        }
        if frame <= self.window_start {
            return self.start_gain;
        }

        let progress = (frame - self.window_start) as f64 / self.window_len() as f64;
        (self.start_gain as f64 + (self.end_gain - self.start_gain) as f64 * progress) as f32
    }

    /// Multiply `samples` (frames `offset..offset + samples.len()`) by the
    /// envelope
    pub fn apply(&self, samples: &mut [f32], offset: usize) {
        for (i, sample) in samples.iter_mut().enumerate() {
            *sample *= self.gain_at(offset + i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fade_out_boundaries() {
        let env = GainEnvelope::fade_out(1000, 200);

        assert_eq!(env.window_start, 800);
        assert_relative_eq!(env.gain_at(0), 1.0);
        assert_relative_eq!(env.gain_at(800), 1.0);
        assert_relative_eq!(env.gain_at(900), 0.5);
        assert_relative_eq!(env.gain_at(1000), 0.0);
    }

    #[test]
    fn test_fade_in_boundaries() {
        let env = GainEnvelope::fade_in(1000, 200);

        assert_relative_eq!(env.gain_at(0), 0.0);
        assert_relative_eq!(env.gain_at(100), 0.5);
        assert_relative_eq!(env.gain_at(200), 1.0);
        assert_relative_eq!(env.gain_at(999), 1.0);
    }

    #[test]
    fn test_long_fade_out_clamps_to_segment_start() {
        let env = GainEnvelope::fade_out(100, 500);

        assert_eq!(env.window_start, 0);
        assert_eq!(env.window_end, 100);
        assert_relative_eq!(env.gain_at(0), 1.0);
        assert_relative_eq!(env.gain_at(50), 0.5);
    }

    #[test]
    fn test_long_fade_in_clamps_to_segment_end() {
        let env = GainEnvelope::fade_in(100, 500);

        assert_eq!(env.window_end, 100);
        assert_relative_eq!(env.gain_at(50), 0.5);
        assert_relative_eq!(env.gain_at(100), 1.0);
    }

    #[test]
    fn test_zero_length_fades_are_unity() {
        let out = GainEnvelope::fade_out(10, 0);
        let inn = GainEnvelope::fade_in(10, 0);

        for frame in 0..10 {
            assert_relative_eq!(out.gain_at(frame), 1.0);
            assert_relative_eq!(inn.gain_at(frame), 1.0);
        }
    }

    #[test]
    fn test_monotonic() {
        let out = GainEnvelope::fade_out(500, 300);
        let inn = GainEnvelope::fade_in(500, 300);

        for frame in 1..=500 {
            assert!(out.gain_at(frame) <= out.gain_at(frame - 1));
            assert!(inn.gain_at(frame) >= inn.gain_at(frame - 1));
        }
    }

    #[test]
    fn test_apply_with_offset() {
        let env = GainEnvelope::fade_in(4, 4);
        let mut samples = vec![1.0; 2];
        env.apply(&mut samples, 2);

        assert_relative_eq!(samples[0], 0.5);
        assert_relative_eq!(samples[1], 0.75);
    }
}
