//! Timeline rendering
//!
//! Decoded inputs are laid end to end on one stereo timeline at the
//! render context's rate. Segment `i` starts where segment `i - 1` ends;
//! an intro fades out over its tail and an outro fades in over its head.
//!
//! Segment boundaries are rounded from the running total of source
//! durations, so the rendered length stays within half a frame of the
//! summed input durations however many inputs are resampled.

use tracing::debug;

use crate::engine::buffer::{DecodedBuffer, OUTPUT_CHANNELS};
use crate::engine::context::RenderContext;
use crate::error::{MixError, Result};
use crate::mix::envelope::GainEnvelope;
use crate::mix::input::Role;

/// One decoded input placed on the timeline
#[derive(Debug, Clone)]
pub struct Segment {
    pub role: Role,
    /// Stereo samples at the timeline rate
    pub buffer: DecodedBuffer,
    /// First frame of this segment on the timeline
    pub start_frame: usize,
    pub envelope: Option<GainEnvelope>,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Frame just past the end of this segment
    pub fn end_frame(&self) -> usize {
        self.start_frame + self.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }
}

/// Ordered, non-overlapping segments ready to render
#[derive(Debug, Clone)]
pub struct Timeline {
    segments: Vec<Segment>,
    sample_rate: u32,
    total_frames: usize,
}

/// Convert a fade length in seconds to frames at `sample_rate`
pub fn fade_frames(fade_secs: f64, sample_rate: u32) -> usize {
    if !fade_secs.is_finite() || fade_secs <= 0.0 {
        return 0;
    }
    (fade_secs * sample_rate as f64).round() as usize
}

impl Timeline {
    /// Lay out decoded buffers in the given order
    ///
    /// Each buffer is resampled to `sample_rate` and mixed to stereo. The
    /// first segment gets a fade-out when it is an intro; the last gets a
    /// fade-in when it is an outro.
    ///
    /// # Errors
    /// * `EmptyTimeline` - no buffers
    /// * `InvalidInputs` - negative or non-finite fade duration
    pub fn build(decoded: Vec<(Role, DecodedBuffer)>, fade_secs: f64, sample_rate: u32) -> Result<Self> {
        if decoded.is_empty() {
            return Err(MixError::EmptyTimeline);
        }
        if !fade_secs.is_finite() || fade_secs < 0.0 {
            return Err(MixError::InvalidInputs {
                reason: format!("fade duration must be a non-negative number, got {}", fade_secs),
            });
        }

        let fade_len = fade_frames(fade_secs, sample_rate);
        let count = decoded.len();
        let mut segments = Vec::with_capacity(count);
        let mut current_frame = 0usize;
        let mut elapsed_secs = 0.0_f64;

        for (index, (role, buffer)) in decoded.into_iter().enumerate() {
            let stereo = buffer.to_stereo();
            elapsed_secs += stereo.duration_secs();
            let end_frame = (elapsed_secs * sample_rate as f64).round() as usize;
            let len = end_frame.saturating_sub(current_frame);
            let buffer = stereo.resampled_to_len(sample_rate, len);

            let envelope = if index == 0 && role == Role::Intro {
                Some(GainEnvelope::fade_out(len, fade_len))
            } else if index == count - 1 && role == Role::Outro {
                Some(GainEnvelope::fade_in(len, fade_len))
            } else {
                None
            };

            debug!(
                %role,
                start_frame = current_frame,
                frames = len,
                envelope = ?envelope,
                "placed segment"
            );

            segments.push(Segment {
                role,
                buffer,
                start_frame: current_frame,
                envelope,
            });
            current_frame += len;
        }

        Ok(Self {
            segments,
            sample_rate,
            total_frames: current_frame,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn duration_secs(&self) -> f64 {
        self.total_frames as f64 / self.sample_rate as f64
    }

    /// Render every segment into one stereo buffer
    ///
    /// The context must run at the rate the timeline was built for.
    ///
    /// # Errors
    /// * `Render` - the context rate differs from the timeline rate
    pub fn render(&self, context: &RenderContext) -> Result<MergedWaveform> {
        if context.sample_rate() != self.sample_rate {
            return Err(MixError::Render {
                reason: format!(
                    "timeline built at {} Hz cannot render in a {} Hz context",
                    self.sample_rate,
                    context.sample_rate()
                ),
            });
        }

        let mut output = DecodedBuffer::silence(context.channels(), self.total_frames, self.sample_rate);

        for segment in &self.segments {
            let range = segment.start_frame..segment.end_frame();
            for ch in 0..OUTPUT_CHANNELS {
                let target = &mut output.channel_mut(ch)[range.clone()];
                target.copy_from_slice(segment.buffer.channel(ch));
                if let Some(envelope) = &segment.envelope {
                    envelope.apply(target, 0);
                }
            }
        }

        debug!(
            context = context.id(),
            frames = self.total_frames,
            segments = self.segments.len(),
            "rendered timeline"
        );

        Ok(MergedWaveform { buffer: output })
    }
}

/// Finished stereo mix
///
/// Immutable once rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedWaveform {
    buffer: DecodedBuffer,
}

impl MergedWaveform {
    pub fn as_buffer(&self) -> &DecodedBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> DecodedBuffer {
        self.buffer
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.buffer.channels()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }

    pub fn channel(&self, ch: usize) -> &[f32] {
        self.buffer.channel(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::generate_square_wave;
    use crate::engine::context::ContextPool;
    use approx::assert_relative_eq;

    const RATE: u32 = 8000;

    fn ones(channels: usize, frames: usize) -> DecodedBuffer {
        DecodedBuffer::from_channels(vec![vec![1.0; frames]; channels], RATE).unwrap()
    }

    #[test]
    fn test_empty_timeline() {
        let err = Timeline::build(Vec::new(), 2.0, RATE).unwrap_err();
        assert!(matches!(err, MixError::EmptyTimeline));
    }

    #[test]
    fn test_negative_fade_rejected() {
        let err = Timeline::build(vec![(Role::Main, ones(2, 10))], -1.0, RATE).unwrap_err();
        assert!(matches!(err, MixError::InvalidInputs { .. }));
    }

    #[test]
    fn test_segments_are_contiguous() {
        let timeline = Timeline::build(
            vec![
                (Role::Intro, ones(1, 100)),
                (Role::Main, ones(2, 250)),
                (Role::Outro, ones(2, 50)),
            ],
            0.0,
            RATE,
        )
        .unwrap();

        let starts: Vec<usize> = timeline.segments().iter().map(|s| s.start_frame).collect();
        assert_eq!(starts, vec![0, 100, 350]);
        assert_eq!(timeline.total_frames(), 400);
        assert_relative_eq!(timeline.duration_secs(), 0.05);
    }

    #[test]
    fn test_envelopes_assigned_by_position_and_role() {
        let timeline = Timeline::build(
            vec![
                (Role::Intro, ones(2, 100)),
                (Role::Main, ones(2, 100)),
                (Role::Outro, ones(2, 100)),
            ],
            0.005,
            RATE,
        )
        .unwrap();
        let segs = timeline.segments();

        assert_eq!(segs[0].envelope, Some(GainEnvelope::fade_out(100, 40)));
        assert_eq!(segs[1].envelope, None);
        assert_eq!(segs[2].envelope, Some(GainEnvelope::fade_in(100, 40)));
    }

    #[test]
    fn test_main_only_has_no_envelope() {
        let timeline = Timeline::build(vec![(Role::Main, ones(2, 10))], 2.0, RATE).unwrap();
        assert!(timeline.segments()[0].envelope.is_none());
    }

    #[test]
    fn test_render_applies_envelopes() {
        let pool = ContextPool::new(RATE, 1);
        let ctx = pool.acquire().unwrap();
        let timeline = Timeline::build(
            vec![
                (Role::Intro, ones(2, 100)),
                (Role::Main, ones(2, 100)),
                (Role::Outro, ones(2, 100)),
            ],
            10.0,
            RATE,
        )
        .unwrap();

        let merged = timeline.render(&ctx).unwrap();
        let left = merged.channel(0);

        assert_eq!(merged.len(), 300);
        assert_eq!(merged.channels(), 2);
        assert_relative_eq!(left[0], 1.0);
        assert_relative_eq!(left[50], 0.5);
        assert!(left[99] < 0.02);
        assert!(left[100..200].iter().all(|&s| s == 1.0));
        assert_relative_eq!(left[200], 0.0);
        assert_relative_eq!(left[250], 0.5);
        assert_eq!(merged.channel(1), left);
    }

    #[test]
    fn test_render_square_wave_intro_envelope() {
        let pool = ContextPool::new(RATE, 1);
        let ctx = pool.acquire().unwrap();
        let intro = generate_square_wave(100.0, 0.1, RATE, 1);
        let timeline = Timeline::build(
            vec![(Role::Intro, intro.clone()), (Role::Main, ones(2, 10))],
            1.0,
            RATE,
        )
        .unwrap();

        let merged = timeline.render(&ctx).unwrap();
        let len = intro.len();
        for frame in 0..len {
            let expected = intro.channel(0)[frame] * (1.0 - frame as f32 / len as f32);
            assert_relative_eq!(merged.channel(0)[frame], expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_render_resamples_to_timeline_rate() {
        let pool = ContextPool::new(RATE, 1);
        let ctx = pool.acquire().unwrap();
        let half_rate = DecodedBuffer::from_channels(vec![vec![0.5; 50]], RATE / 2).unwrap();

        let timeline = Timeline::build(vec![(Role::Main, half_rate)], 2.0, RATE).unwrap();
        let merged = timeline.render(&ctx).unwrap();

        assert_eq!(merged.len(), 100);
        assert!(merged.channel(1).iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_render_rejects_mismatched_context() {
        let pool = ContextPool::new(44100, 1);
        let ctx = pool.acquire().unwrap();
        let timeline = Timeline::build(vec![(Role::Main, ones(2, 10))], 0.0, RATE).unwrap();

        let err = timeline.render(&ctx).unwrap_err();
        assert!(matches!(err, MixError::Render { .. }));
        assert_eq!(err.stage(), crate::error::MixStage::Render);
    }

    #[test]
    fn test_mixed_rate_length_follows_summed_durations() {
        let clip = || DecodedBuffer::from_channels(vec![vec![0.25; 123]; 2], 48000).unwrap();
        let timeline = Timeline::build(
            vec![(Role::Intro, clip()), (Role::Main, clip()), (Role::Outro, clip())],
            0.0,
            44100,
        )
        .unwrap();

        let expected_secs = 3.0 * 123.0 / 48000.0;
        let error_frames = (timeline.duration_secs() - expected_secs).abs() * 44100.0;
        assert!(error_frames <= 0.5, "off by {} frames", error_frames);
        assert_eq!(timeline.total_frames(), 339);

        let ends: Vec<usize> = timeline.segments().iter().map(Segment::end_frame).collect();
        assert_eq!(ends, vec![113, 226, 339]);
        let starts: Vec<usize> = timeline.segments().iter().map(|s| s.start_frame).collect();
        assert_eq!(starts, vec![0, 113, 226]);
    }
}
