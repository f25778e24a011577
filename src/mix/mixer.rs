//! Audio mixer
//!
//! Front door of the pipeline: validate inputs, open a render context,
//! decode every input (in parallel), lay them out on a timeline, render,
//! release the context and encode to WAV. Any failure aborts the mix and
//! no partial output is returned.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::MixerConfig;
use crate::engine::buffer::DecodedBuffer;
use crate::engine::context::{AudioBackend, NativeBackend};
use crate::engine::wav::{encode, EncodedAudio};
use crate::error::Result;
use crate::mix::input::{validate_inputs, RawAudioInput, Role};
use crate::mix::timeline::{MergedWaveform, Timeline};

/// Offline intro/main/outro mixer
///
/// # Example
/// ```no_run
/// use podmix::{AudioMixer, MixInputs, MixerConfig};
///
/// # fn run(main: &[u8], intro: &[u8]) -> podmix::Result<()> {
/// let mixer = AudioMixer::new(MixerConfig::default())?;
/// let inputs = MixInputs::main_only(main).with_intro(intro).to_inputs();
/// let wav = mixer.mix(&inputs, 2.0)?;
/// assert_eq!(wav.mime_type(), "audio/wav");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AudioMixer<B = NativeBackend> {
    config: MixerConfig,
    backend: B,
}

impl AudioMixer<NativeBackend> {
    /// Create a mixer with the native backend
    ///
    /// # Errors
    /// * `InvalidConfig` - the configuration fails validation
    pub fn new(config: MixerConfig) -> Result<Self> {
        config.validate()?;
        let backend = NativeBackend::new(config.sample_rate, config.max_active_contexts);
        Ok(Self { config, backend })
    }
}

impl<B: AudioBackend> AudioMixer<B> {
    /// Create a mixer over a custom backend
    pub fn with_backend(config: MixerConfig, backend: B) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Decode, lay out and render the inputs into one stereo waveform
    ///
    /// `inputs` must be ordered `[intro] main [outro]`.
    ///
    /// # Errors
    /// * `EmptyTimeline` / `InvalidInputs` - bad input layout or fade
    /// * `ContextUnavailable` - no render context could be opened
    /// * `Decode` - an input could not be decoded (carries its role)
    /// * `Render` - the timeline could not be rendered in the context
    pub fn render(&self, inputs: &[RawAudioInput<'_>], fade_secs: f64) -> Result<MergedWaveform> {
        validate_inputs(inputs)?;

        // Released on every path out of this function
        let context = self.backend.acquire_context()?;

        let decoded = self.decode_all(inputs)?;
        let timeline = Timeline::build(decoded, fade_secs, context.sample_rate())?;
        let merged = timeline.render(&context)?;

        context.close();
        Ok(merged)
    }

    /// Render and encode to WAV
    pub fn mix(&self, inputs: &[RawAudioInput<'_>], fade_secs: f64) -> Result<EncodedAudio> {
        let merged = self.render(inputs, fade_secs)?;
        let encoded = encode(&merged)?;

        info!(
            duration_secs = merged.duration_secs(),
            sample_rate = merged.sample_rate(),
            bytes = encoded.len(),
            "mix complete"
        );

        Ok(encoded)
    }

    /// Mix with the configured default fade duration
    pub fn mix_default(&self, inputs: &[RawAudioInput<'_>]) -> Result<EncodedAudio> {
        self.mix(inputs, self.config.fade_duration_secs)
    }

    /// Decode all inputs, preserving order
    ///
    /// Inputs are independent, so they are decoded concurrently when
    /// `parallel_decode` is set. Returns only after every decode finished.
    fn decode_all(&self, inputs: &[RawAudioInput<'_>]) -> Result<Vec<(Role, DecodedBuffer)>> {
        let decode_one = |input: &RawAudioInput<'_>| -> Result<(Role, DecodedBuffer)> {
            let buffer = self.backend.decode(input)?;
            debug!(
                role = %input.role,
                sample_rate = buffer.sample_rate,
                channels = buffer.channels(),
                duration_secs = buffer.duration_secs(),
                "input decoded"
            );
            Ok((input.role, buffer))
        };

        if self.config.parallel_decode && inputs.len() > 1 {
            inputs.par_iter().map(decode_one).collect()
        } else {
            inputs.iter().map(decode_one).collect()
        }
    }
}
