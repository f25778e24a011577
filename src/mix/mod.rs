//! Mixing Module
//!
//! Intro/main/outro inputs, fade envelopes, the timeline renderer and
//! the mixer that drives decode -> render -> encode.

pub mod envelope;
pub mod input;
pub mod mixer;
pub mod timeline;

pub use envelope::GainEnvelope;
pub use input::{validate_inputs, MixInputs, RawAudioInput, Role};
pub use mixer::AudioMixer;
pub use timeline::{MergedWaveform, Segment, Timeline};
