//! Podmix - Offline Podcast Audio Mixer
//!
//! Podmix joins an optional intro, the spoken podcast and an optional
//! outro into one WAV file:
//! 1. Decode - every input becomes planar f32 samples
//! 2. Render - inputs are laid end to end on a stereo timeline, the intro
//!    fading out over its tail and the outro fading in over its head
//! 3. Encode - the mix is written as 16-bit PCM in a canonical WAV file

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod mix;

pub use config::MixerConfig;
pub use engine::{DecodedBuffer, EncodedAudio, WavHeader};
pub use error::{MixError, MixStage, Result};
pub use mix::{AudioMixer, MergedWaveform, MixInputs, RawAudioInput, Role};
