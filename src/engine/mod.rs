//! Audio Engine Module
//!
//! Buffer-level building blocks of the mixer:
//! - Decoded buffer type and channel mixing
//! - Decoders (hound for WAV, symphonia for compressed formats)
//! - Sample rate conversion
//! - Render contexts and the backend seam
//! - Canonical WAV encoding

pub mod buffer;
pub mod context;
pub mod decode;
pub mod resample;
pub mod wav;

pub use buffer::{DecodedBuffer, DEFAULT_SAMPLE_RATE, OUTPUT_CHANNELS};
pub use context::{AudioBackend, ContextPool, NativeBackend, RenderContext};
pub use decode::{AudioDecoder, SniffingDecoder, SymphoniaDecoder, WavDecoder};
pub use wav::{encode, encode_buffer, EncodedAudio, WavHeader};
