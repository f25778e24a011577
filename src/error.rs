//! Error handling for Podmix
//!
//! Every failure aborts the whole mix. Errors carry the stage that failed
//! and, for decode failures, the role of the offending input.

use std::fmt;

use thiserror::Error;

use crate::mix::Role;

/// Result type alias for Podmix operations
pub type Result<T> = std::result::Result<T, MixError>;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixStage {
    /// Validating the supplied inputs
    Input,
    /// Decoding an input into samples
    Decode,
    /// Walking the timeline
    Render,
    /// Writing the WAV container
    Encode,
    /// Acquiring the render context
    Context,
    /// Loading or validating configuration
    Config,
    /// Filesystem or serialization I/O
    Io,
}

impl fmt::Display for MixStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixStage::Input => write!(f, "input"),
            MixStage::Decode => write!(f, "decode"),
            MixStage::Render => write!(f, "render"),
            MixStage::Encode => write!(f, "encode"),
            MixStage::Context => write!(f, "context"),
            MixStage::Config => write!(f, "config"),
            MixStage::Io => write!(f, "io"),
        }
    }
}

/// Main error type for Podmix operations
#[derive(Error, Debug)]
pub enum MixError {
    // Decode Errors
    #[error("Failed to decode {role} audio: {reason}")]
    Decode {
        role: Role,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Input Errors
    #[error("Timeline has no segments to render")]
    EmptyTimeline,

    #[error("Invalid mix inputs: {reason}")]
    InvalidInputs { reason: String },

    // Render Errors
    #[error("Failed to render timeline: {reason}")]
    Render { reason: String },

    // Encode Errors
    #[error("Mix too long for a WAV container: {frames} frames x {channels} channels")]
    EncodingOverflow { frames: usize, channels: usize },

    #[error("Invalid WAV data: {reason}")]
    InvalidWav { reason: String },

    // Resource Errors
    #[error("Render context unavailable: {reason}")]
    ContextUnavailable { reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MixError {
    /// Build a decode error without an underlying cause
    pub fn decode(role: Role, reason: impl Into<String>) -> Self {
        MixError::Decode {
            role,
            reason: reason.into(),
            source: None,
        }
    }

    /// Build a decode error wrapping the library error that caused it
    pub fn decode_with_source<E>(role: Role, reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MixError::Decode {
            role,
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MixError::Decode { .. } => "DECODE_ERROR",
            MixError::EmptyTimeline => "EMPTY_TIMELINE",
            MixError::InvalidInputs { .. } => "INVALID_INPUTS",
            MixError::Render { .. } => "RENDER_FAILED",
            MixError::EncodingOverflow { .. } => "ENCODING_OVERFLOW",
            MixError::InvalidWav { .. } => "INVALID_WAV",
            MixError::ContextUnavailable { .. } => "CONTEXT_UNAVAILABLE",
            MixError::InvalidConfig { .. } => "INVALID_CONFIG",
            MixError::Io(_) => "IO_ERROR",
            MixError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Get the pipeline stage that produced this error
    pub fn stage(&self) -> MixStage {
        match self {
            MixError::Decode { .. } => MixStage::Decode,
            MixError::EmptyTimeline | MixError::InvalidInputs { .. } => MixStage::Input,
            MixError::Render { .. } => MixStage::Render,
            MixError::EncodingOverflow { .. } | MixError::InvalidWav { .. } => MixStage::Encode,
            MixError::ContextUnavailable { .. } => MixStage::Context,
            MixError::InvalidConfig { .. } => MixStage::Config,
            MixError::Io(_) | MixError::Serialization(_) => MixStage::Io,
        }
    }

    /// Role of the input that failed, for decode errors
    pub fn role(&self) -> Option<Role> {
        match self {
            MixError::Decode { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            MixError::Decode { .. } => vec![
                "Check that the file plays in another application",
                "Supported formats: WAV, MP3, AAC/M4A, FLAC, OGG Vorbis",
                "Try re-exporting the clip from its source",
            ],
            MixError::InvalidInputs { .. } => vec![
                "Supply exactly one main track",
                "Supply at most one intro and at most one outro",
            ],
            MixError::Render { .. } => vec![
                "Build the timeline and render context at the same sample rate",
            ],
            MixError::EncodingOverflow { .. } => vec![
                "Shorten the intro, main or outro audio",
                "Lower the rendering sample rate",
            ],
            MixError::ContextUnavailable { .. } => vec![
                "Wait for running mixes to finish",
                "Use a sample rate between 3000 and 768000 Hz",
            ],
            MixError::InvalidConfig { .. } => vec![
                "Check the configuration file against the documented fields",
            ],
            _ => vec![],
        }
    }
}
