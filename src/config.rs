//! Mixer configuration
//!
//! Loaded from JSON; every field is optional and falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::buffer::DEFAULT_SAMPLE_RATE;
use crate::engine::context::{MAX_CONTEXT_SAMPLE_RATE, MIN_CONTEXT_SAMPLE_RATE};
use crate::error::{MixError, Result};

/// Default fade length between intro/main and main/outro
pub const DEFAULT_FADE_SECS: f64 = 2.0;

/// Default number of render contexts that may be open at once
pub const DEFAULT_MAX_ACTIVE_CONTEXTS: usize = 4;

/// Settings shared by every mix a mixer performs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Rendering sample rate in Hz
    pub sample_rate: u32,
    /// Fade length used by `mix_default`
    pub fade_duration_secs: f64,
    /// Render contexts that may be open at once
    pub max_active_contexts: usize,
    /// Decode intro/main/outro concurrently
    pub parallel_decode: bool,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fade_duration_secs: DEFAULT_FADE_SECS,
            max_active_contexts: DEFAULT_MAX_ACTIVE_CONTEXTS,
            parallel_decode: true,
        }
    }
}

impl MixerConfig {
    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: MixerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field is usable
    pub fn validate(&self) -> Result<()> {
        if !(MIN_CONTEXT_SAMPLE_RATE..=MAX_CONTEXT_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(MixError::InvalidConfig {
                reason: format!(
                    "sample_rate {} Hz outside {}..={} Hz",
                    self.sample_rate, MIN_CONTEXT_SAMPLE_RATE, MAX_CONTEXT_SAMPLE_RATE
                ),
            });
        }
        if !self.fade_duration_secs.is_finite() || self.fade_duration_secs < 0.0 {
            return Err(MixError::InvalidConfig {
                reason: format!(
                    "fade_duration_secs must be a non-negative number, got {}",
                    self.fade_duration_secs
                ),
            });
        }
        if self.max_active_contexts == 0 {
            return Err(MixError::InvalidConfig {
                reason: "max_active_contexts must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
