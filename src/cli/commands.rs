//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::cli::MixArgs;
use crate::config::MixerConfig;
use crate::engine::buffer::{calculate_peak, linear_to_db};
use crate::engine::wav::{encode, EncodedAudio, WavHeader};
use crate::error::MixError;
use crate::mix::{AudioMixer, MixInputs};

/// Merge file configuration with command-line overrides
pub fn resolve_config(args: &MixArgs) -> Result<MixerConfig> {
    let mut config = match &args.config {
        Some(path) => MixerConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MixerConfig::default(),
    };

    if let Some(rate) = args.sample_rate {
        config.sample_rate = rate;
    }
    if let Some(fade) = args.fade {
        config.fade_duration_secs = fade;
    }

    config.validate().map_err(with_stage)?;
    Ok(config)
}

/// Attach the failing pipeline stage to a mixer error
fn with_stage(err: MixError) -> anyhow::Error {
    let stage = err.stage();
    anyhow::Error::new(err).context(format!("{} stage failed", stage))
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Mix the given files and write the WAV result. Returns the output path.
pub fn mix(args: &MixArgs) -> Result<PathBuf> {
    let config = resolve_config(args)?;
    info!(
        main = %args.main.display(),
        sample_rate = config.sample_rate,
        fade_secs = config.fade_duration_secs,
        "mixing"
    );

    let main = read_input(&args.main)?;
    let intro = args.intro.as_deref().map(read_input).transpose()?;
    let outro = args.outro.as_deref().map(read_input).transpose()?;

    let mut inputs = MixInputs::main_only(&main);
    if let Some(intro) = &intro {
        inputs = inputs.with_intro(intro);
    }
    if let Some(outro) = &outro {
        inputs = inputs.with_outro(outro);
    }

    let mixer = AudioMixer::new(config).map_err(with_stage)?;
    let merged = mixer
        .render(&inputs.to_inputs(), mixer.config().fade_duration_secs)
        .map_err(with_stage)?;
    let encoded = encode(&merged).map_err(with_stage)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(EncodedAudio::suggested_file_name(Utc::now())));
    encoded
        .write_to(&output)
        .with_context(|| format!("writing {}", output.display()))?;

    println!("Mixed podcast written: {}", output.display());
    println!("Duration: {:.2}s", encoded.duration_secs());
    println!("Peak: {:.1} dBFS", linear_to_db(calculate_peak(merged.as_buffer())));
    println!("Size: {} bytes ({})", encoded.len(), encoded.mime_type());
    println!("SHA-256: {}", encoded.sha256_hex());

    Ok(output)
}

/// Print the header of a WAV file
pub fn inspect(path: &Path, json: bool) -> Result<WavHeader> {
    let bytes = read_input(path)?;
    let header = WavHeader::parse(&bytes)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&header)?);
    } else {
        println!("File: {}", path.display());
        println!("Channels: {}", header.channels);
        println!("Sample rate: {} Hz", header.sample_rate);
        println!("Bits per sample: {}", header.bits_per_sample);
        println!("Frames: {}", header.frames());
        println!(
            "Duration: {:.2}s",
            header.frames() as f64 / header.sample_rate.max(1) as f64
        );
        if bytes.len() < header.file_len() {
            println!("Warning: file is truncated ({} of {} bytes)", bytes.len(), header.file_len());
        }
    }

    Ok(header)
}
