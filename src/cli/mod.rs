//! CLI Module
//!
//! Command-line interface for the Podmix mixer.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Podmix - mix a podcast with intro and outro clips into one WAV file
#[derive(Parser, Debug)]
#[command(name = "podmix")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mix main audio with optional intro/outro clips
    #[command(name = "mix")]
    Mix(MixArgs),

    /// Print the format of a WAV file written by podmix
    #[command(name = "inspect")]
    Inspect {
        /// WAV file to inspect
        path: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct MixArgs {
    /// Main podcast audio
    #[arg(short, long)]
    pub main: PathBuf,

    /// Intro clip, faded out at its end
    #[arg(short, long)]
    pub intro: Option<PathBuf>,

    /// Outro clip, faded in at its start
    #[arg(long)]
    pub outro: Option<PathBuf>,

    /// Fade duration in seconds
    #[arg(short, long)]
    pub fade: Option<f64>,

    /// Rendering sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output WAV path (default: podcast-<timestamp>.wav)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
