//! Podmix CLI - Podcast Audio Mixer
//!
//! Command-line interface for the Podmix mixer.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use podmix::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Podmix v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Mix(args) => commands::mix(&args).map(|_| ()),
        Commands::Inspect { path, json } => commands::inspect(&path, json).map(|_| ()),
    }
}
