//! # Ironclad
//!
//! Runs the tank simulation headless for a fixed number of ticks and logs
//! what happened.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use clap::Parser;
use ironclad_engine::{app, EngineConfig, CONFIG_FILE};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "ironclad", version, about = "Headless top-down tank simulation")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Terrain seed, overriding the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation ticks to run, overriding the config file
    #[arg(long)]
    ticks: Option<u64>,

    /// Synthetic frames per second for the headless loop
    #[arg(long)]
    headless_fps: Option<f64>,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    write_config: bool,
}

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("ironclad=info".parse()?))
        .init();

    let cli = Cli::parse();
    info!("Ironclad starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = EngineConfig::load_from(&cli.config);
    config.apply_overrides(cli.seed, cli.ticks, cli.headless_fps);
    config.validate().context("invalid configuration")?;

    if cli.write_config {
        config
            .save_to(&cli.config)
            .with_context(|| format!("failed to write {}", cli.config.display()))?;
        return Ok(());
    }

    let summary = app::run(config)?;
    info!(
        "Player {} after {} ticks",
        if summary.player_alive { "survived" } else { "destroyed" },
        summary.ticks
    );

    info!("Ironclad shutdown complete");
    Ok(())
}
