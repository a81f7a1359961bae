//! # Armory
//!
//! Headless driver for the Armory weapon core.
//!
//! Loads `armory.toml` and any extra presets, picks up the configured
//! loadout, runs the scripted scenario against a range of target dummies and
//! prints a JSON summary.
//!
//! ```text
//! armory [CONFIG]          run a scenario (default: ./armory.toml)
//! armory --init [PATH]     write the default configuration
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod host;
mod scenario;

use std::fs;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{SimConfig, CONFIG_FILE};
use crate::scenario::Scenario;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("armory=info".parse()?))
        .init();

    info!("Armory starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(flag) if flag == "--init" => {
            let path = args.next().unwrap_or_else(|| CONFIG_FILE.to_string());
            SimConfig::default()
                .save_to(&path)
                .with_context(|| format!("writing {path}"))?;
            return Ok(());
        },
        Some(path) => SimConfig::load_from(path),
        None => SimConfig::load(),
    };

    let mut scenario = Scenario::new(config.clone())?;
    let summary = scenario.run();

    let json = serde_json::to_string_pretty(&summary)?;
    if let Some(path) = &config.summary_path {
        fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
        info!("Summary written to {}", path.display());
    }
    println!("{json}");

    info!("Armory shutdown complete");
    Ok(())
}
