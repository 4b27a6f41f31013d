//! # Skirmish
//!
//! Headless runner for the combat core.
//!
//! Loads a TOML config and a RON skill table, plays a scripted skirmish
//! between one player and a ring of NPCs, and logs the outcome.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod scenario;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{SimConfig, CONFIG_FILE};
use crate::scenario::{load_metadata, Skirmish};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("skirmish=info".parse()?))
        .init();

    info!("Skirmish starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CONFIG_FILE.to_owned());
    let config = SimConfig::load_from(&config_path);
    if !Path::new(&config_path).exists() {
        if let Err(e) = config.save_to(&config_path) {
            warn!("Failed to write default config: {e}");
        }
    }
    let metadata = load_metadata(config.metadata_path.as_deref())
        .context("failed to load skill table")?;

    let report = Skirmish::new(config, metadata).run();

    info!(
        steps = report.steps,
        casts = report.casts,
        damage_events = report.damage_events,
        buffs_applied = report.buffs_applied,
        deaths = report.deaths.len(),
        "Skirmish finished"
    );
    for (object_id, health) in &report.survivors {
        info!(%object_id, health, "Survivor");
    }
    Ok(())
}
