//! Engine binary for the Bastion rule engine.
//!
//! Loads a scenario file, plays its turn script through the movement and
//! placement delegates, and writes a final checkpoint.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `bastion-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Read the scenario named on the command line
//! 4. Build the starting game
//! 5. Play the turn script
//! 6. Write the final checkpoint and log the result

mod error;
mod scenario;
mod session;

use std::path::{Path, PathBuf};

use bastion_core::EngineConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::scenario::Scenario;
use crate::session::Session;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if the config or scenario cannot be loaded, or if a
/// command fails in a way that leaves the game unusable.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so this is silent.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.filter.as_str())),
        )
        .with_target(true)
        .init();

    info!(
        seed = config.engine.seed,
        checkpoint_path = config.engine.checkpoint_path,
        decision_timeout_ms = config.engine.decision_timeout_ms,
        aa_hit_on = config.movement.aa_hit_on,
        "bastion-engine starting"
    );

    // 3. Read the scenario.
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or(EngineError::Usage)?;
    let scenario = Scenario::from_file(&path)?;
    info!(
        path = %path.display(),
        players = scenario.players.len(),
        territories = scenario.territories.len(),
        units = scenario.units.len(),
        commands = scenario.commands.len(),
        "Scenario loaded"
    );

    // 4. Build the starting game.
    let mut session = Session::new(&scenario, config)?;

    // 5. Play the turn script.
    let summary = session.play(&scenario.commands).await?;

    // 6. Checkpoint and report.
    session.save_checkpoint()?;
    for line in session.movement().ledger().descriptions() {
        info!(action = %line, "move on record");
    }
    let units_on_map: usize = session
        .game()
        .data
        .territories()
        .map(|t| t.units.len())
        .sum();
    info!(
        rejected = summary.rejected,
        units_on_map,
        events = summary.events,
        battles = summary.battles,
        suspended = summary.suspended,
        "bastion-engine finished"
    );

    Ok(())
}

/// Load the engine configuration from `bastion-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<EngineConfig, EngineError> {
    let config_path = Path::new("bastion-config.yaml");
    if config_path.exists() {
        Ok(EngineConfig::from_file(config_path)?)
    } else {
        Ok(EngineConfig::parse("")?)
    }
}
