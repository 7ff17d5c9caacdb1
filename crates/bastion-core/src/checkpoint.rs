//! Checkpoints: the game plus both phase delegates, as JSON.
//!
//! A checkpoint written while a move is suspended can be loaded by a fresh
//! process; starting the movement delegate from it resumes the move at the
//! step that suspended.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::game::Game;
use crate::movement::MoveDelegateState;
use crate::placement::PlaceDelegateState;

/// Errors that can occur when writing or reading a checkpoint.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// The checkpoint file could not be read or written.
    #[error("checkpoint I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The checkpoint could not be encoded or decoded.
    #[error("checkpoint JSON is invalid: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Everything needed to continue a turn in another process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The game.
    pub game: Game,
    /// The movement delegate.
    pub movement: MoveDelegateState,
    /// The placement delegate.
    pub placement: PlaceDelegateState,
    /// When the checkpoint was taken.
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Capture a checkpoint now.
    pub fn new(game: Game, movement: MoveDelegateState, placement: PlaceDelegateState) -> Self {
        Self {
            game,
            movement,
            placement,
            saved_at: Utc::now(),
        }
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON.
    ///
    /// A ledger whose dependency edges do not line up is rejected here.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the checkpoint to `path`.
    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        std::fs::write(path, self.to_json()?)?;
        info!(
            path = %path.display(),
            moves = self.movement.ledger.len(),
            suspended = self.movement.plan.is_executing(),
            "checkpoint written"
        );
        Ok(())
    }

    /// Read a checkpoint from `path`.
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let checkpoint = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), saved_at = %checkpoint.saved_at, "checkpoint loaded");
        Ok(checkpoint)
    }
}
