//! The game a phase delegate operates on.

use serde::{Deserialize, Serialize};

use bastion_change::{Bridge, History};
use bastion_types::{GameData, PlayerId};

use crate::battle::BattleBook;

/// Game data plus the history log and the pending battles.
///
/// The three parts are separate fields so a delegate can hand the battle
/// book to an undo hook while a [`Bridge`] holds the data and history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Players, territories and units.
    pub data: GameData,
    /// The action log.
    pub history: History,
    /// Battles waiting for the combat phase.
    pub battles: BattleBook,
}

impl Game {
    /// Wrap existing game data with an empty history and no battles.
    pub const fn new(data: GameData) -> Self {
        Self {
            data,
            history: History::new(),
            battles: BattleBook::new(),
        }
    }

    /// A bridge acting for `player`.
    pub const fn bridge(&mut self, player: PlayerId) -> Bridge<'_> {
        Bridge::new(&mut self.data, &mut self.history, player)
    }
}
