//! The delegate bridge: how a turn phase touches the game.
//!
//! A [`Bridge`] bundles mutable access to the [`GameData`] and the
//! [`History`] for one acting player. Delegates never mutate game data
//! directly; they hand changes to [`Bridge::add_change`], which applies them
//! atomically and files them under the current history event.

use tracing::debug;

use bastion_types::{GameData, PlayerId};

use crate::ChangeError;
use crate::change::Change;
use crate::history::History;

/// Mutable access to the game for one acting player.
#[derive(Debug)]
pub struct Bridge<'a> {
    data: &'a mut GameData,
    history: &'a mut History,
    player: PlayerId,
}

impl<'a> Bridge<'a> {
    /// Create a bridge for `player`.
    pub const fn new(data: &'a mut GameData, history: &'a mut History, player: PlayerId) -> Self {
        Self {
            data,
            history,
            player,
        }
    }

    /// The acting player.
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Read-only view of the game data.
    pub const fn data(&self) -> &GameData {
        &*self.data
    }

    /// The history log.
    pub const fn history(&mut self) -> &mut History {
        &mut *self.history
    }

    /// Display name of the acting player.
    pub fn player_name(&self) -> String {
        self.data.player_name(self.player)
    }

    /// Apply `change` to the game, all or nothing, and record it as a child
    /// of the current history event.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeError`] if the change does not apply; the game and
    /// the history are left unchanged.
    pub fn add_change(&mut self, change: &Change) -> Result<(), ChangeError> {
        if change.is_empty() {
            return Ok(());
        }
        change.apply_atomic(self.data)?;
        self.history.record_change(change.clone());
        debug!(player = %self.player, "change applied");
        Ok(())
    }

    /// Start a history event for the acting player.
    pub fn start_event(&mut self, text: impl Into<String>) {
        self.history.start_event(Some(self.player), text);
    }

    /// Reborrow with a shorter lifetime, for passing into nested calls.
    pub const fn reborrow(&mut self) -> Bridge<'_> {
        Bridge {
            data: &mut *self.data,
            history: &mut *self.history,
            player: self.player,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use bastion_types::{Player, ResourceKind};

    use super::*;
    use crate::factory;

    #[test]
    fn add_change_is_atomic() {
        let mut data = GameData::new();
        let mut history = History::new();
        let red = PlayerId::new();
        data.add_player(Player::new(red, "Red"));
        let before = data.clone();

        let mut bridge = Bridge::new(&mut data, &mut history, red);
        let bad: Change = [
            factory::change_resource(red, ResourceKind::Industry, Decimal::new(3, 0)),
            factory::change_resource(red, ResourceKind::Fuel, Decimal::new(-1, 0)),
        ]
        .into_iter()
        .collect::<crate::CompositeChange>()
        .into();
        assert!(bridge.add_change(&bad).is_err());
        assert_eq!(bridge.data(), &before);
        assert!(history.is_empty());
    }

    #[test]
    fn applied_change_is_filed_under_current_event() {
        let mut data = GameData::new();
        let mut history = History::new();
        let red = PlayerId::new();
        data.add_player(Player::new(red, "Red"));

        let mut bridge = Bridge::new(&mut data, &mut history, red);
        bridge.start_event("Red collects income");
        let income = factory::change_resource(red, ResourceKind::Industry, Decimal::new(3, 0));
        bridge.add_change(&income).unwrap();

        let event = history.last().unwrap();
        assert_eq!(event.text, "Red collects income");
        assert_eq!(event.changes.iter().cloned().collect::<Vec<_>>(), vec![income]);
    }

    #[test]
    fn start_event_records_acting_player() {
        let mut data = GameData::new();
        let mut history = History::new();
        let red = PlayerId::new();
        data.add_player(Player::new(red, "Red"));

        let mut bridge = Bridge::new(&mut data, &mut history, red);
        assert_eq!(bridge.player_name(), "Red");
        bridge.start_event("Red moves");
        assert_eq!(history.last().and_then(|e| e.player), Some(red));
    }
}
