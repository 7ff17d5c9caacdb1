//! The placement phase delegate.

use serde::{Deserialize, Serialize};
use tracing::info;

use bastion_change::{Change, CompositeChange, factory};
use bastion_types::{PlayerId, TerritoryId, UnitHolder, UnitId};
use bastion_undo::{MoveLedger, PendingAction, ProductionLedger, UndoContext};

use crate::error::DelegateError;
use crate::game::Game;

/// Everything the placement delegate persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDelegateState {
    /// The acting player, while the phase is running.
    pub player: Option<PlayerId>,
    /// Placements made this phase.
    pub ledger: MoveLedger,
    /// Units placed per producing territory.
    pub production: ProductionLedger,
}

/// Places units from a player's pool onto the map.
#[derive(Debug, Clone, Default)]
pub struct PlaceDelegate {
    player: Option<PlayerId>,
    ledger: MoveLedger,
    production: ProductionLedger,
}

impl PlaceDelegate {
    /// Create an idle delegate.
    pub const fn new() -> Self {
        Self {
            player: None,
            ledger: MoveLedger::new(),
            production: ProductionLedger::new(),
        }
    }

    /// Begin a placement phase for `player`.
    pub fn start(&mut self, player: PlayerId) {
        info!(player = %player, "placement phase started");
        self.player = Some(player);
    }

    /// End the phase, forgetting what was placed.
    pub fn end(&mut self) {
        self.player = None;
        self.ledger.clear();
        self.production.clear();
    }

    /// Placements recorded this phase.
    pub const fn ledger(&self) -> &MoveLedger {
        &self.ledger
    }

    /// Units placed per producing territory.
    pub const fn production(&self) -> &ProductionLedger {
        &self.production
    }

    /// Move `units` from the acting player's pool to `at`, charging them
    /// against `producer`.
    ///
    /// Returns the ledger index of the placement.
    pub fn place_units(
        &mut self,
        game: &mut Game,
        units: &[UnitId],
        at: TerritoryId,
        producer: TerritoryId,
    ) -> Result<usize, DelegateError> {
        let player = self.player.ok_or(DelegateError::NotStarted)?;
        if units.is_empty() {
            return Err(DelegateError::invalid("no units to place"));
        }
        if game.data.territory(at).is_none() {
            return Err(DelegateError::invalid(format!("unknown territory {at}")));
        }
        let pool = game
            .data
            .holder_units(UnitHolder::Player(player))
            .ok_or_else(|| DelegateError::invalid(format!("unknown player {player}")))?;
        if let Some(missing) = units.iter().find(|id| !pool.contains(id)) {
            return Err(DelegateError::invalid(format!(
                "unit {missing} is not waiting to be placed"
            )));
        }

        let snapshot = factory::snapshot_units(&game.data, units)?;
        let mut composite = CompositeChange::new();
        composite.add(factory::add_units(UnitHolder::Territory(at), snapshot.clone()));
        composite.add(factory::remove_units(UnitHolder::Player(player), snapshot));
        let change = Change::from(composite);

        let description = format!(
            "{} places {} units in {}",
            game.data.player_name(player),
            units.len(),
            game.data.territory_name(at)
        );
        change.apply(&mut game.data.clone())?;
        let mut bridge = game.bridge(player);
        bridge.start_event(description.as_str());
        bridge.add_change(&change)?;

        let mut pending =
            PendingAction::for_placement(description, units.iter().copied(), producer, at);
        pending.add_change(change);
        self.production.record(producer, units.iter().copied());
        let index = self.ledger.record(pending);
        info!(player = %player, territory = %at, units = units.len(), index, "units placed");
        Ok(index)
    }

    /// Undo the placement at `index`.
    ///
    /// Returns the description of the undone placement.
    pub fn undo_placement(
        &mut self,
        game: &mut Game,
        index: usize,
    ) -> Result<String, DelegateError> {
        let player = self.player.ok_or(DelegateError::NotStarted)?;
        let mut bridge = game.bridge(player);
        let mut ctx = UndoContext::Placement {
            production: &mut self.production,
        };
        Ok(self.ledger.undo(index, &mut bridge, &mut ctx)?)
    }

    /// Snapshot the delegate for a checkpoint.
    pub fn save_state(&self) -> PlaceDelegateState {
        PlaceDelegateState {
            player: self.player,
            ledger: self.ledger.clone(),
            production: self.production.clone(),
        }
    }

    /// Restore a snapshot taken by [`save_state`](Self::save_state).
    pub fn load_state(&mut self, state: PlaceDelegateState) {
        self.player = state.player;
        self.ledger = state.ledger;
        self.production = state.production;
    }
}
