//! Collaborators an undo hook may touch.
//!
//! Undo hooks never look services up globally. The caller passes an
//! [`UndoContext`] naming exactly the collaborator the action kind needs:
//! the battle tracker for moves, the production ledger for placements.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use bastion_types::{ActionId, BattleId, Route, TerritoryId, UnitId};

// ---------------------------------------------------------------------------
// Battles
// ---------------------------------------------------------------------------

/// Summary of a battle waiting to be fought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBattle {
    /// The battle's identifier.
    pub id: BattleId,
    /// Where the battle takes place.
    pub territory: TerritoryId,
    /// Whether this is a strategic bombing raid rather than a regular attack.
    pub bombing_raid: bool,
}

/// The part of the battle layer that move undo relies on.
pub trait BattleTracker {
    /// Reverse the effect `action` had on battles: withdraw `units` from
    /// battles along `route` and drop battles `action` created that are left
    /// without attackers.
    fn undo_battle(&mut self, action: ActionId, route: &Route, units: &BTreeSet<UnitId>);

    /// Battles pending in `territory`.
    fn pending_battles(&self, territory: TerritoryId) -> Vec<PendingBattle>;

    /// Re-enter `units` into `battle` as attackers that arrived by `route`.
    ///
    /// For bombing raids `target` names the unit being bombed.
    fn restore_attack(
        &mut self,
        battle: BattleId,
        route: Option<&Route>,
        units: &BTreeSet<UnitId>,
        target: Option<UnitId>,
    );
}

// ---------------------------------------------------------------------------
// Production
// ---------------------------------------------------------------------------

/// Units placed this phase, keyed by the territory that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionLedger {
    produced: BTreeMap<TerritoryId, Vec<UnitId>>,
}

impl ProductionLedger {
    /// Create an empty production ledger.
    pub const fn new() -> Self {
        Self {
            produced: BTreeMap::new(),
        }
    }

    /// Record that `producer` produced `units`.
    pub fn record(&mut self, producer: TerritoryId, units: impl IntoIterator<Item = UnitId>) {
        self.produced.entry(producer).or_default().extend(units);
    }

    /// Forget that `producer` produced `units`.
    pub fn remove(&mut self, producer: TerritoryId, units: &BTreeSet<UnitId>) {
        if let Some(list) = self.produced.get_mut(&producer) {
            list.retain(|u| !units.contains(u));
            if list.is_empty() {
                self.produced.remove(&producer);
            }
        }
    }

    /// Units produced by `producer` so far.
    pub fn produced_by(&self, producer: TerritoryId) -> &[UnitId] {
        self.produced
            .get(&producer)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether nothing was produced.
    pub fn is_empty(&self) -> bool {
        self.produced.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.produced.clear();
    }
}

// ---------------------------------------------------------------------------
// UndoContext
// ---------------------------------------------------------------------------

/// The collaborator handed to an undo hook.
pub enum UndoContext<'a> {
    /// Undoing a move during a movement phase.
    Movement {
        /// The battle layer.
        battles: &'a mut dyn BattleTracker,
    },
    /// Undoing a placement during the placement phase.
    Placement {
        /// The phase's production ledger.
        production: &'a mut ProductionLedger,
    },
}

impl UndoContext<'_> {
    /// Short name of the phase this context serves.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Movement { .. } => "movement",
            Self::Placement { .. } => "placement",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_remove_drops_empty_producers() {
        let factory = TerritoryId::new();
        let a = UnitId::new();
        let b = UnitId::new();
        let mut production = ProductionLedger::new();
        production.record(factory, [a, b]);
        assert_eq!(production.produced_by(factory), &[a, b]);

        production.remove(factory, &BTreeSet::from([a]));
        assert_eq!(production.produced_by(factory), &[b]);
        production.remove(factory, &BTreeSet::from([b]));
        assert!(production.is_empty());
    }
}
