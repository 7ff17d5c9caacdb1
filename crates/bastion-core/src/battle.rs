//! Pending battles created during combat movement.
//!
//! The [`BattleBook`] only tracks which units attack where; fighting the
//! battles belongs to the combat phase. It implements [`BattleTracker`] so
//! that undoing a move can withdraw the move's units again.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use bastion_types::{ActionId, BattleId, PlayerId, Route, TerritoryId, UnitId};
use bastion_undo::{BattleTracker, PendingBattle};

/// A battle waiting to be fought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    /// Unique identifier.
    pub id: BattleId,
    /// Where the battle takes place.
    pub territory: TerritoryId,
    /// The attacking player.
    pub attacker: PlayerId,
    /// Whether this is a strategic bombing raid.
    pub bombing_raid: bool,
    /// Attacking units.
    pub attackers: BTreeSet<UnitId>,
    /// Routes the attackers arrived by.
    pub routes: Vec<Route>,
    /// The unit being bombed, for raids.
    pub target: Option<UnitId>,
    /// The move that opened the battle.
    pub created_by: ActionId,
}

/// Parameters for registering an attack.
#[derive(Debug, Clone, Copy)]
pub struct AttackParams<'a> {
    /// The move performing the attack.
    pub action: ActionId,
    /// The attacking player.
    pub attacker: PlayerId,
    /// The route taken; the battle is at its end.
    pub route: &'a Route,
    /// The attacking units.
    pub units: &'a BTreeSet<UnitId>,
    /// Whether the attack is a bombing raid.
    pub bombing_raid: bool,
    /// The unit being bombed, for raids.
    pub target: Option<UnitId>,
}

/// All pending battles of the current turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleBook {
    battles: BTreeMap<BattleId, Battle>,
}

impl BattleBook {
    /// Create an empty book.
    pub const fn new() -> Self {
        Self {
            battles: BTreeMap::new(),
        }
    }

    /// Return the number of pending battles.
    pub fn len(&self) -> usize {
        self.battles.len()
    }

    /// Return whether no battles are pending.
    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }

    /// Look up a battle.
    pub fn get(&self, id: BattleId) -> Option<&Battle> {
        self.battles.get(&id)
    }

    /// Battles pending in `territory`.
    pub fn battles_in(&self, territory: TerritoryId) -> impl Iterator<Item = &Battle> {
        self.battles.values().filter(move |b| b.territory == territory)
    }

    /// Join an existing battle of the same kind at the route's end, or open
    /// a new one.
    pub fn add_attack(&mut self, params: AttackParams<'_>) -> BattleId {
        let territory = params.route.end();
        let existing = self
            .battles
            .values_mut()
            .find(|b| b.territory == territory && b.bombing_raid == params.bombing_raid);

        let battle = if let Some(battle) = existing {
            battle
        } else {
            let id = BattleId::new();
            debug!(battle = %id, territory = %territory, raid = params.bombing_raid, "battle opened");
            self.battles.entry(id).or_insert(Battle {
                id,
                territory,
                attacker: params.attacker,
                bombing_raid: params.bombing_raid,
                attackers: BTreeSet::new(),
                routes: Vec::new(),
                target: None,
                created_by: params.action,
            })
        };
        battle.attackers.extend(params.units.iter().copied());
        if !battle.routes.contains(params.route) {
            battle.routes.push(params.route.clone());
        }
        if params.target.is_some() {
            battle.target = params.target;
        }
        battle.id
    }

    /// Withdraw `units` from every battle in `territory`.
    ///
    /// Returns whether any battle lost attackers.
    pub fn withdraw(&mut self, territory: TerritoryId, units: &BTreeSet<UnitId>) -> bool {
        let mut withdrew = false;
        for battle in self.battles.values_mut().filter(|b| b.territory == territory) {
            let before = battle.attackers.len();
            battle.attackers.retain(|u| !units.contains(u));
            withdrew |= battle.attackers.len() != before;
        }
        withdrew
    }

    /// Forget every battle.
    pub fn clear(&mut self) {
        self.battles.clear();
    }
}

impl BattleTracker for BattleBook {
    fn undo_battle(&mut self, action: ActionId, route: &Route, units: &BTreeSet<UnitId>) {
        let territory = route.end();
        for battle in self.battles.values_mut().filter(|b| b.territory == territory) {
            battle.attackers.retain(|u| !units.contains(u));
            battle.routes.retain(|r| r != route);
        }
        self.battles.retain(|id, b| {
            let keep = b.created_by != action || !b.attackers.is_empty();
            if !keep {
                debug!(battle = %id, "battle dropped by undo");
            }
            keep
        });
    }

    fn pending_battles(&self, territory: TerritoryId) -> Vec<PendingBattle> {
        self.battles_in(territory)
            .map(|b| PendingBattle {
                id: b.id,
                territory: b.territory,
                bombing_raid: b.bombing_raid,
            })
            .collect()
    }

    fn restore_attack(
        &mut self,
        battle: BattleId,
        route: Option<&Route>,
        units: &BTreeSet<UnitId>,
        target: Option<UnitId>,
    ) {
        let Some(battle) = self.battles.get_mut(&battle) else {
            return;
        };
        battle.attackers.extend(units.iter().copied());
        if let Some(route) = route {
            if !battle.routes.contains(route) {
                battle.routes.push(route.clone());
            }
        }
        if battle.bombing_raid && target.is_some() {
            battle.target = target;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attack<'a>(
        action: ActionId,
        attacker: PlayerId,
        route: &'a Route,
        units: &'a BTreeSet<UnitId>,
    ) -> AttackParams<'a> {
        AttackParams {
            action,
            attacker,
            route,
            units,
            bombing_raid: false,
            target: None,
        }
    }

    #[test]
    fn attacks_on_same_territory_share_a_battle() {
        let mut book = BattleBook::new();
        let red = PlayerId::new();
        let target = TerritoryId::new();
        let r1 = Route::new(TerritoryId::new(), vec![target]);
        let r2 = Route::new(TerritoryId::new(), vec![target]);
        let u1 = BTreeSet::from([UnitId::new()]);
        let u2 = BTreeSet::from([UnitId::new()]);

        let first = book.add_attack(attack(ActionId::new(), red, &r1, &u1));
        let second = book.add_attack(attack(ActionId::new(), red, &r2, &u2));
        assert_eq!(first, second);
        assert_eq!(book.len(), 1);
        assert_eq!(book.get(first).map(|b| b.attackers.len()), Some(2));
        assert_eq!(book.get(first).map(|b| b.routes.len()), Some(2));
    }

    #[test]
    fn undo_drops_battle_opened_by_the_move() {
        let mut book = BattleBook::new();
        let red = PlayerId::new();
        let action = ActionId::new();
        let route = Route::new(TerritoryId::new(), vec![TerritoryId::new()]);
        let units = BTreeSet::from([UnitId::new()]);
        book.add_attack(attack(action, red, &route, &units));

        book.undo_battle(action, &route, &units);
        assert!(book.is_empty());
    }

    #[test]
    fn undo_keeps_battle_other_moves_joined() {
        let mut book = BattleBook::new();
        let red = PlayerId::new();
        let target = TerritoryId::new();
        let opener = ActionId::new();
        let r1 = Route::new(TerritoryId::new(), vec![target]);
        let r2 = Route::new(TerritoryId::new(), vec![target]);
        let u1 = BTreeSet::from([UnitId::new()]);
        let u2 = BTreeSet::from([UnitId::new()]);
        let id = book.add_attack(attack(opener, red, &r1, &u1));
        book.add_attack(attack(ActionId::new(), red, &r2, &u2));

        book.undo_battle(opener, &r1, &u1);
        assert_eq!(book.get(id).map(|b| b.attackers.clone()), Some(u2));
        assert_eq!(book.get(id).map(|b| b.routes.clone()), Some(vec![r2]));
    }

    #[test]
    fn withdraw_then_restore() {
        let mut book = BattleBook::new();
        let red = PlayerId::new();
        let route = Route::new(TerritoryId::new(), vec![TerritoryId::new()]);
        let units = BTreeSet::from([UnitId::new()]);
        let id = book.add_attack(attack(ActionId::new(), red, &route, &units));

        assert!(book.withdraw(route.end(), &units));
        assert!(book.get(id).is_some_and(|b| b.attackers.is_empty()));
        assert!(!book.withdraw(route.end(), &units));

        let pending = book.pending_battles(route.end());
        assert_eq!(pending.len(), 1);
        book.restore_attack(id, Some(&route), &units, None);
        assert_eq!(book.get(id).map(|b| b.attackers.clone()), Some(units));
    }
}
