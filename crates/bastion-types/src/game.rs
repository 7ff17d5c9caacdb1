//! The game data that changes are applied to.
//!
//! [`GameData`] holds the unit registry, the territories of the map and the
//! players. Units live in the registry for as long as some holder (a
//! territory or a player's placement pool) references them; holders only
//! store unit IDs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{PlayerId, TerritoryId, UnitId};
use crate::structs::{Player, Territory, Unit, UnitHolder};

/// The complete mutable state of a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    players: BTreeMap<PlayerId, Player>,
    territories: BTreeMap<TerritoryId, Territory>,
    units: BTreeMap<UnitId, Unit>,
}

impl GameData {
    /// Create empty game data.
    pub const fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            territories: BTreeMap::new(),
            units: BTreeMap::new(),
        }
    }

    // -- Setup --------------------------------------------------------------

    /// Register a player.
    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    /// Register a territory.
    pub fn add_territory(&mut self, territory: Territory) {
        self.territories.insert(territory.id, territory);
    }

    /// Create `unit` directly inside `holder`, bypassing the change log.
    ///
    /// Intended for scenario setup only. Returns `false` if the holder does
    /// not exist.
    pub fn spawn_unit(&mut self, unit: Unit, holder: UnitHolder) -> bool {
        let id = unit.id;
        let Some(held) = self.holder_units_mut(holder) else {
            return false;
        };
        held.insert(id);
        self.units.insert(id, unit);
        true
    }

    // -- Queries ------------------------------------------------------------

    /// Look up a player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Look up a player mutably.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Look up a territory.
    pub fn territory(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.get(&id)
    }

    /// Look up a territory mutably.
    pub fn territory_mut(&mut self, id: TerritoryId) -> Option<&mut Territory> {
        self.territories.get_mut(&id)
    }

    /// Iterate over all territories.
    pub fn territories(&self) -> impl Iterator<Item = &Territory> {
        self.territories.values()
    }

    /// Look up a unit.
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Look up a unit mutably.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Insert `unit` into the registry unless a unit with the same ID is
    /// already registered.
    pub fn register_unit(&mut self, unit: &Unit) {
        self.units.entry(unit.id).or_insert_with(|| unit.clone());
    }

    /// Drop `id` from the registry if no holder references it any more.
    pub fn forget_if_unheld(&mut self, id: UnitId) {
        if !self.is_held(id) {
            self.units.remove(&id);
        }
    }

    /// Whether any territory or placement pool references `id`.
    pub fn is_held(&self, id: UnitId) -> bool {
        self.territories.values().any(|t| t.units.contains(&id))
            || self.players.values().any(|p| p.units_to_place.contains(&id))
    }

    /// The unit IDs held by `holder`.
    pub fn holder_units(&self, holder: UnitHolder) -> Option<&BTreeSet<UnitId>> {
        match holder {
            UnitHolder::Territory(id) => self.territories.get(&id).map(|t| &t.units),
            UnitHolder::Player(id) => self.players.get(&id).map(|p| &p.units_to_place),
        }
    }

    /// The unit IDs held by `holder`, mutably.
    pub fn holder_units_mut(&mut self, holder: UnitHolder) -> Option<&mut BTreeSet<UnitId>> {
        match holder {
            UnitHolder::Territory(id) => self.territories.get_mut(&id).map(|t| &mut t.units),
            UnitHolder::Player(id) => self.players.get_mut(&id).map(|p| &mut p.units_to_place),
        }
    }

    /// Units present in `territory`, resolved through the registry.
    pub fn units_in(&self, territory: TerritoryId) -> Vec<&Unit> {
        self.territories
            .get(&territory)
            .map(|t| t.units.iter().filter_map(|id| self.units.get(id)).collect())
            .unwrap_or_default()
    }

    /// Units in `territory` owned by someone other than `player`.
    pub fn enemy_units_in(&self, territory: TerritoryId, player: PlayerId) -> Vec<&Unit> {
        self.units_in(territory)
            .into_iter()
            .filter(|u| u.owner != player)
            .collect()
    }

    /// Whether `territory` is owned by a player other than `player`.
    pub fn is_enemy_territory(&self, territory: TerritoryId, player: PlayerId) -> bool {
        self.territories
            .get(&territory)
            .and_then(|t| t.owner)
            .is_some_and(|owner| owner != player)
    }

    /// Display name of a territory, or its ID if unknown.
    pub fn territory_name(&self, id: TerritoryId) -> String {
        self.territories
            .get(&id)
            .map_or_else(|| id.to_string(), |t| t.name.clone())
    }

    /// Display name of a player, or its ID if unknown.
    pub fn player_name(&self, id: PlayerId) -> String {
        self.players
            .get(&id)
            .map_or_else(|| id.to_string(), |p| p.name.clone())
    }
}
