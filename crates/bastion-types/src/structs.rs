//! Core entity structs: units, territories, players, and routes.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{ResourceKind, UnitKind};
use crate::ids::{PlayerId, TerritoryId, UnitId};

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// A single unit on the board or waiting to be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// The owning player.
    pub owner: PlayerId,
    /// What kind of unit this is.
    pub kind: UnitKind,
    /// Movement points already spent this turn.
    pub already_moved: u32,
    /// Whether the unit took part in combat this turn.
    pub was_in_combat: bool,
    /// The transport carrying this unit, if any.
    pub transported_by: Option<UnitId>,
}

impl Unit {
    /// Create a fresh unit with no movement spent.
    pub const fn new(id: UnitId, owner: PlayerId, kind: UnitKind) -> Self {
        Self {
            id,
            owner,
            kind,
            already_moved: 0,
            was_in_combat: false,
            transported_by: None,
        }
    }
}

/// A single mutable property of a [`Unit`], carrying its value.
///
/// Property changes record both the old and the new value so that they can
/// be inverted without consulting the game data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitProperty {
    /// Movement points already spent.
    AlreadyMoved(u32),
    /// Whether the unit was in combat.
    WasInCombat(bool),
    /// The carrying transport.
    TransportedBy(Option<UnitId>),
}

impl UnitProperty {
    /// Read the current value of the same property from `unit`.
    pub const fn read_from(self, unit: &Unit) -> Self {
        match self {
            Self::AlreadyMoved(_) => Self::AlreadyMoved(unit.already_moved),
            Self::WasInCombat(_) => Self::WasInCombat(unit.was_in_combat),
            Self::TransportedBy(_) => Self::TransportedBy(unit.transported_by),
        }
    }

    /// Write this value into `unit`.
    pub const fn write_to(self, unit: &mut Unit) {
        match self {
            Self::AlreadyMoved(v) => unit.already_moved = v,
            Self::WasInCombat(v) => unit.was_in_combat = v,
            Self::TransportedBy(v) => unit.transported_by = v,
        }
    }

    /// Whether `other` names the same property (ignoring the value).
    pub const fn same_property(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::AlreadyMoved(_), Self::AlreadyMoved(_))
                | (Self::WasInCombat(_), Self::WasInCombat(_))
                | (Self::TransportedBy(_), Self::TransportedBy(_))
        )
    }
}

// ---------------------------------------------------------------------------
// Territory and player
// ---------------------------------------------------------------------------

/// A territory or sea zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    /// Unique identifier.
    pub id: TerritoryId,
    /// Display name.
    pub name: String,
    /// Current owner; `None` for sea zones and unowned neutrals.
    pub owner: Option<PlayerId>,
    /// Units currently present.
    pub units: BTreeSet<UnitId>,
}

impl Territory {
    /// Create an empty territory.
    pub fn new(id: TerritoryId, name: impl Into<String>, owner: Option<PlayerId>) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            units: BTreeSet::new(),
        }
    }
}

/// A player (nation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Resource stockpile.
    pub resources: BTreeMap<ResourceKind, Decimal>,
    /// Purchased units waiting in the placement pool.
    pub units_to_place: BTreeSet<UnitId>,
}

impl Player {
    /// Create a player with an empty stockpile.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            resources: BTreeMap::new(),
            units_to_place: BTreeSet::new(),
        }
    }
}

/// Where a unit is held: on the map, or in a player's placement pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitHolder {
    /// On the map in a territory.
    Territory(TerritoryId),
    /// In a player's pool of units to place.
    Player(PlayerId),
}

impl core::fmt::Display for UnitHolder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Territory(id) => write!(f, "territory {id}"),
            Self::Player(id) => write!(f, "player {id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// A path over the map: a start territory followed by the steps taken.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Where the route begins.
    pub start: TerritoryId,
    /// Territories entered, in order. The last one is the end.
    pub steps: Vec<TerritoryId>,
}

impl Route {
    /// Create a route from `start` through `steps`.
    pub const fn new(start: TerritoryId, steps: Vec<TerritoryId>) -> Self {
        Self { start, steps }
    }

    /// A zero-length route that never leaves `start`.
    pub const fn stationary(start: TerritoryId) -> Self {
        Self {
            start,
            steps: Vec::new(),
        }
    }

    /// The final territory; the start for a zero-length route.
    pub fn end(&self) -> TerritoryId {
        self.steps.last().copied().unwrap_or(self.start)
    }

    /// Whether the route has no steps.
    pub fn has_no_steps(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every territory on the route, start included.
    pub fn all_territories(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        core::iter::once(self.start).chain(self.steps.iter().copied())
    }

    /// The number of movement points the route costs.
    pub fn movement_cost(&self) -> u32 {
        u32::try_from(self.steps.len()).unwrap_or(u32::MAX)
    }
}
