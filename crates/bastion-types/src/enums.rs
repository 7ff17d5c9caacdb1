//! Enumeration types shared by the rule engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Unit kinds
// ---------------------------------------------------------------------------

/// The kind of a unit.
///
/// The engine core never interprets combat values; it only asks the small
/// set of participation predicates below (is this unit a bomber, can it be
/// bombed, does it fire anti-air) when assembling a move plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Basic land unit.
    Infantry,
    /// Armoured land unit.
    Armour,
    /// Air unit that may escort bombers.
    Fighter,
    /// Strategic bomber.
    Bomber,
    /// Sea unit able to carry land units.
    Transport,
    /// Anti-aircraft gun that fires at air units moving over it.
    AntiAir,
    /// Production facility; a strategic bombing target.
    Factory,
}

impl UnitKind {
    /// Whether the unit flies.
    pub const fn is_air(self) -> bool {
        matches!(self, Self::Fighter | Self::Bomber)
    }

    /// Whether the unit can take part in a strategic bombing raid.
    pub const fn is_strategic_bomber(self) -> bool {
        matches!(self, Self::Bomber)
    }

    /// Whether the unit can be the target of a bombing raid.
    pub const fn can_be_bombed(self) -> bool {
        matches!(self, Self::Factory)
    }

    /// Whether the unit fires at enemy air units moving through its territory.
    pub const fn is_anti_air(self) -> bool {
        matches!(self, Self::AntiAir)
    }

    /// Whether the unit can carry other units.
    pub const fn can_transport(self) -> bool {
        matches!(self, Self::Transport)
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A player-held resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Production points spent on units.
    Industry,
    /// Fuel consumed by movement.
    Fuel,
}

// ---------------------------------------------------------------------------
// Turn phases
// ---------------------------------------------------------------------------

/// The kind of movement phase a move happens in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovePhase {
    /// Combat movement: entering enemy territory starts battles.
    #[default]
    Combat,
    /// Non-combat movement: no battles are created.
    NonCombat,
}
