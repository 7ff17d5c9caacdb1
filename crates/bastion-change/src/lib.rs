//! Invertible game-state changes for the Bastion rule engine.
//!
//! Every mutation of [`GameData`] made by a turn phase goes through a
//! [`Change`]. Changes are plain data: they can be serialized into a
//! checkpoint, inverted without consulting the game, and replayed.
//!
//! # Architecture
//!
//! - [`change`] -- The [`Change`] enum and the ordered [`CompositeChange`].
//! - [`factory`] -- Constructors that capture the current (old) value so the
//!   resulting change can be inverted later.
//! - [`history`] -- The externally visible, timestamped action log.
//! - [`bridge`] -- The [`Bridge`] a delegate uses to apply changes for the
//!   acting player.
//!
//! # Inversion law
//!
//! For every change `c` and game data `d` on which `c` applies cleanly:
//!
//! ```text
//! apply(c); apply(c.invert())  ==  d
//! ```
//!
//! # Usage
//!
//! ```
//! use bastion_change::{factory, Change};
//! use bastion_types::{GameData, Player, PlayerId, ResourceKind};
//! use rust_decimal::Decimal;
//!
//! let mut data = GameData::new();
//! let red = PlayerId::new();
//! data.add_player(Player::new(red, "Red"));
//!
//! let income = factory::change_resource(red, ResourceKind::Industry, Decimal::new(12, 0));
//! let before = data.clone();
//! income.apply(&mut data).ok();
//! income.invert().apply(&mut data).ok();
//! assert_eq!(data, before);
//! ```
//!
//! [`GameData`]: bastion_types::GameData

pub mod bridge;
pub mod change;
pub mod factory;
pub mod history;

// Re-export primary types at crate root.
pub use bridge::Bridge;
pub use change::{Change, CompositeChange};
pub use history::{History, HistoryEvent};

use rust_decimal::Decimal;

use bastion_types::{PlayerId, ResourceKind, TerritoryId, UnitHolder, UnitId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when building or applying a change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChangeError {
    /// The change refers to a unit holder that does not exist.
    #[error("unknown unit holder: {holder}")]
    UnknownHolder {
        /// The missing holder.
        holder: UnitHolder,
    },

    /// The change refers to a unit that is not registered.
    #[error("unknown unit: {unit}")]
    UnknownUnit {
        /// The missing unit.
        unit: UnitId,
    },

    /// A unit to be removed is not present in the holder.
    #[error("unit {unit} is not held by {holder}")]
    UnitNotHeld {
        /// The unit that was expected.
        unit: UnitId,
        /// The holder it was expected in.
        holder: UnitHolder,
    },

    /// A unit to be added is already present in the holder.
    #[error("unit {unit} is already held by {holder}")]
    AlreadyHeld {
        /// The duplicate unit.
        unit: UnitId,
        /// The holder that already has it.
        holder: UnitHolder,
    },

    /// The change refers to a player that does not exist.
    #[error("unknown player: {player}")]
    UnknownPlayer {
        /// The missing player.
        player: PlayerId,
    },

    /// The change refers to a territory that does not exist.
    #[error("unknown territory: {territory}")]
    UnknownTerritory {
        /// The missing territory.
        territory: TerritoryId,
    },

    /// A resource change would leave the stockpile negative.
    #[error("player {player} has {available} {resource:?}, cannot apply {delta}")]
    InsufficientResource {
        /// The player whose stockpile was changed.
        player: PlayerId,
        /// The resource.
        resource: ResourceKind,
        /// The quantity held before the change.
        available: Decimal,
        /// The attempted delta.
        delta: Decimal,
    },

    /// A resource quantity overflowed.
    #[error("resource arithmetic overflow for player {player}")]
    Overflow {
        /// The player whose stockpile overflowed.
        player: PlayerId,
    },
}
