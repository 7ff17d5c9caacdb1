//! Shared game data and identifier types for the Bastion rule engine.
//!
//! This crate is the single source of truth for the state that changes,
//! execution plans and undoable actions operate on.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Unit kinds, resources and movement phases
//! - [`structs`] -- Units, territories, players and routes
//! - [`game`] -- The [`GameData`] container

pub mod enums;
pub mod game;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{MovePhase, ResourceKind, UnitKind};
pub use game::GameData;
pub use ids::{ActionId, BattleId, PlayerId, TerritoryId, UnitId};
pub use structs::{Player, Route, Territory, Unit, UnitHolder, UnitProperty};
