//! Phase delegates, decision plumbing and checkpoints for the Bastion rule
//! engine.
//!
//! This crate wires the lower layers together into playable turn phases:
//! the movement phase runs each move as a resumable plan on an
//! [`ExecutionStack`](bastion_exec::ExecutionStack), the placement phase
//! moves purchased units onto the map, and both record their actions in a
//! [`MoveLedger`](bastion_undo::MoveLedger) so they can be undone.
//!
//! # Architecture
//!
//! - [`config`] -- Typed engine configuration loaded from YAML.
//! - [`game`] -- The [`Game`]: data, history and pending battles.
//! - [`battle`] -- The [`BattleBook`] of battles created by combat moves.
//! - [`decision`] -- Decision requests, the inbox and decision sources.
//! - [`dice`] -- Seeded, replayable dice.
//! - [`plan`] -- The steps a move is executed as.
//! - [`movement`] -- The [`MoveDelegate`].
//! - [`placement`] -- The [`PlaceDelegate`].
//! - [`checkpoint`] -- JSON checkpoints of the game and both delegates.
//! - [`runner`] -- The async loop answering suspensions.
//! - [`error`] -- [`DelegateError`].
//!
//! # Suspension
//!
//! When a move needs a participant's choice the delegate returns
//! [`RunOutcome::Suspended`](bastion_exec::RunOutcome::Suspended) with a
//! [`DecisionRequest`]. The move stays in flight until
//! [`MoveDelegate::answer`] and [`MoveDelegate::resume`] are called, possibly
//! in another process after a [`Checkpoint`] round trip.

pub mod battle;
pub mod checkpoint;
pub mod config;
pub mod decision;
pub mod dice;
pub mod error;
pub mod game;
pub mod movement;
pub mod placement;
pub mod plan;
pub mod runner;

// Re-export primary types at crate root.
pub use battle::{Battle, BattleBook};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use config::{ConfigError, EngineConfig};
pub use decision::{
    ChannelDecisionSource, Decision, DecisionError, DecisionInbox, DecisionRequest,
    DecisionSource, ScriptedDecisionSource, StubDecisionSource,
};
pub use dice::Dice;
pub use error::DelegateError;
pub use game::Game;
pub use movement::{MoveDelegate, MoveDelegateState, MoveOutcome};
pub use placement::{PlaceDelegate, PlaceDelegateState};
pub use plan::{Load, MoveOrder, MoveStep};
pub use runner::{RunnerError, drive};
