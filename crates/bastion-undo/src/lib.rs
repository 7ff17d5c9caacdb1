//! Undoable actions and the per-phase move ledger.
//!
//! Every move or placement a player makes is recorded as an
//! [`UndoableAction`] in the [`MoveLedger`]. Recording computes dependency
//! edges against every earlier entry; an action can only be undone once
//! nothing recorded after it depends on it.
//!
//! # Architecture
//!
//! - [`action`] -- [`PendingAction`] (being assembled), [`UndoableAction`]
//!   (committed) and the dependency rules between actions.
//! - [`context`] -- The [`UndoContext`] handed to undo hooks, the
//!   [`BattleTracker`] seam and the [`ProductionLedger`].
//! - [`ledger`] -- The [`MoveLedger`]: record, undo by index, persistence.
//!
//! # Dependency rules
//!
//! A later action depends on an earlier one when:
//!
//! | Rule | Condition |
//! |------|-----------|
//! | Shared units | the affected unit sets intersect |
//! | Transport | it moves a transport the earlier move loaded, or loads a transport the earlier move moved |
//! | Capture | its route passes through territory the earlier move captured |
//! | Unload | it unloads a transport the earlier move loaded or unloaded |
//!
//! Edges always point from the later action to the earlier one.

pub mod action;
pub mod context;
pub mod ledger;

// Re-export primary types at crate root.
pub use action::{ActionKind, PendingAction, UndoableAction, UndoableMove, UndoablePlacement};
pub use context::{BattleTracker, PendingBattle, ProductionLedger, UndoContext};
pub use ledger::MoveLedger;

use bastion_change::ChangeError;
use bastion_types::ActionId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by [`MoveLedger::undo`] and related operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UndoError {
    /// The ledger is empty.
    #[error("no actions to undo")]
    NoActions,

    /// The requested index is past the end of the ledger.
    #[error("index {index} out of range, {len} actions recorded")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of recorded actions.
        len: usize,
    },

    /// A later action depends on the requested one.
    #[error("action {dependent} must be undone before action {index}")]
    BlockedByDependent {
        /// The requested index.
        index: usize,
        /// Index of the earliest dependent action.
        dependent: usize,
    },

    /// The action carries a sticky "cannot undo" reason.
    #[error("action {index} cannot be undone: {reason}")]
    CannotUndo {
        /// The requested index.
        index: usize,
        /// Why the action cannot be undone.
        reason: String,
    },

    /// The undo context does not serve this kind of action.
    #[error("cannot undo {kind} {index} from the {context} phase")]
    ContextMismatch {
        /// The requested index.
        index: usize,
        /// The action kind.
        kind: &'static str,
        /// The phase the context serves.
        context: &'static str,
    },

    /// The inverted change could not be applied to the game.
    #[error("change error: {source}")]
    Change {
        /// The underlying change error.
        #[from]
        source: ChangeError,
    },
}

impl UndoError {
    /// Whether this is a user-facing rejection rather than a fault.
    ///
    /// Rejections leave the game untouched and can be reported back to the
    /// player. A [`UndoError::Change`] means the recorded change no longer
    /// fits the game and the phase state is suspect.
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Change { .. })
    }
}

/// Errors raised when loading a persisted ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The persisted entries do not form a consistent dependency graph.
    #[error("corrupt ledger at action {action}: {reason}")]
    Corrupt {
        /// The offending action.
        action: ActionId,
        /// What is inconsistent.
        reason: String,
    },
}
