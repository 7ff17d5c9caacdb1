//! Errors returned by the phase delegates.

use bastion_change::ChangeError;
use bastion_exec::ExecutionError;
use bastion_undo::UndoError;

/// Errors returned by [`MoveDelegate`](crate::movement::MoveDelegate) and
/// [`PlaceDelegate`](crate::placement::PlaceDelegate).
#[derive(Debug, thiserror::Error)]
pub enum DelegateError {
    /// The delegate has not been started for a player.
    #[error("phase has not been started")]
    NotStarted,

    /// A move is suspended waiting for a decision.
    #[error("a move is already in progress")]
    MoveInProgress,

    /// The order refers to units or territories that do not fit.
    #[error("invalid order: {reason}")]
    InvalidOrder {
        /// What is wrong with the order.
        reason: String,
    },

    /// A change could not be built or applied.
    #[error("change error: {source}")]
    Change {
        /// The underlying change error.
        #[from]
        source: ChangeError,
    },

    /// An undo was rejected or failed.
    #[error("undo error: {source}")]
    Undo {
        /// The underlying undo error.
        #[from]
        source: UndoError,
    },

    /// The move plan failed.
    #[error("execution error: {source}")]
    Execution {
        /// The underlying execution error.
        #[from]
        source: ExecutionError,
    },
}

impl DelegateError {
    /// Whether the request was refused without touching the game.
    pub const fn is_rejection(&self) -> bool {
        match self {
            Self::NotStarted | Self::MoveInProgress | Self::InvalidOrder { .. } => true,
            Self::Undo { source } => source.is_rejection(),
            Self::Change { .. } | Self::Execution { .. } => false,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOrder {
            reason: reason.into(),
        }
    }
}
