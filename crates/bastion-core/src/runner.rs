//! The async loop that carries a suspended move through to completion.
//!
//! The move plan itself is synchronous. Whenever it suspends, [`drive`] asks
//! a [`DecisionSource`] for the answer (bounded by a timeout), delivers it to
//! the delegate and resumes, until the plan is idle.

use std::time::Duration;

use tracing::{debug, info};

use crate::decision::{DecisionError, DecisionSource};
use crate::error::DelegateError;
use crate::game::Game;
use crate::movement::{MoveDelegate, MoveOutcome};

/// Errors that can occur while driving a move.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The delegate rejected or failed the move.
    #[error("delegate error: {source}")]
    Delegate {
        /// The underlying delegate error.
        #[from]
        source: DelegateError,
    },

    /// The decision source could not answer.
    #[error("decision error: {source}")]
    Decision {
        /// The underlying decision error.
        #[from]
        source: DecisionError,
    },

    /// The participant did not answer in time.
    #[error("decision timed out: {source}")]
    Timeout {
        /// The elapsed timer.
        #[from]
        source: tokio::time::error::Elapsed,
    },
}

/// Answer suspensions from `source` until the move in flight completes.
///
/// `outcome` is what the last call into the delegate returned. On error the
/// move stays suspended and can be driven again later.
pub async fn drive<S>(
    delegate: &mut MoveDelegate,
    game: &mut Game,
    outcome: MoveOutcome,
    source: &mut S,
    timeout: Duration,
) -> Result<(), RunnerError>
where
    S: DecisionSource,
{
    let mut outcome = outcome;
    let mut answered: u32 = 0;
    while let MoveOutcome::Suspended(request) = outcome {
        debug!(%request, ?timeout, "awaiting decision");
        let decision = tokio::time::timeout(timeout, source.decide(&request)).await??;
        info!(%request, ?decision, "decision received");
        delegate.answer(decision);
        answered = answered.saturating_add(1);
        outcome = delegate.resume(game)?;
    }
    if answered > 0 {
        debug!(answered, "move driven to completion");
    }
    Ok(())
}
