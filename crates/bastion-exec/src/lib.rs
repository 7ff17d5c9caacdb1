//! Resumable stack-based execution of turn plans.
//!
//! A turn phase decomposes its work into [`Executable`] units and pushes them
//! onto an [`ExecutionStack`]. Running the stack pops units one at a time;
//! a unit may push further units while it runs (a plan that only knows its
//! later steps once earlier ones have happened) or suspend because it needs
//! an answer from outside the engine.
//!
//! # Architecture
//!
//! - [`stack`] -- The [`ExecutionStack`] interpreter and its [`RunOutcome`].
//! - [`unit`] -- The [`Executable`] trait and the [`Execution`] result a unit
//!   reports back.
//!
//! # Suspension
//!
//! Suspension is a value, not a blocked thread. A unit that cannot continue
//! returns [`Execution::Suspend`] carrying what it is waiting for; the stack
//! keeps that unit as *current* and [`ExecutionStack::run`] returns
//! [`RunOutcome::Suspended`]. The whole stack is `serde`-serializable, so a
//! suspended plan can be written into a checkpoint and run again later. The
//! current unit is re-invoked first and is responsible for not repeating
//! side effects it already committed.
//!
//! # Usage
//!
//! ```
//! use bastion_exec::{Executable, Execution, ExecutionError, ExecutionStack, RunOutcome};
//!
//! struct Say(&'static str);
//!
//! impl Executable<Vec<&'static str>> for Say {
//!     type Awaiting = ();
//!
//!     fn name(&self) -> &'static str {
//!         "say"
//!     }
//!
//!     fn execute(
//!         &mut self,
//!         _stack: &mut ExecutionStack<Self>,
//!         out: &mut Vec<&'static str>,
//!     ) -> Result<Execution<()>, ExecutionError> {
//!         out.push(self.0);
//!         Ok(Execution::Complete)
//!     }
//! }
//!
//! let mut stack = ExecutionStack::new();
//! stack.push_all([Say("hello"), Say("world")]);
//! let mut out: Vec<&'static str> = Vec::new();
//! assert_eq!(stack.run(&mut out).ok(), Some(RunOutcome::Idle));
//! assert_eq!(out, ["hello", "world"]);
//! ```

pub mod stack;
pub mod unit;

// Re-export primary types at crate root.
pub use stack::{ExecutionStack, RunOutcome};
pub use unit::{Executable, Execution};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Fatal errors raised while running a plan.
///
/// These are never user-facing rejections: a plan that fails is left with the
/// failing unit as current and must be abandoned or reloaded from an earlier
/// checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// A unit failed while executing.
    #[error("step {step} failed: {message}")]
    StepFailed {
        /// The name of the failing unit.
        step: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// A resumed unit found game state that does not match what it left
    /// behind when it suspended.
    #[error("cannot resume step {step}: {message}")]
    Inconsistent {
        /// The name of the resumed unit.
        step: &'static str,
        /// Description of the inconsistency.
        message: String,
    },
}
