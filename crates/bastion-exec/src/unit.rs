//! The [`Executable`] trait implemented by every plan step.

use crate::ExecutionError;
use crate::stack::ExecutionStack;

/// What a unit reports after being invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution<A> {
    /// The unit finished; it will not be invoked again.
    Complete,
    /// The unit is waiting for outside input described by the payload. It
    /// stays current and is invoked again on the next run.
    Suspend(A),
}

/// One step of a dynamically expandable plan.
///
/// `C` is the context handed to every unit of the plan (game data, inbox,
/// ledgers). Plans are usually a closed `enum` of steps implementing this
/// trait, which keeps the whole stack serializable.
///
/// # Resumption
///
/// A unit that suspended is invoked again from the top. Implementations
/// must remember what they already committed (typically in their own
/// fields) and skip it, so that re-running never applies an effect twice.
pub trait Executable<C: ?Sized>: Sized {
    /// The description of outside input a suspended unit waits for.
    type Awaiting;

    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Run the unit.
    ///
    /// Units pushed onto `stack` during the call run after this unit
    /// completes, most recently pushed first.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] if the unit cannot proceed. The error is
    /// fatal for the plan.
    fn execute(
        &mut self,
        stack: &mut ExecutionStack<Self>,
        ctx: &mut C,
    ) -> Result<Execution<Self::Awaiting>, ExecutionError>;
}
