//! The resumable LIFO interpreter.
//!
//! The stack holds pending units plus at most one *current* unit. While a
//! unit executes it is taken out of the stack entirely; it comes back as
//! current only if it suspends (or fails). The current unit is therefore
//! never also pending.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ExecutionError;
use crate::unit::{Executable, Execution};

/// How a call to [`ExecutionStack::run`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome<A> {
    /// Every unit completed; the stack is empty.
    Idle,
    /// The current unit is waiting for outside input.
    Suspended(A),
}

impl<A> RunOutcome<A> {
    /// Whether the run completed.
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// A resumable LIFO interpreter over units of type `E`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStack<E> {
    /// Units waiting to run; the last element runs next.
    pending: Vec<E>,
    /// The unit that suspended mid-execution, if any.
    current: Option<E>,
}

impl<E> Default for ExecutionStack<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ExecutionStack<E> {
    /// Create an empty stack.
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            current: None,
        }
    }

    /// Push one unit; it runs next.
    pub fn push(&mut self, unit: E) {
        self.pending.push(unit);
    }

    /// Push a sequence of units so that the first element runs next and the
    /// rest follow in order.
    pub fn push_all<I>(&mut self, units: I)
    where
        I: IntoIterator<Item = E>,
        I::IntoIter: DoubleEndedIterator,
    {
        self.pending.extend(units.into_iter().rev());
    }

    /// Whether no units are pending. A suspended current unit is not
    /// counted; see [`is_executing`](Self::is_executing).
    pub const fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether a unit suspended mid-execution and will be resumed first.
    pub const fn is_executing(&self) -> bool {
        self.current.is_some()
    }

    /// Whether running the stack would do anything.
    pub const fn has_work(&self) -> bool {
        self.is_executing() || !self.is_empty()
    }

    /// The suspended unit, if any.
    pub const fn current(&self) -> Option<&E> {
        self.current.as_ref()
    }

    /// The number of pending units.
    pub const fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Run until every unit completed or one suspends.
    ///
    /// A suspended current unit from an earlier run is re-invoked before any
    /// pending unit.
    ///
    /// # Errors
    ///
    /// Returns the [`ExecutionError`] raised by a unit. The failing unit is
    /// kept as current so the stack state still describes where the plan
    /// stopped.
    pub fn run<C>(&mut self, ctx: &mut C) -> Result<RunOutcome<E::Awaiting>, ExecutionError>
    where
        C: ?Sized,
        E: Executable<C>,
    {
        loop {
            let mut unit = if let Some(resumed) = self.current.take() {
                debug!(step = resumed.name(), "resuming suspended step");
                resumed
            } else if let Some(next) = self.pending.pop() {
                next
            } else {
                return Ok(RunOutcome::Idle);
            };

            match unit.execute(self, ctx) {
                Ok(Execution::Complete) => {
                    debug!(step = unit.name(), pending = self.pending.len(), "step complete");
                }
                Ok(Execution::Suspend(awaiting)) => {
                    debug!(step = unit.name(), pending = self.pending.len(), "step suspended");
                    self.current = Some(unit);
                    return Ok(RunOutcome::Suspended(awaiting));
                }
                Err(e) => {
                    warn!(step = unit.name(), error = %e, "step failed");
                    self.current = Some(unit);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    /// Records what ran and answers suspensions.
    #[derive(Debug, Default)]
    struct Trace {
        log: Vec<String>,
        answer: Option<bool>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    enum Step {
        Say(String),
        Expand { name: String, children: Vec<String> },
        Ask { name: String, started: bool },
        Fail,
    }

    fn say(name: &str) -> Step {
        Step::Say(name.to_owned())
    }

    impl Executable<Trace> for Step {
        type Awaiting = String;

        fn name(&self) -> &'static str {
            match self {
                Self::Say(_) => "say",
                Self::Expand { .. } => "expand",
                Self::Ask { .. } => "ask",
                Self::Fail => "fail",
            }
        }

        fn execute(
            &mut self,
            stack: &mut ExecutionStack<Self>,
            ctx: &mut Trace,
        ) -> Result<Execution<String>, ExecutionError> {
            match self {
                Self::Say(name) => {
                    ctx.log.push(name.clone());
                    Ok(Execution::Complete)
                }
                Self::Expand { name, children } => {
                    ctx.log.push(name.clone());
                    stack.push_all(children.iter().map(|c| say(c)).collect::<Vec<_>>());
                    Ok(Execution::Complete)
                }
                Self::Ask { name, started } => {
                    if !*started {
                        ctx.log.push(format!("{name}:start"));
                        *started = true;
                    }
                    match ctx.answer.take() {
                        Some(answer) => {
                            ctx.log.push(format!("{name}:{answer}"));
                            Ok(Execution::Complete)
                        }
                        None => Ok(Execution::Suspend(format!("{name} needs an answer"))),
                    }
                }
                Self::Fail => Err(ExecutionError::StepFailed {
                    step: "fail",
                    message: String::from("boom"),
                }),
            }
        }
    }

    #[test]
    fn push_all_runs_in_collection_order() {
        let mut stack = ExecutionStack::new();
        stack.push_all([say("X"), say("Y"), say("Z")]);
        let mut trace = Trace::default();

        assert_eq!(stack.run(&mut trace).unwrap(), RunOutcome::Idle);
        assert_eq!(trace.log, ["X", "Y", "Z"]);
        assert!(stack.is_empty());
        assert!(!stack.is_executing());
    }

    #[test]
    fn pushed_units_run_before_remaining_pending() {
        let mut stack = ExecutionStack::new();
        stack.push_all([
            say("X"),
            Step::Expand {
                name: String::from("Y"),
                children: vec![String::from("P"), String::from("Q")],
            },
            say("Z"),
        ]);
        let mut trace = Trace::default();

        stack.run(&mut trace).unwrap();
        assert_eq!(trace.log, ["X", "Y", "P", "Q", "Z"]);
    }

    #[test]
    fn single_push_is_lifo() {
        let mut stack = ExecutionStack::new();
        stack.push(say("first"));
        stack.push(say("second"));
        let mut trace = Trace::default();

        stack.run(&mut trace).unwrap();
        assert_eq!(trace.log, ["second", "first"]);
    }

    #[test]
    fn suspended_unit_is_current_not_pending() {
        let mut stack = ExecutionStack::new();
        stack.push_all([
            say("X"),
            Step::Ask {
                name: String::from("Y"),
                started: false,
            },
            say("Z"),
        ]);
        let mut trace = Trace::default();

        let outcome = stack.run(&mut trace).unwrap();
        assert_eq!(outcome, RunOutcome::Suspended(String::from("Y needs an answer")));
        assert!(stack.is_executing());
        assert_eq!(stack.pending_len(), 1);
        assert_eq!(stack.current().map(|step| step.name()), Some("ask"));
        assert_eq!(trace.log, ["X", "Y:start"]);
    }

    #[test]
    fn resumes_from_checkpoint_without_rerunning_completed_units() {
        let mut stack = ExecutionStack::new();
        stack.push_all([
            say("X"),
            Step::Ask {
                name: String::from("Y"),
                started: false,
            },
            say("Z"),
        ]);
        let mut trace = Trace::default();
        stack.run(&mut trace).unwrap();

        let saved = serde_json::to_string(&stack).unwrap();
        drop(stack);
        let mut restored: ExecutionStack<Step> = serde_json::from_str(&saved).unwrap();
        assert!(restored.is_executing());

        let mut resumed = Trace {
            log: Vec::new(),
            answer: Some(true),
        };
        assert_eq!(restored.run(&mut resumed).unwrap(), RunOutcome::Idle);
        assert_eq!(resumed.log, ["Y:true", "Z"]);
        assert!(!restored.has_work());
    }

    #[test]
    fn rerunning_without_answer_stays_suspended() {
        let mut stack = ExecutionStack::new();
        stack.push(Step::Ask {
            name: String::from("Y"),
            started: false,
        });
        let mut trace = Trace::default();

        assert!(!stack.run(&mut trace).unwrap().is_idle());
        assert!(!stack.run(&mut trace).unwrap().is_idle());
        assert_eq!(trace.log, ["Y:start"]);
    }

    #[test]
    fn failing_unit_stays_current() {
        let mut stack = ExecutionStack::new();
        stack.push_all([Step::Fail, say("after")]);
        let mut trace = Trace::default();

        let err = stack.run(&mut trace).unwrap_err();
        assert!(matches!(err, ExecutionError::StepFailed { step: "fail", .. }));
        assert!(stack.is_executing());
        assert_eq!(stack.pending_len(), 1);
        assert!(trace.log.is_empty());
    }
}
