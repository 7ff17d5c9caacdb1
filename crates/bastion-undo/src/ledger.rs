//! The per-phase move ledger: an ordered, index-addressed log of undoable
//! actions.
//!
//! # Design
//!
//! - **Dense indices**: after every mutation each entry's index equals its
//!   position (zero-based, no gaps).
//! - **Backward edges**: dependencies only ever point at earlier entries.
//! - **All or nothing**: a failed undo leaves the game, the ledger and the
//!   undo collaborators untouched.
//! - **Persistence by ID**: edges are stored as [`ActionId`]s and re-linked
//!   and verified when a ledger is deserialized.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bastion_change::Bridge;
use bastion_types::{ActionId, Route};

use crate::action::{ActionKind, PendingAction, UndoableAction};
use crate::context::UndoContext;
use crate::{LedgerError, UndoError};

/// The ordered collection of undoable actions for the active phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<UndoableAction>", into = "Vec<UndoableAction>")]
pub struct MoveLedger {
    actions: Vec<UndoableAction>,
}

impl MoveLedger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Return the number of recorded actions.
    pub const fn len(&self) -> usize {
        self.actions.len()
    }

    /// Return whether no actions are recorded.
    pub const fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// All recorded actions, in order.
    pub fn actions(&self) -> &[UndoableAction] {
        &self.actions
    }

    /// The action at `index`.
    pub fn get(&self, index: usize) -> Option<&UndoableAction> {
        self.actions.get(index)
    }

    /// One line per action, for display.
    pub fn descriptions(&self) -> Vec<String> {
        self.actions
            .iter()
            .map(|a| format!("{}: {}", a.index(), a.description()))
            .collect()
    }

    /// Commit `pending`, linking it to every earlier action it depends on.
    ///
    /// Returns the index of the new entry.
    pub fn record(&mut self, pending: PendingAction) -> usize {
        let index = self.actions.len();
        let mut action = UndoableAction::commit(pending, index);
        for earlier in &mut self.actions {
            if action.depends_on(earlier) {
                action.dependencies.insert(earlier.id());
                earlier.dependents.insert(action.id());
            }
        }
        info!(
            action = %action.id(),
            index,
            kind = action.kind().name(),
            dependencies = action.dependencies.len(),
            "action recorded"
        );
        self.actions.push(action);
        self.reindex();
        index
    }

    /// Attach a sticky "cannot undo" reason to the action at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`UndoError::NoActions`] or [`UndoError::IndexOutOfRange`].
    pub fn set_cant_undo(&mut self, index: usize, reason: impl Into<String>) -> Result<(), UndoError> {
        let len = self.actions.len();
        if len == 0 {
            return Err(UndoError::NoActions);
        }
        let action = self
            .actions
            .get_mut(index)
            .ok_or(UndoError::IndexOutOfRange { index, len })?;
        if action.reason_cant_undo.is_none() {
            action.reason_cant_undo = Some(reason.into());
        }
        Ok(())
    }

    /// Check whether the action at `index` could be undone right now.
    ///
    /// # Errors
    ///
    /// Returns the rejection [`MoveLedger::undo`] would return.
    pub fn check_undo(&self, index: usize) -> Result<&UndoableAction, UndoError> {
        if self.actions.is_empty() {
            return Err(UndoError::NoActions);
        }
        let action = self.actions.get(index).ok_or(UndoError::IndexOutOfRange {
            index,
            len: self.actions.len(),
        })?;
        if let Some(reason) = action.reason_cant_undo() {
            return Err(UndoError::CannotUndo {
                index,
                reason: reason.to_owned(),
            });
        }
        if let Some(dependent) = action
            .dependents()
            .iter()
            .filter_map(|id| self.position_of(*id))
            .min()
        {
            return Err(UndoError::BlockedByDependent { index, dependent });
        }
        Ok(action)
    }

    /// Undo the action at `index` and remove it from the ledger.
    ///
    /// Returns the description of the undone action.
    ///
    /// # Errors
    ///
    /// Returns a rejection ([`UndoError::is_rejection`]) if the action may
    /// not be undone, or [`UndoError::Change`] if its inverted change does
    /// not apply. In both cases nothing was changed.
    pub fn undo(
        &mut self,
        index: usize,
        bridge: &mut Bridge<'_>,
        ctx: &mut UndoContext<'_>,
    ) -> Result<String, UndoError> {
        let action = self.check_undo(index)?;
        let arrived_by = self.arrived_by(index);
        action.undo(bridge, ctx, arrived_by.as_ref())?;

        let removed = self.actions.remove(index);
        for remaining in &mut self.actions {
            remaining.dependents.remove(&removed.id());
            remaining.dependencies.remove(&removed.id());
        }
        self.reindex();
        info!(
            action = %removed.id(),
            index,
            remaining = self.actions.len(),
            "action removed from ledger"
        );
        Ok(removed.description().to_owned())
    }

    /// Forget every action. Called at phase end.
    pub fn clear(&mut self) {
        debug!(discarded = self.actions.len(), "ledger cleared");
        self.actions.clear();
    }

    /// The route an earlier move used to bring the units of the move at
    /// `index` into its start territory.
    fn arrived_by(&self, index: usize) -> Option<Route> {
        let target = self.actions.get(index)?;
        let start = target.kind().as_move()?.route.start;
        self.actions
            .get(..index)?
            .iter()
            .rev()
            .filter(|earlier| !earlier.units().is_disjoint(target.units()))
            .find_map(|earlier| match earlier.kind() {
                ActionKind::Move(mv) if mv.route.end() == start => Some(mv.route.clone()),
                _ => None,
            })
    }

    fn position_of(&self, id: ActionId) -> Option<usize> {
        self.actions.iter().position(|a| a.id() == id)
    }

    fn reindex(&mut self) {
        for (position, action) in self.actions.iter_mut().enumerate() {
            action.index = position;
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

impl TryFrom<Vec<UndoableAction>> for MoveLedger {
    type Error = LedgerError;

    fn try_from(actions: Vec<UndoableAction>) -> Result<Self, Self::Error> {
        let mut positions = BTreeMap::new();
        for (position, action) in actions.iter().enumerate() {
            if positions.insert(action.id(), position).is_some() {
                return Err(corrupt(action, "duplicate action id"));
            }
        }

        for (position, action) in actions.iter().enumerate() {
            for id in action.dependencies() {
                let other = positions
                    .get(id)
                    .and_then(|p| actions.get(*p).map(|a| (*p, a)));
                match other {
                    None => return Err(corrupt(action, "depends on an unknown action")),
                    Some((p, _)) if p >= position => {
                        return Err(corrupt(action, "depends on a later action"));
                    }
                    Some((_, earlier)) if !earlier.dependents().contains(&action.id()) => {
                        return Err(corrupt(action, "dependency missing its back-reference"));
                    }
                    Some(_) => {}
                }
            }
            for id in action.dependents() {
                let other = positions
                    .get(id)
                    .and_then(|p| actions.get(*p).map(|a| (*p, a)));
                match other {
                    None => return Err(corrupt(action, "dependent is an unknown action")),
                    Some((p, _)) if p <= position => {
                        return Err(corrupt(action, "dependent precedes the action"));
                    }
                    Some((_, later)) if !later.dependencies().contains(&action.id()) => {
                        return Err(corrupt(action, "dependent missing its back-reference"));
                    }
                    Some(_) => {}
                }
            }
        }

        let mut ledger = Self { actions };
        ledger.reindex();
        Ok(ledger)
    }
}

impl From<MoveLedger> for Vec<UndoableAction> {
    fn from(ledger: MoveLedger) -> Self {
        ledger.actions
    }
}

fn corrupt(action: &UndoableAction, reason: &str) -> LedgerError {
    LedgerError::Corrupt {
        action: action.id(),
        reason: reason.to_owned(),
    }
}
