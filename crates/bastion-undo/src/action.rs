//! Pending and committed undoable actions.
//!
//! An action is assembled as a [`PendingAction`]: the delegate that performs
//! a move or placement adds changes to it and marks what it loaded,
//! unloaded and captured. Recording it in the [`MoveLedger`] converts it into
//! an [`UndoableAction`], which is read-only apart from the dependency edges
//! the ledger maintains and a sticky "cannot undo" reason.
//!
//! [`MoveLedger`]: crate::MoveLedger

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use bastion_change::{Bridge, Change, CompositeChange};
use bastion_types::{ActionId, GameData, PlayerId, Route, TerritoryId, UnitId};

use crate::UndoError;
use crate::context::{BattleTracker, UndoContext};

// ---------------------------------------------------------------------------
// Variant payloads
// ---------------------------------------------------------------------------

/// What an undoable move tracks beyond the base action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoableMove {
    /// The route the units took.
    pub route: Route,
    /// Territories captured by the move.
    pub conquered: BTreeSet<TerritoryId>,
    /// Transports that took on cargo during the move.
    pub loaded: BTreeSet<UnitId>,
    /// Transports that dropped cargo during the move.
    pub unloaded: BTreeSet<UnitId>,
}

/// What an undoable placement tracks beyond the base action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoablePlacement {
    /// The territory whose production capacity was used.
    pub producer: TerritoryId,
    /// Where the units were placed.
    pub at: TerritoryId,
}

/// The closed set of undoable action kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Units moved along a route.
    Move(UndoableMove),
    /// Units placed from the placement pool.
    Placement(UndoablePlacement),
}

impl ActionKind {
    /// Short name of the kind, for logs and errors.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::Placement(_) => "placement",
        }
    }

    /// The move payload, if this is a move.
    pub const fn as_move(&self) -> Option<&UndoableMove> {
        match self {
            Self::Move(m) => Some(m),
            Self::Placement(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// PendingAction
// ---------------------------------------------------------------------------

/// An action being assembled, before it is recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    id: ActionId,
    description: String,
    change: CompositeChange,
    units: BTreeSet<UnitId>,
    reason_cant_undo: Option<String>,
    kind: ActionKind,
}

impl PendingAction {
    /// Start a move of `units` along `route`.
    pub fn for_move(
        description: impl Into<String>,
        units: impl IntoIterator<Item = UnitId>,
        route: Route,
    ) -> Self {
        Self {
            id: ActionId::new(),
            description: description.into(),
            change: CompositeChange::new(),
            units: units.into_iter().collect(),
            reason_cant_undo: None,
            kind: ActionKind::Move(UndoableMove {
                route,
                conquered: BTreeSet::new(),
                loaded: BTreeSet::new(),
                unloaded: BTreeSet::new(),
            }),
        }
    }

    /// Start a placement of `units` at `at`, produced by `producer`.
    pub fn for_placement(
        description: impl Into<String>,
        units: impl IntoIterator<Item = UnitId>,
        producer: TerritoryId,
        at: TerritoryId,
    ) -> Self {
        Self {
            id: ActionId::new(),
            description: description.into(),
            change: CompositeChange::new(),
            units: units.into_iter().collect(),
            reason_cant_undo: None,
            kind: ActionKind::Placement(UndoablePlacement { producer, at }),
        }
    }

    /// The action's identifier.
    pub const fn id(&self) -> ActionId {
        self.id
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The units the action affects.
    pub const fn units(&self) -> &BTreeSet<UnitId> {
        &self.units
    }

    /// The accumulated change.
    pub const fn change(&self) -> &CompositeChange {
        &self.change
    }

    /// The kind-specific payload.
    pub const fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// Append a change that was applied as part of this action.
    pub fn add_change(&mut self, change: impl Into<Change>) {
        self.change.add(change);
    }

    /// Mark the action as permanently non-undoable.
    ///
    /// The first reason set wins.
    pub fn set_cant_undo(&mut self, reason: impl Into<String>) {
        if self.reason_cant_undo.is_none() {
            self.reason_cant_undo = Some(reason.into());
        }
    }

    /// The sticky reason, if one was set.
    pub fn reason_cant_undo(&self) -> Option<&str> {
        self.reason_cant_undo.as_deref()
    }

    /// Drop `units` from the affected set (casualties taken on the way).
    pub fn remove_units(&mut self, units: &BTreeSet<UnitId>) {
        self.units.retain(|u| !units.contains(u));
    }

    /// Record that `transport` took on cargo. Ignored for placements.
    pub fn mark_loaded(&mut self, transport: UnitId) {
        if let ActionKind::Move(m) = &mut self.kind {
            m.loaded.insert(transport);
        }
    }

    /// Record that `transport` dropped cargo. Ignored for placements.
    pub fn mark_unloaded(&mut self, transport: UnitId) {
        if let ActionKind::Move(m) = &mut self.kind {
            m.unloaded.insert(transport);
        }
    }

    /// Record that the move captured `territory`. Ignored for placements.
    pub fn mark_conquered(&mut self, territory: TerritoryId) {
        if let ActionKind::Move(m) = &mut self.kind {
            m.conquered.insert(territory);
        }
    }
}

// ---------------------------------------------------------------------------
// UndoableAction
// ---------------------------------------------------------------------------

/// A committed action in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoableAction {
    id: ActionId,
    pub(crate) index: usize,
    description: String,
    change: CompositeChange,
    units: BTreeSet<UnitId>,
    pub(crate) reason_cant_undo: Option<String>,
    /// Earlier actions this one depends on.
    pub(crate) dependencies: BTreeSet<ActionId>,
    /// Later actions that depend on this one.
    pub(crate) dependents: BTreeSet<ActionId>,
    kind: ActionKind,
}

impl UndoableAction {
    pub(crate) fn commit(pending: PendingAction, index: usize) -> Self {
        Self {
            id: pending.id,
            index,
            description: pending.description,
            change: pending.change,
            units: pending.units,
            reason_cant_undo: pending.reason_cant_undo,
            dependencies: BTreeSet::new(),
            dependents: BTreeSet::new(),
            kind: pending.kind,
        }
    }

    /// The action's identifier.
    pub const fn id(&self) -> ActionId {
        self.id
    }

    /// Position in the ledger, zero-based.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The change that was applied; its inverse is applied on undo.
    pub const fn change(&self) -> &CompositeChange {
        &self.change
    }

    /// The units the action affects.
    pub const fn units(&self) -> &BTreeSet<UnitId> {
        &self.units
    }

    /// The kind-specific payload.
    pub const fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The sticky reason, if one was set.
    pub fn reason_cant_undo(&self) -> Option<&str> {
        self.reason_cant_undo.as_deref()
    }

    /// Earlier actions this one depends on.
    pub const fn dependencies(&self) -> &BTreeSet<ActionId> {
        &self.dependencies
    }

    /// Later actions depending on this one.
    pub const fn dependents(&self) -> &BTreeSet<ActionId> {
        &self.dependents
    }

    /// Whether the action may be undone right now.
    pub fn can_undo(&self) -> bool {
        self.reason_cant_undo.is_none() && self.dependents.is_empty()
    }

    /// Whether `self` (recorded later) depends on `earlier`.
    ///
    /// Any shared unit creates a dependency. Moves additionally depend on
    /// earlier moves through transports, captures and unloads.
    pub fn depends_on(&self, earlier: &Self) -> bool {
        if !self.units.is_disjoint(&earlier.units) {
            return true;
        }
        let (ActionKind::Move(later), ActionKind::Move(before)) = (&self.kind, &earlier.kind)
        else {
            return false;
        };

        // Moving a transport the earlier move loaded, or loading a
        // transport the earlier move brought in.
        if !self.units.is_disjoint(&before.loaded) || !later.loaded.is_disjoint(&earlier.units) {
            return true;
        }
        if later
            .route
            .all_territories()
            .any(|t| before.conquered.contains(&t))
        {
            return true;
        }
        later
            .unloaded
            .iter()
            .any(|t| before.loaded.contains(t) || before.unloaded.contains(t))
    }
}

// ---------------------------------------------------------------------------
// Undo
// ---------------------------------------------------------------------------

impl UndoableAction {
    /// Reverse this action through `bridge`, then run the kind-specific hook.
    ///
    /// `arrived_by` is the route a move's units used to enter the start of
    /// this move, if an earlier ledger entry brought them there. Nothing is
    /// changed when an error is returned.
    pub(crate) fn undo(
        &self,
        bridge: &mut Bridge<'_>,
        ctx: &mut UndoContext<'_>,
        arrived_by: Option<&Route>,
    ) -> Result<(), UndoError> {
        if let Some(reason) = &self.reason_cant_undo {
            return Err(UndoError::CannotUndo {
                index: self.index,
                reason: reason.clone(),
            });
        }
        let matches_context = matches!(
            (&self.kind, &*ctx),
            (ActionKind::Move(_), UndoContext::Movement { .. })
                | (ActionKind::Placement(_), UndoContext::Placement { .. })
        );
        if !matches_context {
            return Err(UndoError::ContextMismatch {
                index: self.index,
                kind: self.kind.name(),
                context: ctx.name(),
            });
        }

        let inverse = Change::from(self.change.invert());
        inverse.apply(&mut bridge.data().clone())?;
        let text = format!("{} undoes: {}", bridge.player_name(), self.description);
        bridge.start_event(text);
        bridge.add_change(&inverse)?;

        match (&self.kind, ctx) {
            (ActionKind::Move(mv), UndoContext::Movement { battles }) => {
                self.undo_move_battles(mv, bridge.data(), bridge.player(), &mut **battles, arrived_by);
            }
            (ActionKind::Placement(placement), UndoContext::Placement { production }) => {
                production.remove(placement.producer, &self.units);
            }
            _ => {}
        }
        debug!(action = %self.id, index = self.index, kind = self.kind.name(), "action undone");
        Ok(())
    }

    /// Withdraw the move from the battles it provoked and put its units back
    /// into battles pending where they came from.
    fn undo_move_battles(
        &self,
        mv: &UndoableMove,
        data: &GameData,
        player: PlayerId,
        battles: &mut dyn BattleTracker,
        arrived_by: Option<&Route>,
    ) {
        battles.undo_battle(self.id, &mv.route, &self.units);

        let start = mv.route.start;
        for battle in battles.pending_battles(start) {
            let target = if battle.bombing_raid {
                data.enemy_units_in(start, player)
                    .into_iter()
                    .find(|u| u.kind.can_be_bombed())
                    .map(|u| u.id)
            } else {
                None
            };
            battles.restore_attack(battle.id, arrived_by, &self.units, target);
        }
    }
}
