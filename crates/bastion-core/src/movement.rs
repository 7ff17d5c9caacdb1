//! The movement phase delegate.
//!
//! [`MoveDelegate`] runs each move as a plan of [`MoveStep`]s on its own
//! [`ExecutionStack`] and records finished moves in its [`MoveLedger`]. A
//! move that suspends waiting for a decision stays in flight: the plan,
//! the half-built ledger entry and the dice counter are all part of
//! [`MoveDelegateState`] and survive a checkpoint.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bastion_change::Bridge;
use bastion_exec::{ExecutionStack, RunOutcome};
use bastion_types::{GameData, MovePhase, PlayerId, UnitHolder, UnitId};
use bastion_undo::{MoveLedger, UndoContext};

use crate::config::MovementConfig;
use crate::decision::{Decision, DecisionInbox, DecisionRequest};
use crate::dice::Dice;
use crate::error::DelegateError;
use crate::game::Game;
use crate::plan::{InFlightMove, MoveContext, MoveOrder, MoveStep};

/// The result of running a move plan.
pub type MoveOutcome = RunOutcome<DecisionRequest>;

/// Everything the movement delegate persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDelegateState {
    /// The acting player, while the phase is running.
    pub player: Option<PlayerId>,
    /// Combat or non-combat movement.
    pub phase: MovePhase,
    /// Moves made this phase.
    pub ledger: MoveLedger,
    /// The plan of the move in flight.
    pub plan: ExecutionStack<MoveStep>,
    /// The move in flight.
    pub in_flight: Option<InFlightMove>,
    /// Undelivered answers.
    pub inbox: DecisionInbox,
    /// The dice and their roll counter.
    pub dice: Dice,
}

/// Executes and undoes moves for one player.
#[derive(Debug, Clone)]
pub struct MoveDelegate {
    player: Option<PlayerId>,
    phase: MovePhase,
    ledger: MoveLedger,
    plan: ExecutionStack<MoveStep>,
    in_flight: Option<InFlightMove>,
    inbox: DecisionInbox,
    dice: Dice,
    config: MovementConfig,
}

impl MoveDelegate {
    /// Create an idle delegate.
    pub const fn new(config: MovementConfig, seed: u64) -> Self {
        Self {
            player: None,
            phase: MovePhase::Combat,
            ledger: MoveLedger::new(),
            plan: ExecutionStack::new(),
            in_flight: None,
            inbox: DecisionInbox::new(),
            dice: Dice::new(seed),
            config,
        }
    }

    /// Begin a movement phase for `player`.
    ///
    /// A move left suspended by an earlier run (typically restored from a
    /// checkpoint) is resumed before anything else.
    pub fn start(
        &mut self,
        player: PlayerId,
        phase: MovePhase,
        game: &mut Game,
    ) -> Result<MoveOutcome, DelegateError> {
        if self.plan.has_work() {
            let acting = self.player.unwrap_or(player);
            info!(player = %acting, "resuming suspended move");
            self.player = Some(acting);
            return self.run_plan(game);
        }
        self.player = Some(player);
        self.phase = phase;
        info!(player = %player, ?phase, "movement phase started");
        Ok(RunOutcome::Idle)
    }

    /// End the phase. Recorded moves can no longer be undone; a suspended
    /// move is kept.
    pub fn end(&mut self) {
        if self.plan.has_work() {
            warn!("movement phase ended with a suspended move");
        } else {
            self.player = None;
        }
        self.ledger.clear();
    }

    /// The acting player.
    pub const fn player(&self) -> Option<PlayerId> {
        self.player
    }

    /// Moves recorded this phase.
    pub const fn ledger(&self) -> &MoveLedger {
        &self.ledger
    }

    /// Whether a move is waiting on a decision.
    pub const fn is_suspended(&self) -> bool {
        self.plan.is_executing()
    }

    /// The dice used by anti-air fire.
    pub const fn dice(&self) -> &Dice {
        &self.dice
    }

    /// Execute `order`.
    ///
    /// Returns [`RunOutcome::Suspended`] if the move needs a decision; deliver
    /// it with [`answer`](Self::answer) and call [`resume`](Self::resume).
    pub fn move_units(
        &mut self,
        game: &mut Game,
        order: MoveOrder,
    ) -> Result<MoveOutcome, DelegateError> {
        let player = self.player.ok_or(DelegateError::NotStarted)?;
        if self.in_flight.is_some() || self.plan.has_work() {
            return Err(DelegateError::MoveInProgress);
        }
        check_order(&game.data, player, &order)?;
        let start = order.route.start;

        let description = format!(
            "{} moves {} units from {} to {}",
            game.data.player_name(player),
            order.units.len(),
            game.data.territory_name(start),
            game.data.territory_name(order.route.end()),
        );
        info!(player = %player, units = order.units.len(), "move started");
        self.in_flight = Some(InFlightMove::new(order, description));
        self.plan.push_all(MoveStep::plan());
        self.run_plan(game)
    }

    /// Deliver the answer to the outstanding request.
    pub fn answer(&mut self, decision: Decision) {
        self.inbox.deliver(decision);
    }

    /// Continue a suspended move.
    pub fn resume(&mut self, game: &mut Game) -> Result<MoveOutcome, DelegateError> {
        if !self.plan.has_work() {
            return Ok(RunOutcome::Idle);
        }
        self.run_plan(game)
    }

    /// Undo the move at `index`.
    ///
    /// Returns the description of the undone move.
    pub fn undo_move(&mut self, game: &mut Game, index: usize) -> Result<String, DelegateError> {
        let player = self.player.ok_or(DelegateError::NotStarted)?;
        if self.plan.has_work() {
            return Err(DelegateError::MoveInProgress);
        }
        let mut bridge = Bridge::new(&mut game.data, &mut game.history, player);
        let mut ctx = UndoContext::Movement {
            battles: &mut game.battles,
        };
        Ok(self.ledger.undo(index, &mut bridge, &mut ctx)?)
    }

    /// Mark the move at `index` as permanently non-undoable.
    pub fn set_cant_undo(
        &mut self,
        index: usize,
        reason: impl Into<String>,
    ) -> Result<(), DelegateError> {
        Ok(self.ledger.set_cant_undo(index, reason)?)
    }

    /// Snapshot the delegate for a checkpoint.
    pub fn save_state(&self) -> MoveDelegateState {
        MoveDelegateState {
            player: self.player,
            phase: self.phase,
            ledger: self.ledger.clone(),
            plan: self.plan.clone(),
            in_flight: self.in_flight.clone(),
            inbox: self.inbox.clone(),
            dice: self.dice,
        }
    }

    /// Restore a snapshot taken by [`save_state`](Self::save_state).
    pub fn load_state(&mut self, state: MoveDelegateState) {
        self.player = state.player;
        self.phase = state.phase;
        self.ledger = state.ledger;
        self.plan = state.plan;
        self.in_flight = state.in_flight;
        self.inbox = state.inbox;
        self.dice = state.dice;
    }

    fn run_plan(&mut self, game: &mut Game) -> Result<MoveOutcome, DelegateError> {
        let player = self.player.ok_or(DelegateError::NotStarted)?;
        let mut ctx = MoveContext {
            bridge: Bridge::new(&mut game.data, &mut game.history, player),
            battles: &mut game.battles,
            phase: self.phase,
            in_flight: &mut self.in_flight,
            ledger: &mut self.ledger,
            inbox: &mut self.inbox,
            dice: &mut self.dice,
            config: self.config,
        };
        let outcome = self.plan.run(&mut ctx)?;
        if let RunOutcome::Suspended(request) = &outcome {
            info!(%request, "move suspended");
        }
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Order validation
// ---------------------------------------------------------------------------

/// Reject an order the commit step could not apply. Runs before the plan is
/// pushed, so a rejected order leaves the delegate ready for the next one.
fn check_order(
    data: &GameData,
    player: PlayerId,
    order: &MoveOrder,
) -> Result<(), DelegateError> {
    if order.units.is_empty() {
        return Err(DelegateError::invalid("no units to move"));
    }
    let start = order.route.start;
    let present = data
        .holder_units(UnitHolder::Territory(start))
        .ok_or_else(|| DelegateError::invalid(format!("unknown territory {start}")))?;
    for id in &order.units {
        let owned = data.unit(*id).is_some_and(|u| u.owner == player);
        if !present.contains(id) || !owned {
            return Err(DelegateError::invalid(format!(
                "unit {id} is not ours in {}",
                data.territory_name(start)
            )));
        }
    }
    if let Some(step) = order.route.steps.iter().find(|t| data.territory(**t).is_none()) {
        return Err(DelegateError::invalid(format!("unknown territory {step}")));
    }

    let moving = |id: &UnitId| order.units.contains(id);
    for load in &order.loads {
        if !moving(&load.cargo) {
            return Err(DelegateError::invalid(format!(
                "cargo {} is not part of the move",
                load.cargo
            )));
        }
        let transport = data
            .unit(load.transport)
            .filter(|t| t.owner == player && t.kind.can_transport())
            .ok_or_else(|| {
                DelegateError::invalid(format!("{} is not one of our transports", load.transport))
            })?;
        if transport.id == load.cargo {
            return Err(DelegateError::invalid("a transport cannot carry itself"));
        }
    }
    for cargo in &order.unloads {
        let aboard = data.unit(*cargo).is_some_and(|u| u.transported_by.is_some());
        if !moving(cargo) || !aboard {
            return Err(DelegateError::invalid(format!(
                "unit {cargo} is not aboard a transport in this move"
            )));
        }
    }
    Ok(())
}
