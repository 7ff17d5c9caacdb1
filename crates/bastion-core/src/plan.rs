//! The steps a move is executed as.
//!
//! A move is pushed onto the delegate's [`ExecutionStack`] as
//! `[LeaveBattles, FireAa, ResolveArrival]`. `FireAa` expands into one
//! [`AaVolley`] per defended territory and `ResolveArrival` pushes either
//! `CommitMove` alone or `[ChooseBombing, CommitMove]`. Only `ChooseBombing`
//! ever suspends.
//!
//! Everything a step needs to remember across a suspension lives either in
//! the step itself (volley rolls) or in the [`InFlightMove`], both of which
//! are persisted with the delegate state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bastion_change::{Bridge, Change, ChangeError, CompositeChange, factory};
use bastion_exec::{Executable, Execution, ExecutionError, ExecutionStack};
use bastion_types::{
    GameData, MovePhase, PlayerId, Route, TerritoryId, UnitHolder, UnitId, UnitProperty,
};
use bastion_undo::{MoveLedger, PendingAction};

use crate::battle::{AttackParams, BattleBook};
use crate::config::MovementConfig;
use crate::decision::{Decision, DecisionInbox, DecisionRequest};
use crate::dice::Dice;

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Cargo boarding a transport as part of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Load {
    /// The unit being carried.
    pub cargo: UnitId,
    /// The carrying transport.
    pub transport: UnitId,
}

/// A validated request to move units along a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOrder {
    /// The units to move.
    pub units: Vec<UnitId>,
    /// Where they go.
    pub route: Route,
    /// Cargo boarding transports.
    #[serde(default)]
    pub loads: Vec<Load>,
    /// Cargo leaving its transport.
    #[serde(default)]
    pub unloads: Vec<UnitId>,
}

/// The move currently being executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlightMove {
    /// The order, minus any units lost on the way.
    pub order: MoveOrder,
    /// The ledger entry being assembled.
    pub pending: PendingAction,
    /// The participant's answer to the bombing question, once given.
    pub bombing: Option<bool>,
}

impl InFlightMove {
    /// Start executing `order`.
    pub fn new(order: MoveOrder, description: impl Into<String>) -> Self {
        let pending =
            PendingAction::for_move(description, order.units.iter().copied(), order.route.clone());
        Self {
            order,
            pending,
            bombing: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a move step may touch.
pub struct MoveContext<'a> {
    /// The game, acting for the moving player.
    pub bridge: Bridge<'a>,
    /// Pending battles.
    pub battles: &'a mut BattleBook,
    /// Combat or non-combat movement.
    pub phase: MovePhase,
    /// The move being executed.
    pub in_flight: &'a mut Option<InFlightMove>,
    /// Where the finished move is recorded.
    pub ledger: &'a mut MoveLedger,
    /// Answers to suspension requests.
    pub inbox: &'a mut DecisionInbox,
    /// The phase's dice.
    pub dice: &'a mut Dice,
    /// Movement settings.
    pub config: MovementConfig,
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Anti-aircraft fire from one territory on the route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AaVolley {
    /// The defended territory.
    pub territory: TerritoryId,
    /// The dice rolled, one per air unit; kept so the volley is never
    /// re-rolled.
    pub rolls: Option<Vec<u32>>,
    /// Whether casualties have been removed.
    pub applied: bool,
}

impl AaVolley {
    /// A volley that has not fired yet.
    pub const fn new(territory: TerritoryId) -> Self {
        Self {
            territory,
            rolls: None,
            applied: false,
        }
    }
}

/// One step of a move plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveStep {
    /// Withdraw the moving units from battles pending where they start.
    LeaveBattles,
    /// Schedule anti-aircraft fire along the route.
    FireAa,
    /// Fire one anti-aircraft volley.
    AaVolley(AaVolley),
    /// Decide what happens on arrival.
    ResolveArrival,
    /// Ask whether arriving bombers raid.
    ChooseBombing,
    /// Apply the move and record it in the ledger.
    CommitMove,
}

impl MoveStep {
    /// The opening steps of every move.
    pub const fn plan() -> [Self; 3] {
        [Self::LeaveBattles, Self::FireAa, Self::ResolveArrival]
    }
}

impl<'a> Executable<MoveContext<'a>> for MoveStep {
    type Awaiting = DecisionRequest;

    fn name(&self) -> &'static str {
        match self {
            Self::LeaveBattles => "leave_battles",
            Self::FireAa => "fire_aa",
            Self::AaVolley(_) => "aa_volley",
            Self::ResolveArrival => "resolve_arrival",
            Self::ChooseBombing => "choose_bombing",
            Self::CommitMove => "commit_move",
        }
    }

    fn execute(
        &mut self,
        stack: &mut ExecutionStack<Self>,
        ctx: &mut MoveContext<'a>,
    ) -> Result<Execution<DecisionRequest>, ExecutionError> {
        match self {
            Self::LeaveBattles => leave_battles(ctx),
            Self::FireAa => fire_aa(stack, ctx),
            Self::AaVolley(volley) => volley.fire(ctx),
            Self::ResolveArrival => resolve_arrival(stack, ctx),
            Self::ChooseBombing => choose_bombing(ctx),
            Self::CommitMove => commit_move(ctx),
        }
    }
}

fn no_move(step: &'static str) -> ExecutionError {
    ExecutionError::Inconsistent {
        step,
        message: String::from("no move in flight"),
    }
}

fn failed(step: &'static str, error: &ChangeError) -> ExecutionError {
    ExecutionError::StepFailed {
        step,
        message: error.to_string(),
    }
}

fn leave_battles(ctx: &mut MoveContext<'_>) -> Result<Execution<DecisionRequest>, ExecutionError> {
    let flight = ctx.in_flight.as_ref().ok_or_else(|| no_move("leave_battles"))?;
    ctx.bridge.start_event(flight.pending.description());
    if flight.order.route.has_no_steps() {
        return Ok(Execution::Complete);
    }
    let units: BTreeSet<UnitId> = flight.order.units.iter().copied().collect();
    if ctx.battles.withdraw(flight.order.route.start, &units) {
        debug!(territory = %flight.order.route.start, "units withdrawn from pending battle");
    }
    Ok(Execution::Complete)
}

fn fire_aa(
    stack: &mut ExecutionStack<MoveStep>,
    ctx: &mut MoveContext<'_>,
) -> Result<Execution<DecisionRequest>, ExecutionError> {
    let flight = ctx.in_flight.as_ref().ok_or_else(|| no_move("fire_aa"))?;
    let data = ctx.bridge.data();
    let player = ctx.bridge.player();

    let air_moving = flight
        .order
        .units
        .iter()
        .any(|id| data.unit(*id).is_some_and(|u| u.kind.is_air()));
    if !air_moving {
        return Ok(Execution::Complete);
    }

    let mut seen = BTreeSet::new();
    let volleys: Vec<MoveStep> = flight
        .order
        .route
        .steps
        .iter()
        .copied()
        .filter(|t| seen.insert(*t))
        .filter(|t| {
            data.enemy_units_in(*t, player)
                .iter()
                .any(|u| u.kind.is_anti_air())
        })
        .map(|t| MoveStep::AaVolley(AaVolley::new(t)))
        .collect();
    debug!(volleys = volleys.len(), "anti-air fire scheduled");
    stack.push_all(volleys);
    Ok(Execution::Complete)
}

impl AaVolley {
    fn fire(
        &mut self,
        ctx: &mut MoveContext<'_>,
    ) -> Result<Execution<DecisionRequest>, ExecutionError> {
        const STEP: &str = "aa_volley";
        if self.applied {
            return Ok(Execution::Complete);
        }
        let flight = ctx.in_flight.as_mut().ok_or_else(|| no_move(STEP))?;

        let targets: Vec<UnitId> = flight
            .order
            .units
            .iter()
            .copied()
            .filter(|id| ctx.bridge.data().unit(*id).is_some_and(|u| u.kind.is_air()))
            .collect();
        if self.rolls.is_none() {
            self.rolls = Some(ctx.dice.roll_many(targets.len(), ctx.config.dice_sides));
        }
        let rolls = self.rolls.as_deref().unwrap_or_default();
        let hit_on = ctx.config.aa_hit_on;
        let casualties: BTreeSet<UnitId> = targets
            .iter()
            .zip(rolls)
            .filter(|&(_, &roll)| roll <= hit_on)
            .map(|(id, _)| *id)
            .collect();

        if !rolls.is_empty() {
            flight.pending.set_cant_undo("AA has fired.");
        }
        info!(
            territory = %self.territory,
            shots = rolls.len(),
            hits = casualties.len(),
            "anti-air fired"
        );

        if !casualties.is_empty() {
            let ids: Vec<UnitId> = casualties.iter().copied().collect();
            let units = factory::snapshot_units(ctx.bridge.data(), &ids)
                .map_err(|e| failed(STEP, &e))?;
            let start = UnitHolder::Territory(flight.order.route.start);
            let change = factory::remove_units(start, units);
            ctx.bridge.add_change(&change).map_err(|e| failed(STEP, &e))?;
            let territory = ctx.bridge.data().territory_name(self.territory);
            ctx.bridge.history().add_child(format!(
                "AA in {territory} shoots down {} units",
                casualties.len()
            ));
            flight.pending.add_change(change);
            flight.pending.remove_units(&casualties);
            flight.order.units.retain(|u| !casualties.contains(u));
        }
        self.applied = true;
        Ok(Execution::Complete)
    }
}

fn resolve_arrival(
    stack: &mut ExecutionStack<MoveStep>,
    ctx: &mut MoveContext<'_>,
) -> Result<Execution<DecisionRequest>, ExecutionError> {
    let flight = ctx.in_flight.as_ref().ok_or_else(|| no_move("resolve_arrival"))?;
    let data = ctx.bridge.data();
    let end = flight.order.route.end();

    let raid_candidate = matches!(ctx.phase, MovePhase::Combat)
        && !flight.order.units.is_empty()
        && flight
            .order
            .units
            .iter()
            .all(|id| data.unit(*id).is_some_and(|u| u.kind.is_strategic_bomber()))
        && data
            .enemy_units_in(end, ctx.bridge.player())
            .iter()
            .any(|u| u.kind.can_be_bombed());

    if raid_candidate {
        stack.push_all([MoveStep::ChooseBombing, MoveStep::CommitMove]);
    } else {
        stack.push(MoveStep::CommitMove);
    }
    Ok(Execution::Complete)
}

fn choose_bombing(ctx: &mut MoveContext<'_>) -> Result<Execution<DecisionRequest>, ExecutionError> {
    let flight = ctx.in_flight.as_mut().ok_or_else(|| no_move("choose_bombing"))?;
    if flight.bombing.is_some() {
        return Ok(Execution::Complete);
    }
    match ctx.inbox.take() {
        Some(Decision::Bomb(bomb)) => {
            info!(bomb, "bombing decision received");
            flight.bombing = Some(bomb);
            Ok(Execution::Complete)
        }
        None => Ok(Execution::Suspend(DecisionRequest::ShouldBomb {
            territory: flight.order.route.end(),
            bombers: flight.order.units.clone(),
        })),
    }
}

/// What a committed move loaded, unloaded and captured.
#[derive(Debug, Default)]
struct CommitMarks {
    loaded: BTreeSet<UnitId>,
    unloaded: BTreeSet<UnitId>,
    conquered: BTreeSet<TerritoryId>,
}

/// Build the single change a move commits, in application order: movement
/// spent, transport links, captures, then the relocation itself.
fn build_commit(
    data: &GameData,
    player: PlayerId,
    phase: MovePhase,
    order: &MoveOrder,
) -> Result<(CompositeChange, CommitMarks), ChangeError> {
    let mut composite = CompositeChange::new();
    let mut marks = CommitMarks::default();
    let route = &order.route;
    let cost = route.movement_cost();

    for id in &order.units {
        let unit = data.unit(*id).ok_or(ChangeError::UnknownUnit { unit: *id })?;
        let spent = unit.already_moved.saturating_add(cost);
        composite.add(factory::unit_property(data, *id, UnitProperty::AlreadyMoved(spent))?);
    }

    for load in &order.loads {
        composite.add(factory::unit_property(
            data,
            load.cargo,
            UnitProperty::TransportedBy(Some(load.transport)),
        )?);
        marks.loaded.insert(load.transport);
    }
    for cargo in &order.unloads {
        let unit = data.unit(*cargo).ok_or(ChangeError::UnknownUnit { unit: *cargo })?;
        if let Some(transport) = unit.transported_by {
            marks.unloaded.insert(transport);
        }
        composite.add(factory::unit_property(data, *cargo, UnitProperty::TransportedBy(None))?);
    }

    let ground_moving = order
        .units
        .iter()
        .any(|id| data.unit(*id).is_some_and(|u| !u.kind.is_air()));
    if matches!(phase, MovePhase::Combat) && ground_moving {
        for territory in &route.steps {
            if marks.conquered.contains(territory)
                || !data.is_enemy_territory(*territory, player)
                || !data.enemy_units_in(*territory, player).is_empty()
            {
                continue;
            }
            composite.add(factory::change_owner(data, *territory, Some(player))?);
            marks.conquered.insert(*territory);
        }
    }

    // A route that returns to its start leaves the units where they are.
    if route.end() != route.start && !order.units.is_empty() {
        composite.add(factory::relocate_units(data, &order.units, route.start, route.end())?);
    }
    Ok((composite, marks))
}

fn commit_move(ctx: &mut MoveContext<'_>) -> Result<Execution<DecisionRequest>, ExecutionError> {
    const STEP: &str = "commit_move";
    let flight = ctx.in_flight.as_mut().ok_or_else(|| no_move(STEP))?;
    let player = ctx.bridge.player();

    let (composite, marks) = build_commit(ctx.bridge.data(), player, ctx.phase, &flight.order)
        .map_err(|e| failed(STEP, &e))?;
    let change = Change::from(composite);
    ctx.bridge.add_change(&change).map_err(|e| failed(STEP, &e))?;

    if !flight.order.units.is_empty() {
        let destination = ctx.bridge.data().territory_name(flight.order.route.end());
        ctx.bridge.history().add_child(format!(
            "{} units arrive in {destination}",
            flight.order.units.len()
        ));
    }
    for territory in &marks.conquered {
        let name = ctx.bridge.data().territory_name(*territory);
        ctx.bridge.history().add_child(format!("{name} captured"));
    }

    flight.pending.add_change(change);
    for transport in marks.loaded {
        flight.pending.mark_loaded(transport);
    }
    for transport in marks.unloaded {
        flight.pending.mark_unloaded(transport);
    }
    for territory in marks.conquered {
        flight.pending.mark_conquered(territory);
    }

    let route = &flight.order.route;
    let attacking = matches!(ctx.phase, MovePhase::Combat)
        && !route.has_no_steps()
        && !flight.order.units.is_empty();
    if attacking {
        let enemies = ctx.bridge.data().enemy_units_in(route.end(), player);
        if !enemies.is_empty() {
            let raid = flight.bombing == Some(true);
            let target = if raid {
                enemies.iter().find(|u| u.kind.can_be_bombed()).map(|u| u.id)
            } else {
                None
            };
            let units: BTreeSet<UnitId> = flight.order.units.iter().copied().collect();
            ctx.battles.add_attack(AttackParams {
                action: flight.pending.id(),
                attacker: player,
                route,
                units: &units,
                bombing_raid: raid,
                target,
            });
        }
    }

    let done = ctx.in_flight.take().ok_or_else(|| no_move(STEP))?;
    let index = ctx.ledger.record(done.pending);
    info!(index, player = %player, "move committed");
    Ok(Execution::Complete)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{Player, Territory, Unit, UnitKind};

    use super::*;

    struct Board {
        data: GameData,
        red: PlayerId,
        home: TerritoryId,
        empty_enemy: TerritoryId,
        held_enemy: TerritoryId,
    }

    fn board() -> Board {
        let mut data = GameData::new();
        let red = PlayerId::new();
        let blue = PlayerId::new();
        data.add_player(Player::new(red, "Red"));
        data.add_player(Player::new(blue, "Blue"));
        let home = TerritoryId::new();
        let empty_enemy = TerritoryId::new();
        let held_enemy = TerritoryId::new();
        data.add_territory(Territory::new(home, "Home", Some(red)));
        data.add_territory(Territory::new(empty_enemy, "Plains", Some(blue)));
        data.add_territory(Territory::new(held_enemy, "Fort", Some(blue)));
        data.spawn_unit(
            Unit::new(UnitId::new(), blue, UnitKind::Infantry),
            UnitHolder::Territory(held_enemy),
        );
        Board {
            data,
            red,
            home,
            empty_enemy,
            held_enemy,
        }
    }

    fn tank(board: &mut Board) -> UnitId {
        let unit = Unit::new(UnitId::new(), board.red, UnitKind::Armour);
        let id = unit.id;
        board.data.spawn_unit(unit, UnitHolder::Territory(board.home));
        id
    }

    #[test]
    fn commit_captures_empty_enemy_territory_only() {
        let mut board = board();
        let id = tank(&mut board);
        let order = MoveOrder {
            units: vec![id],
            route: Route::new(board.home, vec![board.empty_enemy, board.held_enemy]),
            loads: Vec::new(),
            unloads: Vec::new(),
        };

        let (composite, marks) =
            build_commit(&board.data, board.red, MovePhase::Combat, &order).unwrap();
        assert_eq!(marks.conquered, BTreeSet::from([board.empty_enemy]));

        composite.apply(&mut board.data).unwrap();
        assert_eq!(
            board.data.territory(board.empty_enemy).and_then(|t| t.owner),
            Some(board.red)
        );
        assert!(board.data.is_enemy_territory(board.held_enemy, board.red));
        assert_eq!(board.data.unit(id).map(|u| u.already_moved), Some(2));
    }

    #[test]
    fn non_combat_move_captures_nothing() {
        let mut board = board();
        let id = tank(&mut board);
        let order = MoveOrder {
            units: vec![id],
            route: Route::new(board.home, vec![board.empty_enemy]),
            loads: Vec::new(),
            unloads: Vec::new(),
        };

        let (_, marks) =
            build_commit(&board.data, board.red, MovePhase::NonCombat, &order).unwrap();
        assert!(marks.conquered.is_empty());
    }

    #[test]
    fn commit_inverts_cleanly() {
        let mut board = board();
        let id = tank(&mut board);
        let order = MoveOrder {
            units: vec![id],
            route: Route::new(board.home, vec![board.empty_enemy]),
            loads: Vec::new(),
            unloads: Vec::new(),
        };
        let before = board.data.clone();

        let (composite, _) =
            build_commit(&board.data, board.red, MovePhase::Combat, &order).unwrap();
        composite.apply(&mut board.data).unwrap();
        composite.invert().apply(&mut board.data).unwrap();
        assert_eq!(board.data, before);
    }

    #[test]
    fn round_trip_route_keeps_units_at_start() {
        let mut board = board();
        let id = tank(&mut board);
        let order = MoveOrder {
            units: vec![id],
            route: Route::new(board.home, vec![board.empty_enemy, board.home]),
            loads: Vec::new(),
            unloads: Vec::new(),
        };
        let before = board.data.clone();

        let (composite, marks) =
            build_commit(&board.data, board.red, MovePhase::Combat, &order).unwrap();
        assert_eq!(marks.conquered, BTreeSet::from([board.empty_enemy]));
        composite.apply(&mut board.data).unwrap();
        assert!(board.data.territory(board.home).is_some_and(|t| t.units.contains(&id)));
        assert_eq!(board.data.unit(id).map(|u| u.already_moved), Some(2));

        composite.invert().apply(&mut board.data).unwrap();
        assert_eq!(board.data, before);
    }
}
