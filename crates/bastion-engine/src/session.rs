//! Plays a scenario's turn script against the phase delegates.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use bastion_core::{
    Checkpoint, EngineConfig, Game, Load, MoveDelegate, MoveOrder, MoveOutcome, PlaceDelegate,
    ScriptedDecisionSource, drive,
};
use bastion_types::{MovePhase, Route};

use crate::error::EngineError;
use crate::scenario::{Command, LoadSpec, Names, Scenario};

/// Which delegate receives undo and end-phase commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePhase {
    /// No phase is running.
    Idle,
    /// The movement delegate is running.
    Movement,
    /// The placement delegate is running.
    Placement,
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Commands that were rejected and skipped.
    pub rejected: usize,
    /// Top-level history events.
    pub events: usize,
    /// Battles waiting to be fought.
    pub battles: usize,
    /// Whether a move is still waiting on a decision.
    pub suspended: bool,
}

/// A game in progress plus the delegates playing it.
#[derive(Debug)]
pub struct Session {
    game: Game,
    names: Names,
    movement: MoveDelegate,
    placement: PlaceDelegate,
    active: ActivePhase,
    decisions: ScriptedDecisionSource,
    config: EngineConfig,
    rejected: usize,
}

impl Session {
    /// Build the starting game of `scenario`.
    pub fn new(scenario: &Scenario, config: EngineConfig) -> Result<Self, EngineError> {
        let (game, names) = scenario.build()?;
        let decisions =
            ScriptedDecisionSource::new(scenario.decisions.iter().copied().map(Into::into));
        Ok(Self {
            game,
            names,
            movement: MoveDelegate::new(config.movement, config.engine.seed),
            placement: PlaceDelegate::new(),
            active: ActivePhase::Idle,
            decisions,
            config,
            rejected: 0,
        })
    }

    /// The game as it stands.
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// The movement delegate.
    pub const fn movement(&self) -> &MoveDelegate {
        &self.movement
    }

    /// The placement delegate.
    pub const fn placement(&self) -> &PlaceDelegate {
        &self.placement
    }

    /// The running phase.
    pub const fn active(&self) -> ActivePhase {
        self.active
    }

    /// Play every command in order.
    ///
    /// Rejected commands are logged and skipped. Anything else stops the run.
    pub async fn play(&mut self, commands: &[Command]) -> Result<Summary, EngineError> {
        for (line, command) in commands.iter().enumerate() {
            match self.execute(command).await {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    warn!(line, ?command, error = %e, "command rejected");
                    self.rejected = self.rejected.saturating_add(1);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self.summary())
    }

    /// Where checkpoints go.
    pub fn checkpoint_path(&self) -> PathBuf {
        PathBuf::from(&self.config.engine.checkpoint_path)
    }

    /// Write the game and both delegates to the checkpoint file.
    pub fn save_checkpoint(&self) -> Result<(), EngineError> {
        Checkpoint::new(
            self.game.clone(),
            self.movement.save_state(),
            self.placement.save_state(),
        )
        .save(&self.checkpoint_path())?;
        Ok(())
    }

    fn summary(&self) -> Summary {
        Summary {
            rejected: self.rejected,
            events: self.game.history.len(),
            battles: self.game.battles.len(),
            suspended: self.movement.is_suspended(),
        }
    }

    async fn execute(&mut self, command: &Command) -> Result<(), EngineError> {
        match command {
            Command::StartMovement { player, phase } => {
                let player = self.names.player(player)?;
                self.active = ActivePhase::Movement;
                let outcome = self.movement.start(player, *phase, &mut self.game)?;
                self.drive(outcome).await
            }
            Command::StartPlacement { player } => {
                let player = self.names.player(player)?;
                self.active = ActivePhase::Placement;
                self.placement.start(player);
                Ok(())
            }
            Command::Move {
                units,
                route,
                loads,
                unloads,
            } => {
                let order = self.move_order(units, route, loads, unloads)?;
                let outcome = self.movement.move_units(&mut self.game, order)?;
                self.drive(outcome).await
            }
            Command::Answer(decision) => {
                self.movement.answer((*decision).into());
                let outcome = self.movement.resume(&mut self.game)?;
                self.drive(outcome).await
            }
            Command::Place {
                units,
                at,
                producer,
            } => {
                let units = self.names.units(units)?;
                let at = self.names.territory(at)?;
                let producer = match producer {
                    Some(name) => self.names.territory(name)?,
                    None => at,
                };
                self.placement
                    .place_units(&mut self.game, &units, at, producer)?;
                Ok(())
            }
            Command::Undo { index } => {
                let undone = match self.active {
                    ActivePhase::Movement => self.movement.undo_move(&mut self.game, *index)?,
                    ActivePhase::Placement => {
                        self.placement.undo_placement(&mut self.game, *index)?
                    }
                    ActivePhase::Idle => {
                        return Err(bastion_core::DelegateError::NotStarted.into());
                    }
                };
                info!(index, action = %undone, "action undone");
                Ok(())
            }
            Command::CantUndo { index, reason } => match self.active {
                ActivePhase::Movement => {
                    self.movement.set_cant_undo(*index, reason.as_str())?;
                    Ok(())
                }
                ActivePhase::Placement | ActivePhase::Idle => {
                    Err(bastion_core::DelegateError::InvalidOrder {
                        reason: "only movement actions can be locked".to_owned(),
                    }
                    .into())
                }
            },
            Command::EndPhase => {
                self.end_phase();
                Ok(())
            }
            Command::Checkpoint => self.save_checkpoint(),
            Command::Reload => self.reload(),
        }
    }

    fn end_phase(&mut self) {
        match self.active {
            ActivePhase::Movement => {
                for line in self.movement.ledger().descriptions() {
                    info!(action = %line, "move kept");
                }
                self.movement.end();
            }
            ActivePhase::Placement => {
                for line in self.placement.ledger().descriptions() {
                    info!(action = %line, "placement kept");
                }
                self.placement.end();
            }
            ActivePhase::Idle => warn!("end_phase with no phase running"),
        }
        self.active = ActivePhase::Idle;
    }

    fn reload(&mut self) -> Result<(), EngineError> {
        self.save_checkpoint()?;
        let checkpoint = Checkpoint::load(&self.checkpoint_path())?;

        self.game = checkpoint.game;
        self.movement = MoveDelegate::new(self.config.movement, self.config.engine.seed);
        self.movement.load_state(checkpoint.movement);
        self.placement = PlaceDelegate::new();
        self.placement.load_state(checkpoint.placement);
        info!(suspended = self.movement.is_suspended(), "session reloaded");

        let Some(player) = self.movement.player() else {
            return Ok(());
        };
        if self.movement.is_suspended() {
            let outcome = self
                .movement
                .start(player, MovePhase::default(), &mut self.game)?;
            if let MoveOutcome::Suspended(request) = outcome {
                info!(%request, "restored move is waiting on a decision");
            }
        }
        Ok(())
    }

    async fn drive(&mut self, outcome: MoveOutcome) -> Result<(), EngineError> {
        let timeout = Duration::from_millis(self.config.engine.decision_timeout_ms);
        drive(
            &mut self.movement,
            &mut self.game,
            outcome,
            &mut self.decisions,
            timeout,
        )
        .await?;
        Ok(())
    }

    fn move_order(
        &self,
        units: &[String],
        route: &[String],
        loads: &[LoadSpec],
        unloads: &[String],
    ) -> Result<MoveOrder, EngineError> {
        let (start, steps) = route
            .split_first()
            .ok_or_else(|| bastion_core::DelegateError::InvalidOrder {
                reason: "route names no territories".to_owned(),
            })?;
        let steps = steps
            .iter()
            .map(|name| self.names.territory(name))
            .collect::<Result<Vec<_>, _>>()?;
        let loads = loads
            .iter()
            .map(|l| {
                Ok(Load {
                    cargo: self.names.unit(&l.cargo)?,
                    transport: self.names.unit(&l.transport)?,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        Ok(MoveOrder {
            units: self.names.units(units)?,
            route: Route::new(self.names.territory(start)?, steps),
            loads,
            unloads: self.names.units(unloads)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MAP: &str = r"
players: [Red, Blue]
territories:
  - { name: Home, owner: Red }
  - { name: Plains, owner: Blue }
  - { name: Works, owner: Blue }
units:
  - { tag: t1, owner: Red, kind: Armour, at: Home }
  - { tag: b1, owner: Red, kind: Bomber, at: Home }
  - { tag: f1, owner: Blue, kind: Factory, at: Works }
  - { tag: i1, owner: Red, kind: Infantry }
";

    fn session(script: &str, checkpoint: &str) -> (Session, Scenario) {
        let scenario = Scenario::parse(&format!("{MAP}{script}")).unwrap();
        let mut config = EngineConfig::default();
        config.engine.checkpoint_path = std::env::temp_dir()
            .join(checkpoint)
            .display()
            .to_string();
        (Session::new(&scenario, config).unwrap(), scenario)
    }

    #[tokio::test]
    async fn plays_moves_undo_and_placement() {
        let (mut session, scenario) = session(
            r"
commands:
  - start_movement: { player: Red, phase: Combat }
  - move: { units: [t1], route: [Home, Plains] }
  - undo: { index: 0 }
  - move: { units: [t1], route: [Home, Plains] }
  - end_phase
  - start_placement: { player: Red }
  - place: { units: [i1], at: Home }
",
            "bastion-session-basic.json",
        );
        let summary = session.play(&scenario.commands).await.unwrap();
        assert_eq!(summary.rejected, 0);
        assert!(!summary.suspended);
        assert_eq!(session.active(), ActivePhase::Placement);
        assert_eq!(session.placement().ledger().len(), 1);

        let red = session.names.player("Red").unwrap();
        let plains = session.names.territory("Plains").unwrap();
        assert!(!session.game().data.is_enemy_territory(plains, red));
    }

    #[tokio::test]
    async fn rejected_commands_are_skipped() {
        let (mut session, scenario) = session(
            r"
commands:
  - move: { units: [t1], route: [Home, Plains] }
  - undo: { index: 3 }
  - start_movement: { player: Red }
  - move: { units: [f1], route: [Works, Plains] }
  - move: { units: [t1], route: [Home, Plains] }
",
            "bastion-session-rejected.json",
        );
        let summary = session.play(&scenario.commands).await.unwrap();
        assert_eq!(summary.rejected, 3);
        assert_eq!(session.movement().ledger().len(), 1);
    }

    #[tokio::test]
    async fn unknown_names_abort_the_run() {
        let (mut session, scenario) = session(
            r"
commands:
  - start_movement: { player: Green }
",
            "bastion-session-unknown.json",
        );
        let err = session.play(&scenario.commands).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownName { .. }));
    }

    #[tokio::test]
    async fn suspended_raid_resumes_after_reload() {
        let (mut session, scenario) = session(
            r"
commands:
  - start_movement: { player: Red }
  - move: { units: [b1], route: [Home, Works] }
  - reload
  - answer: { bomb: true }
",
            "bastion-session-reload.json",
        );
        let summary = session.play(&scenario.commands).await.unwrap();
        assert_eq!(summary.rejected, 1);
        assert!(!summary.suspended);
        assert_eq!(summary.battles, 1);

        let works = session.names.territory("Works").unwrap();
        let raid = session.game().battles.battles_in(works).next().unwrap();
        assert!(raid.bombing_raid);
        assert_eq!(session.movement().ledger().len(), 1);
    }
}
