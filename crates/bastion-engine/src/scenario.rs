//! Scenario files: the starting map and a script of turn commands.
//!
//! Everything in a scenario refers to players, territories and units by
//! name. [`Scenario::build`] creates the game and a [`Names`] table that
//! turns those names back into IDs.
//!
//! ```yaml
//! players: [Red, Blue]
//! territories:
//!   - { name: Home, owner: Red }
//!   - { name: Works, owner: Blue }
//! units:
//!   - { tag: b1, owner: Red, kind: Bomber, at: Home }
//!   - { tag: f1, owner: Blue, kind: Factory, at: Works }
//! decisions:
//!   - bomb: true
//! commands:
//!   - start_movement: { player: Red }
//!   - move: { units: [b1], route: [Home, Works] }
//!   - end_phase
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use bastion_core::{Decision, Game};
use bastion_types::{
    GameData, MovePhase, Player, PlayerId, Territory, TerritoryId, Unit, UnitHolder, UnitId,
    UnitKind,
};

use crate::error::EngineError;

/// A parsed scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Player names.
    pub players: Vec<String>,
    /// The map.
    pub territories: Vec<TerritorySpec>,
    /// Starting units.
    #[serde(default)]
    pub units: Vec<UnitSpec>,
    /// Answers fed to suspended moves, in order.
    #[serde(default)]
    pub decisions: Vec<DecisionSpec>,
    /// The turn script.
    pub commands: Vec<Command>,
}

/// A territory in a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct TerritorySpec {
    /// Unique display name.
    pub name: String,
    /// Owning player's name; absent for sea zones.
    #[serde(default)]
    pub owner: Option<String>,
}

/// A starting unit in a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitSpec {
    /// Name commands use for the unit.
    pub tag: String,
    /// Owning player's name.
    pub owner: String,
    /// Unit kind.
    pub kind: UnitKind,
    /// Territory name; absent puts the unit in the owner's placement pool.
    #[serde(default)]
    pub at: Option<String>,
}

/// A scripted answer.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSpec {
    /// Answer to a bombing question.
    Bomb(bool),
}

impl From<DecisionSpec> for Decision {
    fn from(spec: DecisionSpec) -> Self {
        match spec {
            DecisionSpec::Bomb(bomb) => Self::Bomb(bomb),
        }
    }
}

/// Cargo boarding a transport, by tag.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadSpec {
    /// The carried unit.
    pub cargo: String,
    /// The transport.
    pub transport: String,
}

/// One line of the turn script.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Begin a movement phase.
    StartMovement {
        /// Acting player.
        player: String,
        /// Combat or non-combat movement.
        #[serde(default)]
        phase: MovePhase,
    },
    /// Begin a placement phase.
    StartPlacement {
        /// Acting player.
        player: String,
    },
    /// Move units along a route of territory names.
    Move {
        /// Unit tags.
        units: Vec<String>,
        /// Start territory followed by each step.
        route: Vec<String>,
        /// Cargo boarding transports.
        #[serde(default)]
        loads: Vec<LoadSpec>,
        /// Tags of cargo leaving its transport.
        #[serde(default)]
        unloads: Vec<String>,
    },
    /// Answer the suspended move directly.
    Answer(DecisionSpec),
    /// Place units from the pool.
    Place {
        /// Unit tags.
        units: Vec<String>,
        /// Destination territory.
        at: String,
        /// Producing territory; defaults to the destination.
        #[serde(default)]
        producer: Option<String>,
    },
    /// Undo the action at an index of the active phase's ledger.
    Undo {
        /// Ledger index.
        index: usize,
    },
    /// Mark an action of the active phase as permanently non-undoable.
    CantUndo {
        /// Ledger index.
        index: usize,
        /// Why it cannot be undone.
        reason: String,
    },
    /// End the active phase.
    EndPhase,
    /// Write a checkpoint.
    Checkpoint,
    /// Write a checkpoint and continue from a fresh copy read back from disk.
    Reload,
}

impl Scenario {
    /// Read a scenario file.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse scenario YAML.
    pub fn parse(yaml: &str) -> Result<Self, EngineError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Create the starting game.
    pub fn build(&self) -> Result<(Game, Names), EngineError> {
        let mut data = GameData::new();
        let mut names = Names::default();

        for name in &self.players {
            let id = PlayerId::new();
            data.add_player(Player::new(id, name.as_str()));
            names.players.insert(name.clone(), id);
        }
        for spec in &self.territories {
            let owner = spec.owner.as_deref().map(|o| names.player(o)).transpose()?;
            let id = TerritoryId::new();
            data.add_territory(Territory::new(id, spec.name.as_str(), owner));
            names.territories.insert(spec.name.clone(), id);
        }
        for spec in &self.units {
            let owner = names.player(&spec.owner)?;
            let holder = match spec.at.as_deref() {
                Some(at) => UnitHolder::Territory(names.territory(at)?),
                None => UnitHolder::Player(owner),
            };
            let id = UnitId::new();
            data.spawn_unit(Unit::new(id, owner, spec.kind), holder);
            names.units.insert(spec.tag.clone(), id);
        }
        Ok((Game::new(data), names))
    }
}

/// Name-to-ID lookup for one built scenario.
#[derive(Debug, Clone, Default)]
pub struct Names {
    players: BTreeMap<String, PlayerId>,
    territories: BTreeMap<String, TerritoryId>,
    units: BTreeMap<String, UnitId>,
}

impl Names {
    /// Look up a player.
    pub fn player(&self, name: &str) -> Result<PlayerId, EngineError> {
        lookup(&self.players, "player", name)
    }

    /// Look up a territory.
    pub fn territory(&self, name: &str) -> Result<TerritoryId, EngineError> {
        lookup(&self.territories, "territory", name)
    }

    /// Look up a unit by tag.
    pub fn unit(&self, tag: &str) -> Result<UnitId, EngineError> {
        lookup(&self.units, "unit", tag)
    }

    /// Look up several units.
    pub fn units(&self, tags: &[String]) -> Result<Vec<UnitId>, EngineError> {
        tags.iter().map(|t| self.unit(t)).collect()
    }
}

fn lookup<T: Copy>(
    table: &BTreeMap<String, T>,
    kind: &'static str,
    name: &str,
) -> Result<T, EngineError> {
    table
        .get(name)
        .copied()
        .ok_or_else(|| EngineError::UnknownName {
            kind,
            name: name.to_owned(),
        })
}
