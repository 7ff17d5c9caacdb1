//! Shared board fixture for the integration tests.

#![allow(dead_code)]

use bastion_core::Game;
use bastion_core::config::MovementConfig;
use bastion_core::plan::{Load, MoveOrder};
use bastion_types::{
    GameData, Player, PlayerId, Route, Territory, TerritoryId, Unit, UnitHolder, UnitId, UnitKind,
};

/// Anti-air never hits.
pub const HARMLESS_AA: MovementConfig = MovementConfig {
    dice_sides: 6,
    aa_hit_on: 0,
};

/// Anti-air always hits.
pub const DEADLY_AA: MovementConfig = MovementConfig {
    dice_sides: 6,
    aa_hit_on: 6,
};

/// A small map: Red at home, Blue holding four territories, two sea zones.
pub struct World {
    pub game: Game,
    pub red: PlayerId,
    pub blue: PlayerId,
    /// Red land.
    pub home: TerritoryId,
    pub sea: TerritoryId,
    pub far_sea: TerritoryId,
    /// Blue land, empty.
    pub plains: TerritoryId,
    /// Blue land with an anti-air gun.
    pub flak: TerritoryId,
    /// Blue land with infantry.
    pub fort: TerritoryId,
    /// Blue land with a factory.
    pub works: TerritoryId,
}

impl World {
    pub fn new() -> Self {
        let mut data = GameData::new();
        let red = PlayerId::new();
        let blue = PlayerId::new();
        data.add_player(Player::new(red, "Red"));
        data.add_player(Player::new(blue, "Blue"));

        let home = TerritoryId::new();
        let sea = TerritoryId::new();
        let far_sea = TerritoryId::new();
        let plains = TerritoryId::new();
        let flak = TerritoryId::new();
        let fort = TerritoryId::new();
        let works = TerritoryId::new();
        data.add_territory(Territory::new(home, "Home", Some(red)));
        data.add_territory(Territory::new(sea, "Channel", None));
        data.add_territory(Territory::new(far_sea, "Open Sea", None));
        data.add_territory(Territory::new(plains, "Plains", Some(blue)));
        data.add_territory(Territory::new(flak, "Flak Line", Some(blue)));
        data.add_territory(Territory::new(fort, "Fort", Some(blue)));
        data.add_territory(Territory::new(works, "Works", Some(blue)));

        let mut world = Self {
            game: Game::new(data),
            red,
            blue,
            home,
            sea,
            far_sea,
            plains,
            flak,
            fort,
            works,
        };
        world.spawn(blue, UnitKind::AntiAir, flak);
        world.spawn(blue, UnitKind::Infantry, fort);
        world.spawn(blue, UnitKind::Factory, works);
        world
    }

    pub fn spawn(&mut self, owner: PlayerId, kind: UnitKind, at: TerritoryId) -> UnitId {
        let unit = Unit::new(UnitId::new(), owner, kind);
        let id = unit.id;
        assert!(self.game.data.spawn_unit(unit, UnitHolder::Territory(at)));
        id
    }

    pub fn units_at(&self, territory: TerritoryId) -> Vec<UnitId> {
        self.game
            .data
            .territory(territory)
            .map(|t| t.units.iter().copied().collect())
            .unwrap_or_default()
    }
}

pub fn order(units: &[UnitId], start: TerritoryId, steps: &[TerritoryId]) -> MoveOrder {
    MoveOrder {
        units: units.to_vec(),
        route: Route::new(start, steps.to_vec()),
        loads: Vec::new(),
        unloads: Vec::new(),
    }
}

pub fn load(cargo: UnitId, transport: UnitId) -> Load {
    Load { cargo, transport }
}
