//! Constructors for primitive [`Change`]s.
//!
//! Functions that take `&GameData` capture the current value of whatever
//! they change, which is what makes the resulting change invertible. None of
//! them mutate the game.

use rust_decimal::Decimal;

use bastion_types::{
    GameData, PlayerId, ResourceKind, TerritoryId, Unit, UnitHolder, UnitId, UnitProperty,
};

use crate::change::{Change, CompositeChange};
use crate::ChangeError;

/// Clone the registry entries for `ids`, in order.
///
/// # Errors
///
/// Returns [`ChangeError::UnknownUnit`] for the first unregistered ID.
pub fn snapshot_units(data: &GameData, ids: &[UnitId]) -> Result<Vec<Unit>, ChangeError> {
    ids.iter()
        .map(|id| {
            data.unit(*id)
                .cloned()
                .ok_or(ChangeError::UnknownUnit { unit: *id })
        })
        .collect()
}

/// Place `units` into `holder`.
pub const fn add_units(holder: UnitHolder, units: Vec<Unit>) -> Change {
    Change::AddUnits { holder, units }
}

/// Take `units` out of `holder`.
pub const fn remove_units(holder: UnitHolder, units: Vec<Unit>) -> Change {
    Change::RemoveUnits { holder, units }
}

/// Move units between two territories: add at `to`, then remove at `from`.
///
/// # Errors
///
/// Returns [`ChangeError::UnknownUnit`] if a unit is not registered.
pub fn relocate_units(
    data: &GameData,
    ids: &[UnitId],
    from: TerritoryId,
    to: TerritoryId,
) -> Result<Change, ChangeError> {
    let units = snapshot_units(data, ids)?;
    let mut composite = CompositeChange::new();
    composite.add(add_units(UnitHolder::Territory(to), units.clone()));
    composite.add(remove_units(UnitHolder::Territory(from), units));
    Ok(composite.into())
}

/// Set one property of `unit` to `new`, remembering the current value.
///
/// # Errors
///
/// Returns [`ChangeError::UnknownUnit`] if the unit is not registered.
pub fn unit_property(
    data: &GameData,
    unit: UnitId,
    new: UnitProperty,
) -> Result<Change, ChangeError> {
    let current = data.unit(unit).ok_or(ChangeError::UnknownUnit { unit })?;
    Ok(Change::UnitProperty {
        unit,
        old: new.read_from(current),
        new,
    })
}

/// Add a signed `delta` to a player's stockpile of `resource`.
pub const fn change_resource(player: PlayerId, resource: ResourceKind, delta: Decimal) -> Change {
    Change::Resource {
        player,
        resource,
        delta,
    }
}

/// Transfer `territory` to `new`, remembering the current owner.
///
/// # Errors
///
/// Returns [`ChangeError::UnknownTerritory`] if the territory does not exist.
pub fn change_owner(
    data: &GameData,
    territory: TerritoryId,
    new: Option<PlayerId>,
) -> Result<Change, ChangeError> {
    let current = data
        .territory(territory)
        .ok_or(ChangeError::UnknownTerritory { territory })?;
    Ok(Change::TerritoryOwner {
        territory,
        old: current.owner,
        new,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{Player, Territory, UnitKind};

    use super::*;

    #[test]
    fn unit_property_captures_old_value() {
        let mut data = GameData::new();
        let red = PlayerId::new();
        let home = TerritoryId::new();
        data.add_territory(Territory::new(home, "Home", Some(red)));
        let mut unit = Unit::new(UnitId::new(), red, UnitKind::Infantry);
        unit.already_moved = 2;
        let id = unit.id;
        data.spawn_unit(unit, UnitHolder::Territory(home));

        let change = unit_property(&data, id, UnitProperty::AlreadyMoved(5)).unwrap();
        assert_eq!(
            change,
            Change::UnitProperty {
                unit: id,
                old: UnitProperty::AlreadyMoved(2),
                new: UnitProperty::AlreadyMoved(5),
            }
        );
    }

    #[test]
    fn unknown_references_are_reported() {
        let data = GameData::new();
        let unit = UnitId::new();
        let territory = TerritoryId::new();
        assert_eq!(
            unit_property(&data, unit, UnitProperty::WasInCombat(true)),
            Err(ChangeError::UnknownUnit { unit })
        );
        assert_eq!(
            change_owner(&data, territory, None),
            Err(ChangeError::UnknownTerritory { territory })
        );
    }

    #[test]
    fn relocate_adds_before_removing() {
        let mut data = GameData::new();
        let red = PlayerId::new();
        let a = TerritoryId::new();
        let b = TerritoryId::new();
        data.add_player(Player::new(red, "Red"));
        data.add_territory(Territory::new(a, "A", Some(red)));
        data.add_territory(Territory::new(b, "B", Some(red)));
        let unit = Unit::new(UnitId::new(), red, UnitKind::Infantry);
        let id = unit.id;
        data.spawn_unit(unit, UnitHolder::Territory(a));

        let change = relocate_units(&data, &[id], a, b).unwrap();
        let kinds: Vec<bool> = match &change {
            Change::Composite(composite) => composite
                .iter()
                .map(|c| matches!(c, Change::AddUnits { .. }))
                .collect(),
            _ => Vec::new(),
        };
        assert_eq!(kinds, vec![true, false]);

        change.apply(&mut data).unwrap();
        assert!(data.territory(b).is_some_and(|t| t.units.contains(&id)));
        assert!(data.unit(id).is_some());
    }
}
