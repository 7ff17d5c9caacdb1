//! The [`Change`] primitive and the ordered [`CompositeChange`].
//!
//! A change is a description of a mutation, not the mutation itself:
//! [`Change::invert`] is a pure transformation producing another applicable
//! change, and only [`Change::apply`] touches [`GameData`].
//!
//! Composites that relocate units add them at the destination before
//! removing them from the origin, so the unit stays registered (with any
//! property changes already applied) for the whole sequence.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bastion_types::{
    GameData, PlayerId, ResourceKind, TerritoryId, Unit, UnitHolder, UnitId, UnitProperty,
};

use crate::ChangeError;

// ---------------------------------------------------------------------------
// Change
// ---------------------------------------------------------------------------

/// An invertible description of one state mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// Place units into a holder. Units unknown to the registry are
    /// registered from the carried snapshot.
    AddUnits {
        /// Where the units go.
        holder: UnitHolder,
        /// Snapshots of the units, taken when the change was built.
        units: Vec<Unit>,
    },

    /// Take units out of a holder. Units no longer held anywhere are dropped
    /// from the registry.
    RemoveUnits {
        /// Where the units are taken from.
        holder: UnitHolder,
        /// Snapshots of the units, taken when the change was built.
        units: Vec<Unit>,
    },

    /// Set one property of one unit.
    UnitProperty {
        /// The unit changed.
        unit: UnitId,
        /// Value before the change.
        old: UnitProperty,
        /// Value after the change.
        new: UnitProperty,
    },

    /// Add `delta` (possibly negative) to a player's stockpile.
    Resource {
        /// The player whose stockpile changes.
        player: PlayerId,
        /// The resource.
        resource: ResourceKind,
        /// Signed quantity added.
        delta: Decimal,
    },

    /// Transfer ownership of a territory.
    TerritoryOwner {
        /// The territory.
        territory: TerritoryId,
        /// Owner before the change.
        old: Option<PlayerId>,
        /// Owner after the change.
        new: Option<PlayerId>,
    },

    /// An ordered group of changes.
    Composite(CompositeChange),
}

impl Change {
    /// Produce the change that exactly undoes this one.
    #[must_use]
    pub fn invert(&self) -> Self {
        match self {
            Self::AddUnits { holder, units } => Self::RemoveUnits {
                holder: *holder,
                units: units.clone(),
            },
            Self::RemoveUnits { holder, units } => Self::AddUnits {
                holder: *holder,
                units: units.clone(),
            },
            Self::UnitProperty { unit, old, new } => Self::UnitProperty {
                unit: *unit,
                old: *new,
                new: *old,
            },
            Self::Resource {
                player,
                resource,
                delta,
            } => Self::Resource {
                player: *player,
                resource: *resource,
                delta: Decimal::ZERO.checked_sub(*delta).unwrap_or(Decimal::ZERO),
            },
            Self::TerritoryOwner {
                territory,
                old,
                new,
            } => Self::TerritoryOwner {
                territory: *territory,
                old: *new,
                new: *old,
            },
            Self::Composite(composite) => Self::Composite(composite.invert()),
        }
    }

    /// Whether applying this change would do nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::AddUnits { units, .. } | Self::RemoveUnits { units, .. } => units.is_empty(),
            Self::UnitProperty { old, new, .. } => old == new,
            Self::Resource { delta, .. } => delta.is_zero(),
            Self::TerritoryOwner { old, new, .. } => old == new,
            Self::Composite(composite) => composite.is_empty(),
        }
    }

    /// Apply this change to `data`.
    ///
    /// Each primitive change validates its references before mutating, so a
    /// failing primitive leaves `data` untouched. A composite stops at its
    /// first failing element; use [`Change::apply_atomic`] when the caller
    /// needs all-or-nothing semantics.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeError`] if the change refers to a missing holder,
    /// unit, player or territory, or would drive a stockpile negative.
    pub fn apply(&self, data: &mut GameData) -> Result<(), ChangeError> {
        match self {
            Self::AddUnits { holder, units } => add_units(data, *holder, units),
            Self::RemoveUnits { holder, units } => remove_units(data, *holder, units),
            Self::UnitProperty { unit, new, .. } => {
                let target = data
                    .unit_mut(*unit)
                    .ok_or(ChangeError::UnknownUnit { unit: *unit })?;
                new.write_to(target);
                Ok(())
            }
            Self::Resource {
                player,
                resource,
                delta,
            } => change_resource(data, *player, *resource, *delta),
            Self::TerritoryOwner { territory, new, .. } => {
                let target = data
                    .territory_mut(*territory)
                    .ok_or(ChangeError::UnknownTerritory {
                        territory: *territory,
                    })?;
                target.owner = *new;
                Ok(())
            }
            Self::Composite(composite) => composite.apply(data),
        }
    }

    /// Apply this change so that either all of it or none of it takes
    /// effect.
    ///
    /// # Errors
    ///
    /// Returns the first [`ChangeError`] encountered; `data` is unchanged.
    pub fn apply_atomic(&self, data: &mut GameData) -> Result<(), ChangeError> {
        let mut scratch = data.clone();
        self.apply(&mut scratch)?;
        *data = scratch;
        Ok(())
    }
}

impl From<CompositeChange> for Change {
    fn from(composite: CompositeChange) -> Self {
        Self::Composite(composite)
    }
}

fn add_units(data: &mut GameData, holder: UnitHolder, units: &[Unit]) -> Result<(), ChangeError> {
    let held = data
        .holder_units(holder)
        .ok_or(ChangeError::UnknownHolder { holder })?;
    if let Some(duplicate) = units.iter().find(|u| held.contains(&u.id)) {
        return Err(ChangeError::AlreadyHeld {
            unit: duplicate.id,
            holder,
        });
    }
    for unit in units {
        data.register_unit(unit);
    }
    let held = data
        .holder_units_mut(holder)
        .ok_or(ChangeError::UnknownHolder { holder })?;
    held.extend(units.iter().map(|u| u.id));
    Ok(())
}

fn remove_units(
    data: &mut GameData,
    holder: UnitHolder,
    units: &[Unit],
) -> Result<(), ChangeError> {
    let held = data
        .holder_units_mut(holder)
        .ok_or(ChangeError::UnknownHolder { holder })?;
    if let Some(missing) = units.iter().find(|u| !held.contains(&u.id)) {
        return Err(ChangeError::UnitNotHeld {
            unit: missing.id,
            holder,
        });
    }
    for unit in units {
        held.remove(&unit.id);
    }
    for unit in units {
        data.forget_if_unheld(unit.id);
    }
    Ok(())
}

fn change_resource(
    data: &mut GameData,
    player: PlayerId,
    resource: ResourceKind,
    delta: Decimal,
) -> Result<(), ChangeError> {
    let target = data
        .player_mut(player)
        .ok_or(ChangeError::UnknownPlayer { player })?;
    let available = target.resources.get(&resource).copied().unwrap_or(Decimal::ZERO);
    let updated = available
        .checked_add(delta)
        .ok_or(ChangeError::Overflow { player })?;
    if updated.is_sign_negative() && !updated.is_zero() {
        return Err(ChangeError::InsufficientResource {
            player,
            resource,
            available,
            delta,
        });
    }
    if updated.is_zero() {
        target.resources.remove(&resource);
    } else {
        target.resources.insert(resource, updated);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CompositeChange
// ---------------------------------------------------------------------------

/// An ordered, invertible sequence of [`Change`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeChange {
    changes: Vec<Change>,
}

impl CompositeChange {
    /// Create an empty composite.
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Append a change. Empty changes are dropped.
    pub fn add(&mut self, change: impl Into<Change>) {
        let change = change.into();
        if !change.is_empty() {
            self.changes.push(change);
        }
    }

    /// Append every change in order.
    pub fn add_all(&mut self, changes: impl IntoIterator<Item = Change>) {
        for change in changes {
            self.add(change);
        }
    }

    /// Whether every element is empty (or there are none).
    pub fn is_empty(&self) -> bool {
        self.changes.iter().all(Change::is_empty)
    }

    /// The number of top-level elements.
    pub const fn len(&self) -> usize {
        self.changes.len()
    }

    /// Iterate over the top-level elements in application order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Change> {
        self.changes.iter()
    }

    /// Invert each element and reverse the order.
    #[must_use]
    pub fn invert(&self) -> Self {
        Self {
            changes: self.changes.iter().rev().map(Change::invert).collect(),
        }
    }

    /// Apply each element in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ChangeError`]; earlier elements stay applied.
    pub fn apply(&self, data: &mut GameData) -> Result<(), ChangeError> {
        for change in &self.changes {
            change.apply(data)?;
        }
        Ok(())
    }
}

impl FromIterator<Change> for CompositeChange {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        let mut composite = Self::new();
        composite.add_all(iter);
        composite
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{Player, Territory, UnitKind};

    use super::*;
    use crate::factory;

    struct Board {
        data: GameData,
        red: PlayerId,
        a: TerritoryId,
        b: TerritoryId,
        tank: UnitId,
    }

    fn board() -> Board {
        let mut data = GameData::new();
        let red = PlayerId::new();
        let blue = PlayerId::new();
        let a = TerritoryId::new();
        let b = TerritoryId::new();
        data.add_player(Player::new(red, "Red"));
        data.add_player(Player::new(blue, "Blue"));
        data.add_territory(Territory::new(a, "Alpha", Some(red)));
        data.add_territory(Territory::new(b, "Bravo", Some(blue)));
        let unit = Unit::new(UnitId::new(), red, UnitKind::Armour);
        let tank = unit.id;
        data.spawn_unit(unit, UnitHolder::Territory(a));
        Board {
            data,
            red,
            a,
            b,
            tank,
        }
    }

    fn move_tank(board: &Board) -> CompositeChange {
        let mut composite = CompositeChange::new();
        composite.add(
            factory::unit_property(&board.data, board.tank, UnitProperty::AlreadyMoved(1))
                .unwrap(),
        );
        composite.add(factory::change_owner(&board.data, board.b, Some(board.red)).unwrap());
        let units = factory::snapshot_units(&board.data, &[board.tank]).unwrap();
        composite.add(factory::add_units(UnitHolder::Territory(board.b), units.clone()));
        composite.add(factory::remove_units(UnitHolder::Territory(board.a), units));
        composite
    }

    #[test]
    fn apply_then_invert_restores_state() {
        let mut board = board();
        let before = board.data.clone();
        let change: Change = move_tank(&board).into();

        assert!(change.apply(&mut board.data).is_ok());
        assert_ne!(board.data, before);
        assert_eq!(board.data.territory(board.b).map(|t| t.owner), Some(Some(board.red)));
        assert_eq!(board.data.unit(board.tank).map(|u| u.already_moved), Some(1));

        assert!(change.invert().apply(&mut board.data).is_ok());
        assert_eq!(board.data, before);
    }

    #[test]
    fn double_inversion_is_identity() {
        let board = board();
        let change: Change = move_tank(&board).into();
        assert_eq!(change.invert().invert(), change);
    }

    #[test]
    fn composite_invert_reverses_inverted_elements() {
        let board = board();
        let composite = move_tank(&board);
        let expected: Vec<Change> = composite.iter().rev().map(Change::invert).collect();
        let inverted = composite.invert();
        assert_eq!(inverted.iter().cloned().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn invert_does_not_touch_state() {
        let board = board();
        let before = board.data.clone();
        let _ = move_tank(&board).invert();
        assert_eq!(board.data, before);
    }

    #[test]
    fn removing_unheld_unit_fails_without_mutation() {
        let mut board = board();
        let before = board.data.clone();
        let units = factory::snapshot_units(&board.data, &[board.tank]).unwrap();
        let change = factory::remove_units(UnitHolder::Territory(board.b), units);
        let err = change.apply(&mut board.data);
        assert!(matches!(err, Err(ChangeError::UnitNotHeld { .. })));
        assert_eq!(board.data, before);
    }

    #[test]
    fn adding_held_unit_fails_without_mutation() {
        let mut board = board();
        let before = board.data.clone();
        let units = factory::snapshot_units(&board.data, &[board.tank]).unwrap();
        let change = factory::add_units(UnitHolder::Territory(board.a), units);
        let err = change.apply(&mut board.data);
        assert!(matches!(
            err,
            Err(ChangeError::AlreadyHeld { unit, .. }) if unit == board.tank
        ));
        assert_eq!(board.data, before);
    }

    #[test]
    fn atomic_apply_rolls_back_partial_composite() {
        let mut board = board();
        let before = board.data.clone();
        let mut composite = CompositeChange::new();
        composite.add(factory::change_resource(
            board.red,
            ResourceKind::Industry,
            Decimal::new(5, 0),
        ));
        composite.add(factory::change_resource(
            PlayerId::new(),
            ResourceKind::Industry,
            Decimal::new(5, 0),
        ));
        let change: Change = composite.into();
        assert!(change.apply_atomic(&mut board.data).is_err());
        assert_eq!(board.data, before);
    }

    #[test]
    fn resource_cannot_go_negative() {
        let mut board = board();
        let spend = factory::change_resource(board.red, ResourceKind::Fuel, Decimal::new(-2, 0));
        let err = spend.apply(&mut board.data);
        assert!(matches!(err, Err(ChangeError::InsufficientResource { .. })));
    }

    #[test]
    fn empty_changes_are_not_recorded() {
        let mut composite = CompositeChange::new();
        composite.add(CompositeChange::new());
        composite.add(factory::change_resource(
            PlayerId::new(),
            ResourceKind::Fuel,
            Decimal::ZERO,
        ));
        assert_eq!(composite.len(), 0);
        assert!(composite.is_empty());
    }

    #[test]
    fn change_survives_json_round_trip() {
        let board = board();
        let change: Change = move_tank(&board).into();
        let json = serde_json::to_string(&change).unwrap();
        let back: Change = serde_json::from_str(&json).unwrap();
        assert_eq!(back, change);
    }
}
