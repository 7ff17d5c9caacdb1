//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity the rule engine touches has a strongly-typed ID so that a
//! unit can never be passed where a territory is expected. All IDs use UUID
//! v7 (time-ordered) so persisted references stay stable across checkpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a player (nation) taking turns.
    PlayerId
}

define_id! {
    /// Unique identifier for a territory or sea zone on the map.
    TerritoryId
}

define_id! {
    /// Unique identifier for a single unit.
    UnitId
}

define_id! {
    /// Unique identifier for a committed, undoable action.
    ActionId
}

define_id! {
    /// Unique identifier for a pending battle.
    BattleId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let unit = UnitId::new();
        let territory = TerritoryId::new();
        assert_ne!(unit.into_inner(), Uuid::nil());
        assert_ne!(territory.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_serde_is_transparent_uuid() {
        let id = UnitId::new();
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", id.into_inner()));
        let back: Result<UnitId, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(id));
    }
}
