use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// The kind of a simulated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A place that other entities can be located in.
    Room,
    /// A non-player creature.
    Mob,
    /// An object lying in a room or carried.
    Item,
    /// A connected player character.
    Player,
}

impl EntityKind {
    /// Parse a kind from its lowercase name.
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "room" => Ok(Self::Room),
            "mob" => Ok(Self::Mob),
            "item" => Ok(Self::Item),
            "player" => Ok(Self::Player),
            other => Err(CoreError::UnknownEntityKind(other.to_string())),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room => write!(f, "room"),
            Self::Mob => write!(f, "mob"),
            Self::Item => write!(f, "item"),
            Self::Player => write!(f, "player"),
        }
    }
}

/// Identifier for every simulated object: a (kind, instance) pair.
///
/// Entities carry no fields of their own. All state lives in components
/// keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId {
    /// What sort of object this is.
    pub kind: EntityKind,
    /// Unique instance identifier.
    pub instance: Uuid,
}

impl EntityId {
    /// Generate a new random id of the given kind.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            instance: Uuid::new_v4(),
        }
    }

    /// Deterministic id derived from a stable name.
    ///
    /// Named static rooms are addressed this way, so an exit that refers
    /// to a room by name always resolves to the same entity.
    pub fn named(kind: EntityKind, name: &str) -> Self {
        let key = format!("{kind}:{}", name.to_lowercase());
        Self {
            kind,
            instance: Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()),
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    pub fn is_mob(&self) -> bool {
        self.kind == EntityKind::Mob
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, &self.instance.to_string()[..8])
    }
}
