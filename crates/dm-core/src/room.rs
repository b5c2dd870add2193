//! Room data: exits, flags, dynamic-region addressing and respawn tables.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::Up,
        Self::Down,
    ];

    /// Parse a full direction name or its single-letter abbreviation.
    pub fn parse(s: &str) -> CoreResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "n" | "north" => Ok(Self::North),
            "s" | "south" => Ok(Self::South),
            "e" | "east" => Ok(Self::East),
            "w" | "west" => Ok(Self::West),
            "u" | "up" => Ok(Self::Up),
            "d" | "down" => Ok(Self::Down),
            other => Err(CoreError::UnknownDirection(other.to_string())),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Unit offset in region coordinates: north is +y, east is +x, up is +z.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::North => (0, 1, 0),
            Self::South => (0, -1, 0),
            Self::East => (1, 0, 0),
            Self::West => (-1, 0, 0),
            Self::Up => (0, 0, 1),
            Self::Down => (0, 0, -1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::North => write!(f, "north"),
            Self::South => write!(f, "south"),
            Self::East => write!(f, "east"),
            Self::West => write!(f, "west"),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dynamic regions
// ---------------------------------------------------------------------------

/// Identifier of a dynamic region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer position inside a dynamic region.
///
/// Within one region a coordinate maps to at most one room, and that
/// mapping never changes once set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorldCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl WorldCoordinate {
    pub const ORIGIN: WorldCoordinate = WorldCoordinate { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring coordinate one step in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }
}

impl fmt::Display for WorldCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Exits
// ---------------------------------------------------------------------------

/// Where an exit leads. Exactly one form applies to any exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ExitTarget {
    /// A concrete, already existing room.
    Room { room: EntityId },
    /// A coordinate inside a dynamic region, generated on first visit.
    Region {
        region: RegionId,
        coordinate: WorldCoordinate,
    },
    /// A named static room outside the dynamic region being left.
    RegionExit { room_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub name: String,
    pub closed: bool,
    pub locked: bool,
}

impl Door {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            closed: false,
            locked: false,
        }
    }

    pub fn locked(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            closed: true,
            locked: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub target: ExitTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door: Option<Door>,
}

impl Exit {
    pub fn to_room(room: EntityId) -> Self {
        Self {
            target: ExitTarget::Room { room },
            door: None,
        }
    }

    pub fn to_region(region: RegionId, coordinate: WorldCoordinate) -> Self {
        Self {
            target: ExitTarget::Region { region, coordinate },
            door: None,
        }
    }

    pub fn leaving_region(room_name: impl Into<String>) -> Self {
        Self {
            target: ExitTarget::RegionExit {
                room_name: room_name.into(),
            },
            door: None,
        }
    }

    pub fn with_door(mut self, door: Door) -> Self {
        self.door = Some(door);
        self
    }

    /// True if nothing blocks passage through this exit.
    pub fn is_passable(&self) -> bool {
        self.door.as_ref().is_none_or(|d| !d.closed && !d.locked)
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFlags {
    /// Combat cannot be started here and regeneration is boosted.
    pub safe: bool,
    /// Mobs may not enter.
    pub no_mob: bool,
    pub no_recall: bool,
}

/// One template to keep stocked in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub template: String,
    /// Respawn only while fewer than this many instances are present.
    pub max_present: usize,
}

impl SpawnEntry {
    pub fn new(template: impl Into<String>, max_present: usize) -> Self {
        Self {
            template: template.into(),
            max_present,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespawnTable {
    pub mobs: Vec<SpawnEntry>,
    pub items: Vec<SpawnEntry>,
    /// Ticks between respawn cycles.
    pub interval_ticks: u64,
    /// Tick of the last respawn cycle.
    pub last_respawn: u64,
}

impl RespawnTable {
    pub fn is_empty(&self) -> bool {
        self.mobs.is_empty() && self.items.is_empty()
    }

    /// True once `interval_ticks` have elapsed since the last cycle.
    pub fn is_due(&self, now: u64) -> bool {
        now >= self.last_respawn.saturating_add(self.interval_ticks)
    }
}

/// Room component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Set for rooms that belong to a dynamic region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<WorldCoordinate>,
    #[serde(default)]
    pub exits: BTreeMap<Direction, Exit>,
    #[serde(default)]
    pub flags: RoomFlags,
    #[serde(default)]
    pub respawn: RespawnTable,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_exit(mut self, direction: Direction, exit: Exit) -> Self {
        self.exits.insert(direction, exit);
        self
    }

    pub fn with_flags(mut self, flags: RoomFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_respawn(mut self, respawn: RespawnTable) -> Self {
        self.respawn = respawn;
        self
    }

    pub fn exit(&self, direction: Direction) -> Option<&Exit> {
        self.exits.get(&direction)
    }

    /// Exits without a closed or locked door, in direction order.
    pub fn passable_exits(&self) -> impl Iterator<Item = (Direction, &Exit)> {
        self.exits
            .iter()
            .filter(|(_, exit)| exit.is_passable())
            .map(|(dir, exit)| (*dir, exit))
    }
}
