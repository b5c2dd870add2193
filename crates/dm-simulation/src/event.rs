use dm_core::{Direction, EntityId, RegionId, WorldCoordinate};
use serde::Serialize;

/// What kind of simulation event occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEventKind {
    // Movement
    Left {
        entity: EntityId,
        from: EntityId,
        direction: Direction,
    },
    Entered {
        entity: EntityId,
        to: EntityId,
        direction: Direction,
    },
    LeftRegion {
        entity: EntityId,
        region: RegionId,
    },
    MoveDenied {
        entity: EntityId,
    },
    RegionGenerated {
        region: RegionId,
        coordinate: WorldCoordinate,
        room: EntityId,
    },

    // Combat
    AttackInitiated {
        attacker: EntityId,
        target: EntityId,
    },
    AttackDenied {
        entity: EntityId,
    },
    AttackHit {
        attacker: EntityId,
        target: EntityId,
        damage: i32,
    },
    AttackCritical {
        attacker: EntityId,
        target: EntityId,
        damage: i32,
    },
    AttackMissed {
        attacker: EntityId,
        target: EntityId,
    },
    Stunned {
        entity: EntityId,
        until: u64,
    },
    Recovered {
        entity: EntityId,
    },
    CombatEnded {
        entity: EntityId,
    },
    FleeSucceeded {
        entity: EntityId,
        direction: Direction,
    },
    FleeFailed {
        entity: EntityId,
    },
    FleeDenied {
        entity: EntityId,
    },

    // Lifecycle
    MobDied {
        victim: EntityId,
        killer: Option<EntityId>,
    },
    PlayerDied {
        victim: EntityId,
        killer: Option<EntityId>,
    },
    ExperienceGained {
        entity: EntityId,
        amount: u64,
    },
    Respawned {
        entity: EntityId,
        room: EntityId,
        template: String,
    },
}

impl SimEventKind {
    /// The entity the event is primarily about.
    pub fn subject(&self) -> Option<EntityId> {
        match self {
            Self::Left { entity, .. }
            | Self::Entered { entity, .. }
            | Self::LeftRegion { entity, .. }
            | Self::MoveDenied { entity }
            | Self::AttackDenied { entity }
            | Self::Stunned { entity, .. }
            | Self::Recovered { entity }
            | Self::CombatEnded { entity }
            | Self::FleeSucceeded { entity, .. }
            | Self::FleeFailed { entity }
            | Self::FleeDenied { entity }
            | Self::ExperienceGained { entity, .. }
            | Self::Respawned { entity, .. } => Some(*entity),
            Self::AttackInitiated { attacker, .. }
            | Self::AttackHit { attacker, .. }
            | Self::AttackCritical { attacker, .. }
            | Self::AttackMissed { attacker, .. } => Some(*attacker),
            Self::MobDied { victim, .. } | Self::PlayerDied { victim, .. } => Some(*victim),
            Self::RegionGenerated { .. } => None,
        }
    }

    /// Check whether a given entity is involved in this event.
    pub fn involves(&self, id: EntityId) -> bool {
        if self.subject() == Some(id) {
            return true;
        }
        match self {
            Self::Left { from, .. } => *from == id,
            Self::Entered { to, .. } => *to == id,
            Self::RegionGenerated { room, .. } | Self::Respawned { room, .. } => *room == id,
            Self::AttackInitiated { target, .. }
            | Self::AttackHit { target, .. }
            | Self::AttackCritical { target, .. }
            | Self::AttackMissed { target, .. } => *target == id,
            Self::MobDied { killer, .. } | Self::PlayerDied { killer, .. } => *killer == Some(id),
            _ => false,
        }
    }

    /// True for events that report a refused request.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::MoveDenied { .. } | Self::AttackDenied { .. } | Self::FleeDenied { .. }
        )
    }

    /// Short snake_case label, used by the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Left { .. } => "left",
            Self::Entered { .. } => "entered",
            Self::LeftRegion { .. } => "left_region",
            Self::MoveDenied { .. } => "move_denied",
            Self::RegionGenerated { .. } => "region_generated",
            Self::AttackInitiated { .. } => "attack_initiated",
            Self::AttackDenied { .. } => "attack_denied",
            Self::AttackHit { .. } => "attack_hit",
            Self::AttackCritical { .. } => "attack_critical",
            Self::AttackMissed { .. } => "attack_missed",
            Self::Stunned { .. } => "stunned",
            Self::Recovered { .. } => "recovered",
            Self::CombatEnded { .. } => "combat_ended",
            Self::FleeSucceeded { .. } => "flee_succeeded",
            Self::FleeFailed { .. } => "flee_failed",
            Self::FleeDenied { .. } => "flee_denied",
            Self::MobDied { .. } => "mob_died",
            Self::PlayerDied { .. } => "player_died",
            Self::ExperienceGained { .. } => "experience_gained",
            Self::Respawned { .. } => "respawned",
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimEvent {
    pub tick: u64,
    /// The entity the event is about, if any.
    pub entity: Option<EntityId>,
    /// The room the event happened in, if known.
    pub room: Option<EntityId>,
    pub kind: SimEventKind,
    /// Player-facing text.
    pub message: String,
}

impl SimEvent {
    pub fn new(tick: u64, kind: SimEventKind, message: impl Into<String>) -> Self {
        Self {
            tick,
            entity: kind.subject(),
            room: None,
            kind,
            message: message.into(),
        }
    }

    pub fn in_room(mut self, room: Option<EntityId>) -> Self {
        self.room = room;
        self
    }
}

/// Accumulates events during a simulation run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = SimEvent>) {
        for event in events {
            self.push(event);
        }
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn events_at_tick(&self, tick: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    pub fn events_for_entity(&self, id: EntityId) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
