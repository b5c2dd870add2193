use std::sync::Arc;

use dm_core::{Component, EntityId, Identity, Location, World, WorldSnapshot};
use rand::rngs::StdRng;

use crate::buffer::WriteBuffer;
use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::event::{SimEvent, SimEventKind};
use crate::factory::EntityFactory;
use crate::region::RegionGenerator;

/// Mutable context passed to each system during a tick.
pub struct TickContext<'a> {
    pub buffer: &'a mut WriteBuffer,
    pub events: &'a mut Vec<SimEvent>,
    pub rng: &'a mut StdRng,
    pub clock: &'a SimClock,
    pub config: &'a SimConfig,
    /// Live world handle, passed to collaborators only. Systems read the
    /// snapshot and write through the buffer.
    pub world: &'a Arc<World>,
    pub regions: &'a dyn RegionGenerator,
    pub factory: &'a dyn EntityFactory,
}

impl TickContext<'_> {
    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    pub fn snapshot(&self) -> &WorldSnapshot {
        self.buffer.snapshot()
    }

    /// Read-your-writes view of a component.
    pub fn read<C: Component>(&self, id: EntityId) -> Option<C> {
        self.buffer.read::<C>(id)
    }

    /// Display name of an entity, falling back to its id.
    pub fn name_of(&self, id: EntityId) -> String {
        self.snapshot()
            .get::<Identity>(id)
            .map(|identity| identity.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Current room of an entity, including moves staged this tick.
    pub fn room_of(&self, id: EntityId) -> Option<EntityId> {
        self.read::<Location>(id).map(|location| location.room)
    }

    /// Emit an event located in the entity's current room.
    pub fn emit(&mut self, kind: SimEventKind, message: impl Into<String>) {
        let room = kind.subject().and_then(|id| self.room_of(id));
        self.emit_in(room, kind, message);
    }

    pub fn emit_in(
        &mut self,
        room: Option<EntityId>,
        kind: SimEventKind,
        message: impl Into<String>,
    ) {
        let event = SimEvent::new(self.tick(), kind, message).in_room(room);
        self.events.push(event);
    }
}
