//! Shared fixtures for the in-crate tests.

use dm_core::{
    Combat, ComponentSet, Direction, EntityId, EntityKind, Exit, Identity, Location, Position,
    Room, Stats, World,
};

use crate::context::TickContext;
use crate::error::SimResult;
use crate::simulation::TickReport;
use crate::system::{System, SystemView};

pub(crate) fn room(world: &World, name: &str) -> EntityId {
    let id = EntityId::named(EntityKind::Room, name);
    world.insert(id, Room::new(name));
    id
}

/// Two-way exit between `from` and `to`.
pub(crate) fn link(world: &World, from: EntityId, direction: Direction, to: EntityId) {
    world.mutate::<Room, _>(from, |r| {
        r.exits.insert(direction, Exit::to_room(to));
    });
    world.mutate::<Room, _>(to, |r| {
        r.exits.insert(direction.opposite(), Exit::to_room(from));
    });
}

fn fighter(world: &World, kind: EntityKind, name: &str, room: EntityId) -> EntityId {
    let id = EntityId::named(kind, name);
    world.insert(id, Identity::new(name).with_keywords([name.to_lowercase()]));
    world.insert(id, Stats::default());
    world.insert(id, Combat::default());
    world.insert(id, Position::Standing);
    world.insert(id, Location::new(room, 0));
    id
}

pub(crate) fn player(world: &World, name: &str, room: EntityId) -> EntityId {
    fighter(world, EntityKind::Player, name, room)
}

pub(crate) fn mob(world: &World, name: &str, room: EntityId) -> EntityId {
    fighter(world, EntityKind::Mob, name, room)
}

/// `attacker` targets `target` directly in the live world.
pub(crate) fn engage(world: &World, attacker: EntityId, target: EntityId) {
    world.mutate::<Combat, _>(attacker, |c| c.set_target(target));
    world.mutate::<Combat, _>(target, |c| c.add_attacker(attacker));
}

pub(crate) fn labels(report: &TickReport) -> Vec<&'static str> {
    report.events.iter().map(|e| e.kind.label()).collect()
}

pub(crate) fn denials(report: &TickReport) -> Vec<&str> {
    report
        .events
        .iter()
        .filter(|e| e.kind.is_denial())
        .map(|e| e.message.as_str())
        .collect()
}

/// Does nothing. Registered under the name of a dependency so a system can
/// be tested without the real systems it must run after.
#[derive(Debug)]
pub(crate) struct Idle(pub &'static str);

impl System for Idle {
    fn name(&self) -> &'static str {
        self.0
    }

    fn required(&self) -> ComponentSet {
        ComponentSet::EMPTY
    }

    fn writes(&self) -> ComponentSet {
        ComponentSet::EMPTY
    }

    fn process_entities(
        &mut self,
        _view: &SystemView<'_>,
        _ctx: &mut TickContext<'_>,
    ) -> SimResult<usize> {
        Ok(0)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
