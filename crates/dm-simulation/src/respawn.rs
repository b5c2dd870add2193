//! Restocking rooms from their respawn tables.

use dm_core::{Combat, ComponentKind, ComponentSet, EntityId, Identity, Room, SpawnEntry};

use crate::context::TickContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::factory::FactoryError;
use crate::system::{System, SystemView};

pub const NAME: &str = "respawn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpawnKind {
    Mob,
    Item,
}

/// Tops rooms up to each entry's `max_present` once per respawn interval.
#[derive(Debug, Default)]
pub struct RespawnSystem;

impl RespawnSystem {
    pub fn new() -> Self {
        Self
    }

    /// Living instances of `template` currently in `room`.
    fn present(ctx: &TickContext<'_>, room: EntityId, template: &str) -> usize {
        let snapshot = ctx.snapshot();
        snapshot
            .entities_in_room(room)
            .into_iter()
            .filter(|id| {
                snapshot
                    .get::<Identity>(*id)
                    .is_some_and(|identity| identity.template.as_deref() == Some(template))
            })
            .filter(|id| !snapshot.get::<Combat>(*id).is_some_and(Combat::is_dead))
            .count()
    }

    /// Removes mobs in `room` that were already dead when the tick began.
    /// Death notifications went out on the tick they died.
    fn clear_dead(ctx: &TickContext<'_>, room: EntityId) -> usize {
        let snapshot = ctx.snapshot();
        let mut cleared = 0;
        for id in snapshot.entities_in_room(room) {
            if !id.is_mob() || !snapshot.get::<Combat>(id).is_some_and(Combat::is_dead) {
                continue;
            }
            if ctx.world.despawn(id) {
                tracing::debug!(room = %room, entity = %id, "cleared dead mob");
                cleared += 1;
            }
        }
        cleared
    }

    fn restock(
        ctx: &mut TickContext<'_>,
        room: EntityId,
        entry: &SpawnEntry,
        kind: SpawnKind,
    ) -> usize {
        let now = ctx.tick();
        let present = Self::present(ctx, room, &entry.template);
        let mut spawned = 0;
        for _ in present..entry.max_present {
            let result: Result<EntityId, FactoryError> = match kind {
                SpawnKind::Mob => ctx.factory.spawn_mob(ctx.world, &entry.template, room, now),
                SpawnKind::Item => ctx.factory.spawn_item(ctx.world, &entry.template, room, now),
            };
            let entity = match result {
                Ok(entity) => entity,
                Err(err) => {
                    tracing::warn!(room = %room, template = %entry.template, error = %err, "respawn failed");
                    break;
                }
            };
            let name = ctx
                .world
                .get::<Identity>(entity)
                .map_or_else(|| entry.template.clone(), |identity| identity.name);
            ctx.emit_in(
                Some(room),
                SimEventKind::Respawned {
                    entity,
                    room,
                    template: entry.template.clone(),
                },
                format!("{name} appears."),
            );
            spawned += 1;
        }
        spawned
    }
}

impl System for RespawnSystem {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required(&self) -> ComponentSet {
        ComponentSet::of(&[ComponentKind::Room])
    }

    fn writes(&self) -> ComponentSet {
        ComponentSet::of(&[ComponentKind::Room])
    }

    fn priority(&self) -> i32 {
        60
    }

    fn process_entities(
        &mut self,
        view: &SystemView<'_>,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<usize> {
        let now = ctx.tick();
        let mut spawned = 0;
        for &room in view.entities() {
            let Some(table) = view.get::<Room>(room).map(|r| &r.respawn) else {
                continue;
            };
            if table.is_empty() || !table.is_due(now) {
                continue;
            }
            ctx.buffer
                .mutate::<Room, _>(room, |r| r.respawn.last_respawn = now);
            Self::clear_dead(ctx, room);
            for entry in &table.mobs {
                spawned += Self::restock(ctx, room, entry, SpawnKind::Mob);
            }
            for entry in &table.items {
                spawned += Self::restock(ctx, room, entry, SpawnKind::Item);
            }
        }
        Ok(spawned)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
