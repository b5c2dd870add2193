//! Flee attempts, resolved inside the combat system.

use dm_core::{Combat, Direction, EntityId, Exit, ExitTarget, Location, Room, Stats};
use dm_mechanics::combat::{flee_chance, flee_succeeds, roll_d100};
use rand::Rng;

use crate::context::TickContext;
use crate::event::SimEventKind;
use crate::movement::{apply_move, resolve_destination};

/// Result of handling a flee request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FleeOutcome {
    /// The request was refused before any roll; the entity may still act.
    Denied,
    /// The roll failed; the attempt used the entity's turn.
    Failed,
    Escaped,
}

/// Exits a fleeing entity may take. Mobs never flee into no-mob rooms.
fn escape_routes(ctx: &TickContext<'_>, id: EntityId, room: &Room) -> Vec<(Direction, Exit)> {
    room.passable_exits()
        .filter(|(_, exit)| match &exit.target {
            ExitTarget::Room { room } if id.is_mob() => !ctx
                .snapshot()
                .get::<Room>(*room)
                .is_some_and(|r| r.flags.no_mob),
            _ => true,
        })
        .map(|(direction, exit)| (direction, exit.clone()))
        .collect()
}

pub(crate) fn attempt(ctx: &mut TickContext<'_>, id: EntityId, combat: &Combat) -> FleeOutcome {
    let deny = |ctx: &mut TickContext<'_>, reason: &str| {
        ctx.emit(SimEventKind::FleeDenied { entity: id }, reason);
        FleeOutcome::Denied
    };

    if !combat.in_combat() {
        return deny(ctx, "You aren't fighting anyone.");
    }
    let Some(location) = ctx.read::<Location>(id) else {
        return deny(ctx, "You are nowhere.");
    };
    let Some(room) = ctx.snapshot().get::<Room>(location.room).cloned() else {
        return deny(ctx, "You are nowhere.");
    };
    let routes = escape_routes(ctx, id, &room);
    if routes.is_empty() {
        return deny(ctx, "There's nowhere to flee to!");
    }

    let dex_modifier = ctx.read::<Stats>(id).map_or(0, |s| s.dex_modifier());
    let chance = flee_chance(dex_modifier, combat.targeted_by.len());
    let roll = roll_d100(ctx.rng);
    if !flee_succeeds(roll, chance) {
        tracing::debug!(entity = %id, roll, chance, "flee failed");
        ctx.emit(SimEventKind::FleeFailed { entity: id }, "You fail to escape!");
        return FleeOutcome::Failed;
    }

    let (direction, exit) = &routes[ctx.rng.random_range(0..routes.len())];
    let destination = match resolve_destination(ctx, id, location.room, &room, *direction, exit) {
        Ok(destination) => destination,
        Err(reason) => {
            ctx.emit(SimEventKind::FleeFailed { entity: id }, reason);
            return FleeOutcome::Failed;
        }
    };

    let mut opponents: Vec<EntityId> = combat.target.into_iter().collect();
    for attacker in &combat.targeted_by {
        if !opponents.contains(attacker) {
            opponents.push(*attacker);
        }
    }
    for other in opponents {
        let still_fighting = ctx.buffer.mutate::<Combat, _>(other, |c| {
            c.forget(id);
            c.in_combat()
        });
        if still_fighting == Some(false) {
            let message = format!("{} stops fighting.", ctx.name_of(other));
            ctx.emit(SimEventKind::CombatEnded { entity: other }, message);
        }
    }
    let mut own = combat.clone();
    own.begin_flee();
    own.clear_relationships();
    ctx.buffer.write(id, own);

    let message = format!("{} flees {direction}!", ctx.name_of(id));
    ctx.emit_in(
        Some(location.room),
        SimEventKind::FleeSucceeded {
            entity: id,
            direction: *direction,
        },
        message,
    );
    apply_move(ctx, id, &location, *direction, &destination, 0);
    FleeOutcome::Escaped
}
