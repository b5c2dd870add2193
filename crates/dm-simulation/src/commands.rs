//! The command layer: deposits transient request components that the
//! systems consume on the next tick.
//!
//! `now` is the tick the command was issued at. Requests older than
//! `SimConfig::request_ttl` when processed are discarded as stale.

use dm_core::{
    AttackRequest, AttackTarget, CoreError, Direction, EntityId, FleeRequest, MovementRequest,
    World,
};

use crate::error::SimResult;

fn ensure_exists(world: &World, entity: EntityId) -> SimResult<()> {
    if world.contains(entity) {
        Ok(())
    } else {
        Err(CoreError::EntityNotFound(entity).into())
    }
}

/// Queue a move. A newer request replaces a pending one.
pub fn request_move(
    world: &World,
    entity: EntityId,
    direction: Direction,
    now: u64,
) -> SimResult<()> {
    ensure_exists(world, entity)?;
    world.insert(
        entity,
        MovementRequest {
            direction,
            issued_at: now,
        },
    );
    Ok(())
}

pub fn request_attack(
    world: &World,
    entity: EntityId,
    target: AttackTarget,
    now: u64,
) -> SimResult<()> {
    ensure_exists(world, entity)?;
    world.insert(
        entity,
        AttackRequest {
            target,
            issued_at: now,
        },
    );
    Ok(())
}

pub fn request_flee(world: &World, entity: EntityId, now: u64) -> SimResult<()> {
    ensure_exists(world, entity)?;
    world.insert(entity, FleeRequest { issued_at: now });
    Ok(())
}
