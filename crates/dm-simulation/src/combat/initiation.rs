//! Combat initiation: turns attack requests into engagements.

use dm_core::{
    AttackRequest, AttackTarget, Combat, ComponentKind, ComponentSet, EntityId, Identity,
    Location, Position, Room, Stats,
};

use crate::context::TickContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::{System, SystemView};

pub const NAME: &str = "combat_initiation";

const NOT_HERE: &str = "You don't see that here.";

/// Split an `N.keyword` query into its ordinal and keyword.
///
/// A query without a numeric prefix selects the first match.
fn parse_ordinal(query: &str) -> (usize, &str) {
    match query.split_once('.') {
        Some((n, rest)) => match n.trim().parse::<usize>() {
            Ok(ordinal) => (ordinal, rest.trim()),
            Err(_) => (1, query.trim()),
        },
        None => (1, query.trim()),
    }
}

/// Find the `N`th entity in `room` (excluding `attacker`) whose identity
/// matches `query`, in arrival order.
pub(crate) fn find_by_keyword(
    ctx: &TickContext<'_>,
    attacker: EntityId,
    room: EntityId,
    query: &str,
) -> Option<EntityId> {
    let (ordinal, keyword) = parse_ordinal(query);
    if ordinal == 0 || keyword.is_empty() {
        return None;
    }
    let snapshot = ctx.snapshot();
    snapshot
        .entities_in_room(room)
        .into_iter()
        .filter(|id| *id != attacker)
        .filter(|id| {
            snapshot
                .get::<Identity>(*id)
                .is_some_and(|identity| identity.matches(keyword))
        })
        .nth(ordinal - 1)
}

/// Engages attackers with the targets named in their [`AttackRequest`].
#[derive(Debug, Default)]
pub struct CombatInitiationSystem;

impl CombatInitiationSystem {
    pub fn new() -> Self {
        Self
    }

    fn try_engage(
        &self,
        ctx: &mut TickContext<'_>,
        attacker: EntityId,
        request: &AttackRequest,
        room: EntityId,
    ) -> Result<Option<EntityId>, String> {
        if ctx.clock.since(request.issued_at) > ctx.config.request_ttl {
            return Err("You lose your bearings.".into());
        }
        let Some(combat) = ctx.read::<Combat>(attacker) else {
            return Err("You can't fight.".into());
        };
        if combat.is_dead() || ctx.read::<Stats>(attacker).is_some_and(|s| !s.is_alive()) {
            return Err("You can't fight while dead.".into());
        }
        if combat.in_combat() {
            return Ok(None);
        }

        let target = match &request.target {
            AttackTarget::Entity(id) => ctx.snapshot().contains(*id).then_some(*id),
            AttackTarget::Keyword(query) => find_by_keyword(ctx, attacker, room, query),
        }
        .ok_or_else(|| NOT_HERE.to_string())?;

        if target == attacker {
            return Err("You can't attack that.".into());
        }
        let Some(target_combat) = ctx.read::<Combat>(target) else {
            return Err("You can't attack that.".into());
        };
        if ctx.room_of(target) != Some(room) {
            return Err(NOT_HERE.into());
        }
        if target_combat.is_dead() || ctx.read::<Stats>(target).is_some_and(|s| !s.is_alive()) {
            return Err("They are already dead.".into());
        }
        if ctx
            .snapshot()
            .get::<Room>(room)
            .is_some_and(|r| r.flags.safe)
        {
            return Err("You can't fight in a safe place.".into());
        }

        ctx.buffer
            .mutate::<Combat, _>(attacker, |c| c.set_target(target));
        ctx.buffer
            .mutate::<Combat, _>(target, |c| c.add_attacker(attacker));
        for id in [attacker, target] {
            ctx.buffer
                .mutate::<Position, _>(id, |p| *p = Position::Standing);
        }
        Ok(Some(target))
    }
}

impl System for CombatInitiationSystem {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required(&self) -> ComponentSet {
        ComponentSet::of(&[ComponentKind::AttackRequest, ComponentKind::Location])
    }

    fn optional(&self) -> ComponentSet {
        ComponentSet::of(&[ComponentKind::Combat, ComponentKind::Stats])
    }

    fn writes(&self) -> ComponentSet {
        ComponentSet::of(&[
            ComponentKind::Combat,
            ComponentKind::Position,
            ComponentKind::AttackRequest,
        ])
    }

    fn priority(&self) -> i32 {
        10
    }

    fn process_entities(
        &mut self,
        view: &SystemView<'_>,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<usize> {
        let mut engaged = 0;
        for &attacker in view.entities() {
            let (Some(request), Some(location)) = (
                view.get::<AttackRequest>(attacker).cloned(),
                view.get::<Location>(attacker),
            ) else {
                continue;
            };
            ctx.buffer.delete::<AttackRequest>(attacker);
            match self.try_engage(ctx, attacker, &request, location.room) {
                Ok(Some(target)) => {
                    engaged += 1;
                    let message = format!(
                        "{} attacks {}!",
                        ctx.name_of(attacker),
                        ctx.name_of(target)
                    );
                    ctx.emit(SimEventKind::AttackInitiated { attacker, target }, message);
                }
                Ok(None) => {}
                Err(reason) => {
                    ctx.emit(SimEventKind::AttackDenied { entity: attacker }, reason);
                }
            }
        }
        Ok(engaged)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
