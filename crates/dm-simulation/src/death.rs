//! Death detection and its consequences.

use dm_core::{Combat, ComponentKind, ComponentSet, EntityId, Stats};
use dm_mechanics::combat::experience_for_kill;

use crate::context::TickContext;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::{System, SystemView};

pub const NAME: &str = "death";

/// Mark `victim` dead, release everyone fighting it and award experience.
///
/// Does nothing if the victim has no combat state or is already dead, so
/// combat and the death system can both call it in the same tick.
pub(crate) fn resolve_death(ctx: &mut TickContext<'_>, victim: EntityId, killer: Option<EntityId>) {
    let Some(combat) = ctx.read::<Combat>(victim) else {
        return;
    };
    if combat.is_dead() {
        return;
    }
    let killer = killer.or(combat.last_attacker);

    let mut opponents: Vec<EntityId> = combat.target.into_iter().collect();
    for attacker in &combat.targeted_by {
        if !opponents.contains(attacker) {
            opponents.push(*attacker);
        }
    }

    ctx.buffer.mutate::<Combat, _>(victim, Combat::mark_dead);
    let name = ctx.name_of(victim);
    let kind = if victim.is_player() {
        SimEventKind::PlayerDied { victim, killer }
    } else {
        SimEventKind::MobDied { victim, killer }
    };
    ctx.emit(kind, format!("{name} is dead!"));
    tracing::debug!(victim = %victim, killer = ?killer, "entity died");

    for other in opponents {
        let still_fighting = ctx.buffer.mutate::<Combat, _>(other, |c| {
            c.forget(victim);
            c.in_combat()
        });
        if still_fighting == Some(false) {
            let message = format!("{} stops fighting.", ctx.name_of(other));
            ctx.emit(SimEventKind::CombatEnded { entity: other }, message);
        }
    }

    let Some(killer) = killer else {
        return;
    };
    if !ctx.config.combat.award_experience || !killer.is_player() || victim.is_player() {
        return;
    }
    let level = ctx.read::<Stats>(victim).map_or(1, |s| s.level);
    let amount = experience_for_kill(level);
    if ctx
        .buffer
        .mutate::<Stats, _>(killer, |s| s.gain_experience(amount))
        .is_some()
    {
        ctx.emit(
            SimEventKind::ExperienceGained {
                entity: killer,
                amount,
            },
            format!("You gain {amount} experience."),
        );
    }
}

/// Catches entities whose health reached zero outside of combat.
#[derive(Debug, Default)]
pub struct DeathSystem;

impl DeathSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for DeathSystem {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required(&self) -> ComponentSet {
        ComponentSet::of(&[ComponentKind::Stats, ComponentKind::Combat])
    }

    fn writes(&self) -> ComponentSet {
        ComponentSet::of(&[ComponentKind::Combat, ComponentKind::Stats])
    }

    fn priority(&self) -> i32 {
        40
    }

    fn depends_on(&self) -> &[&'static str] {
        &[crate::combat::NAME]
    }

    fn process_entities(
        &mut self,
        view: &SystemView<'_>,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<usize> {
        let mut died = 0;
        for &id in view.entities() {
            if view.get::<Combat>(id).is_some_and(Combat::is_dead) {
                continue;
            }
            let alive = ctx.read::<Stats>(id).is_none_or(|s| s.is_alive());
            let dead = ctx.read::<Combat>(id).is_some_and(|c| c.is_dead());
            if alive || dead {
                continue;
            }
            resolve_death(ctx, id, None);
            died += 1;
        }
        Ok(died)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
