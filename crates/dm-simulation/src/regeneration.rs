//! Periodic recovery of health, mana and stamina.

use dm_core::{Combat, ComponentKind, ComponentSet, Location, Position, Room, Stats};

use crate::context::TickContext;
use crate::error::SimResult;
use crate::system::{System, SystemView};

pub const NAME: &str = "regeneration";

/// Restores resources of idle, living entities every
/// `regeneration.interval_ticks` ticks.
#[derive(Debug, Default)]
pub struct RegenerationSystem;

impl RegenerationSystem {
    pub fn new() -> Self {
        Self
    }

    fn multiplier(ctx: &TickContext<'_>, id: dm_core::EntityId) -> f64 {
        let config = &ctx.config.regeneration;
        let position = ctx.read::<Position>(id).unwrap_or_default();
        let safe = ctx
            .read::<Location>(id)
            .and_then(|location| ctx.snapshot().get::<Room>(location.room).map(|r| r.flags.safe))
            .unwrap_or(false);
        let factor = config.position_factor(position);
        if safe {
            factor * config.safe_room_bonus
        } else {
            factor
        }
    }
}

fn amount(rate: f64, multiplier: f64) -> i32 {
    let raw = (rate * multiplier).floor();
    if raw.is_finite() && raw > 0.0 {
        raw.min(f64::from(i32::MAX)) as i32
    } else {
        0
    }
}

impl System for RegenerationSystem {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required(&self) -> ComponentSet {
        ComponentSet::of(&[ComponentKind::Stats])
    }

    fn optional(&self) -> ComponentSet {
        ComponentSet::of(&[
            ComponentKind::Combat,
            ComponentKind::Position,
            ComponentKind::Location,
        ])
    }

    fn writes(&self) -> ComponentSet {
        ComponentSet::of(&[ComponentKind::Stats])
    }

    fn priority(&self) -> i32 {
        50
    }

    fn depends_on(&self) -> &[&'static str] {
        &[crate::death::NAME]
    }

    fn process_entities(
        &mut self,
        view: &SystemView<'_>,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<usize> {
        if !ctx.clock.every(ctx.config.regeneration.interval_ticks) {
            return Ok(0);
        }
        let mut restored = 0;
        for &id in view.entities() {
            let Some(stats) = ctx.read::<Stats>(id) else {
                continue;
            };
            if !stats.is_alive() {
                continue;
            }
            if stats.health.is_full() && stats.mana.is_full() && stats.stamina.is_full() {
                continue;
            }
            if ctx
                .read::<Combat>(id)
                .is_some_and(|c| c.is_dead() || c.in_combat())
            {
                continue;
            }

            let multiplier = Self::multiplier(ctx, id);
            let config = &ctx.config.regeneration;
            let health = amount(config.health_rate, multiplier);
            let mana = amount(config.mana_rate, multiplier);
            let stamina = amount(config.stamina_rate, multiplier);
            let gained = ctx.buffer.mutate::<Stats, _>(id, |s| {
                s.heal(health) + s.restore_mana(mana) + s.restore_stamina(stamina)
            });
            if gained.is_some_and(|g| g > 0) {
                restored += 1;
            }
        }
        tracing::trace!(tick = ctx.tick(), restored, "regeneration pass");
        Ok(restored)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
