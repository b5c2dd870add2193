//! Combat: engagement, round resolution and fleeing.

pub mod initiation;

mod flee;

use dm_core::{Combat, CombatState, ComponentKind, ComponentSet, EntityId, FleeRequest, Stats};
use dm_mechanics::combat::{roll_damage, roll_to_hit};
use dm_mechanics::{AttackProfile, DiceExpr, Die, HitOutcome};

use crate::context::TickContext;
use crate::death::resolve_death;
use crate::error::SimResult;
use crate::event::SimEventKind;
use crate::system::{System, SystemView};

use flee::FleeOutcome;

pub use initiation::CombatInitiationSystem;

pub const NAME: &str = "combat";

/// Resolves one round per engaged entity: stun recovery, flee attempts,
/// then an attack on the current target.
#[derive(Debug, Default)]
pub struct CombatSystem;

impl CombatSystem {
    pub fn new() -> Self {
        Self
    }

    /// A target is valid while it is alive and shares the attacker's room.
    fn is_valid_target(ctx: &TickContext<'_>, attacker: EntityId, target: EntityId) -> bool {
        let alive = ctx.read::<Combat>(target).is_some_and(|c| !c.is_dead())
            && ctx.read::<Stats>(target).is_some_and(|s| s.is_alive());
        alive && ctx.room_of(target).is_some() && ctx.room_of(target) == ctx.room_of(attacker)
    }

    fn handle_flee(
        &self,
        ctx: &mut TickContext<'_>,
        id: EntityId,
        request: FleeRequest,
        combat: &Combat,
    ) -> FleeOutcome {
        ctx.buffer.delete::<FleeRequest>(id);
        if ctx.clock.since(request.issued_at) > ctx.config.request_ttl {
            ctx.emit(SimEventKind::FleeDenied { entity: id }, "You lose your bearings.");
            return FleeOutcome::Denied;
        }
        flee::attempt(ctx, id, combat)
    }

    /// Attack the current target, or the first valid attacker. Returns
    /// false if there was nobody left to fight.
    fn attack(&self, ctx: &mut TickContext<'_>, id: EntityId, mut combat: Combat) -> bool {
        let now = ctx.tick();
        let target = loop {
            let candidate = combat.target.or_else(|| combat.targeted_by.first().copied());
            match candidate {
                None => break None,
                Some(t) if Self::is_valid_target(ctx, id, t) => break Some(t),
                Some(t) => {
                    combat.forget(t);
                    ctx.buffer.mutate::<Combat, _>(t, |c| {
                        c.forget(id);
                    });
                }
            }
        };
        let Some(target) = target else {
            ctx.buffer.write(id, combat);
            let message = format!("{} stops fighting.", ctx.name_of(id));
            ctx.emit(SimEventKind::CombatEnded { entity: id }, message);
            return false;
        };

        combat.set_target(target);
        combat.last_attack_tick = Some(now);
        let weapon = DiceExpr::parse(&combat.weapon_damage).unwrap_or_else(|err| {
            tracing::warn!(entity = %id, error = %err, "invalid weapon damage, using 1d4");
            DiceExpr::new(1, Die::D4, 0)
        });
        let stats = ctx.read::<Stats>(id).unwrap_or_default();
        let profile = AttackProfile {
            attack_bonus: stats.attack_bonus,
            dex_modifier: stats.dex_modifier(),
            damage_bonus: stats.damage_bonus,
        };
        let armor_class = ctx.read::<Stats>(target).map_or(10, |s| s.armor_class);
        let roll = roll_to_hit(ctx.rng, &profile, armor_class);

        let attacker_name = ctx.name_of(id);
        let target_name = ctx.name_of(target);
        if !roll.outcome.is_hit() {
            ctx.buffer.write(id, combat);
            ctx.buffer
                .mutate::<Combat, _>(target, |c| c.add_attacker(id));
            ctx.emit(
                SimEventKind::AttackMissed {
                    attacker: id,
                    target,
                },
                format!("{attacker_name} misses {target_name}."),
            );
            return true;
        }

        let critical = roll.outcome == HitOutcome::Critical;
        let amount = roll_damage(ctx.rng, &weapon, profile.damage_bonus, critical);
        combat.damage_dealt = combat.damage_dealt.saturating_add(u64::from(amount.unsigned_abs()));
        // The attacker's own state is staged before the target can die, so
        // death resolution sees the attacker's latest relationships.
        ctx.buffer.write(id, combat);

        let remaining = ctx
            .buffer
            .mutate::<Stats, _>(target, |s| {
                s.apply_health_delta(-amount);
                s.health.current
            })
            .unwrap_or(0);
        let stun_ticks = ctx.config.combat.crit_stun_ticks;
        let stunned_until = now.saturating_add(stun_ticks);
        let stunned = ctx
            .buffer
            .mutate::<Combat, _>(target, |c| {
                c.add_attacker(id);
                c.damage_taken = c.damage_taken.saturating_add(u64::from(amount.unsigned_abs()));
                c.last_attacker = Some(id);
                if critical && stun_ticks > 0 && remaining > 0 {
                    c.stun(stunned_until);
                    c.state == CombatState::Stunned
                } else {
                    false
                }
            })
            .unwrap_or(false);

        let (kind, message) = if critical {
            (
                SimEventKind::AttackCritical {
                    attacker: id,
                    target,
                    damage: amount,
                },
                format!("{attacker_name} critically hits {target_name} for {amount} damage!"),
            )
        } else {
            (
                SimEventKind::AttackHit {
                    attacker: id,
                    target,
                    damage: amount,
                },
                format!("{attacker_name} hits {target_name} for {amount} damage."),
            )
        };
        ctx.emit(kind, message);

        if stunned {
            ctx.emit(
                SimEventKind::Stunned {
                    entity: target,
                    until: stunned_until,
                },
                format!("{target_name} is stunned!"),
            );
        }
        if remaining <= 0 {
            resolve_death(ctx, target, Some(id));
        }
        true
    }
}

impl System for CombatSystem {
    fn name(&self) -> &'static str {
        NAME
    }

    fn required(&self) -> ComponentSet {
        ComponentSet::of(&[
            ComponentKind::Combat,
            ComponentKind::Stats,
            ComponentKind::Location,
        ])
    }

    fn optional(&self) -> ComponentSet {
        ComponentSet::of(&[ComponentKind::FleeRequest])
    }

    fn writes(&self) -> ComponentSet {
        ComponentSet::of(&[
            ComponentKind::Combat,
            ComponentKind::Stats,
            ComponentKind::Location,
            ComponentKind::FleeRequest,
        ])
    }

    fn priority(&self) -> i32 {
        30
    }

    fn depends_on(&self) -> &[&'static str] {
        &[initiation::NAME, crate::movement::NAME]
    }

    fn process_entities(
        &mut self,
        view: &SystemView<'_>,
        ctx: &mut TickContext<'_>,
    ) -> SimResult<usize> {
        let now = ctx.tick();
        let mut acted = 0;
        for &id in view.entities() {
            let Some(mut combat) = ctx.read::<Combat>(id) else {
                continue;
            };
            let flee_request = view.get::<FleeRequest>(id).copied();
            if combat.is_dead() {
                if flee_request.is_some() {
                    ctx.buffer.delete::<FleeRequest>(id);
                }
                continue;
            }

            if combat.state == CombatState::Stunned {
                if !combat.recover(now) {
                    if flee_request.is_some() {
                        ctx.buffer.delete::<FleeRequest>(id);
                        ctx.emit(SimEventKind::FleeDenied { entity: id }, "You are stunned!");
                    }
                    continue;
                }
                ctx.buffer.write(id, combat.clone());
                let message = format!("{} recovers.", ctx.name_of(id));
                ctx.emit(SimEventKind::Recovered { entity: id }, message);
            }

            if let Some(request) = flee_request {
                match self.handle_flee(ctx, id, request, &combat) {
                    FleeOutcome::Denied => {}
                    FleeOutcome::Failed | FleeOutcome::Escaped => {
                        acted += 1;
                        continue;
                    }
                }
            }

            if !combat.in_combat() || !combat.cooldown_elapsed(now) {
                continue;
            }
            if self.attack(ctx, id, combat) {
                acted += 1;
            }
        }
        Ok(acted)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Simulation;
    use crate::test_support::*;
    use crate::SimConfig;
    use dm_core::{Direction, Location, World};
    use std::sync::Arc;

    fn sim(world: Arc<World>, config: SimConfig) -> Simulation {
        let mut sim = Simulation::new(world, config);
        sim.add_system(CombatInitiationSystem::new()).unwrap();
        sim.add_system(crate::movement::MovementSystem::new()).unwrap();
        sim.add_system(CombatSystem::new()).unwrap();
        sim
    }

    fn assert_consistent(world: &World, ids: &[EntityId]) {
        for id in ids {
            let combat = world.get::<Combat>(*id).unwrap();
            assert!(combat.is_consistent(), "{id}: {combat:?}");
        }
    }

    #[test]
    fn rounds_deal_damage_until_someone_dies() {
        let world = Arc::new(World::new());
        let cave = room(&world, "Cave");
        let hero = player(&world, "Ayla", cave);
        world.mutate::<Stats, _>(hero, |s| *s = s.clone().with_health(500).with_attack(20, 0));
        let rat = mob(&world, "rat", cave);
        world.mutate::<Stats, _>(rat, |s| s.health = dm_core::Resource::full(3));
        engage(&world, hero, rat);

        let mut sim = sim(world.clone(), SimConfig::default());
        let mut died = false;
        for _ in 0..50 {
            let report = sim.tick().unwrap();
            assert_consistent(&world, &[hero, rat]);
            if labels(&report).contains(&"mob_died") {
                died = true;
                break;
            }
        }
        assert!(died);
        assert!(world.get::<Combat>(rat).unwrap().is_dead());
        assert!(!world.get::<Combat>(hero).unwrap().in_combat());
        assert_eq!(world.get::<Stats>(hero).unwrap().experience, 100);
        assert!(world.get::<Combat>(hero).unwrap().damage_dealt >= 3);
    }

    #[test]
    fn victims_retaliate_against_their_attacker() {
        let world = Arc::new(World::new());
        let cave = room(&world, "Cave");
        let hero = player(&world, "Ayla", cave);
        let rat = mob(&world, "rat", cave);
        engage(&world, hero, rat);

        let mut sim = sim(world.clone(), SimConfig::default());
        sim.tick().unwrap();
        let rat_combat = world.get::<Combat>(rat).unwrap();
        assert_eq!(rat_combat.target, Some(hero));
        assert_eq!(rat_combat.last_attack_tick, Some(1));
        assert!(world.get::<Combat>(hero).unwrap().targeted_by.contains(&rat));
    }

    #[test]
    fn cooldown_limits_attack_rate() {
        let world = Arc::new(World::new());
        let cave = room(&world, "Cave");
        let hero = player(&world, "Ayla", cave);
        world.mutate::<Combat, _>(hero, |c| c.attack_cooldown = 3);
        world.mutate::<Stats, _>(hero, |s| s.health = dm_core::Resource::full(1000));
        let dummy = mob(&world, "dummy", cave);
        world.mutate::<Stats, _>(dummy, |s| s.health = dm_core::Resource::full(1000));
        world.mutate::<Combat, _>(dummy, |c| c.attack_cooldown = 1000);
        engage(&world, hero, dummy);

        let mut sim = sim(world.clone(), SimConfig::default());
        let mut swings = 0;
        for _ in 0..6 {
            let report = sim.tick().unwrap();
            swings += report
                .events
                .iter()
                .filter(|e| e.kind.subject() == Some(hero) && e.kind.label().starts_with("attack_"))
                .count();
        }
        assert_eq!(swings, 2);
    }

    #[test]
    fn target_leaving_room_ends_combat() {
        let world = Arc::new(World::new());
        let cave = room(&world, "Cave");
        let tunnel = room(&world, "Tunnel");
        let hero = player(&world, "Ayla", cave);
        let rat = mob(&world, "rat", cave);
        engage(&world, hero, rat);
        world.mutate::<Location, _>(rat, |l| *l = l.moved_to(tunnel, 0));

        let mut sim = sim(world.clone(), SimConfig::default());
        let report = sim.tick().unwrap();
        assert!(labels(&report).contains(&"combat_ended"));
        assert!(!world.get::<Combat>(hero).unwrap().in_combat());
    }

    #[test]
    fn flee_without_exits_is_denied_and_stays_engaged() {
        let world = Arc::new(World::new());
        let pit = room(&world, "Pit");
        let hero = player(&world, "Ayla", pit);
        let a = mob(&world, "wolf", pit);
        let b = mob(&world, "bear", pit);
        world.mutate::<Combat, _>(a, |c| c.attack_cooldown = 1000);
        world.mutate::<Combat, _>(b, |c| c.attack_cooldown = 1000);
        world.mutate::<Combat, _>(hero, |c| c.attack_cooldown = 1000);
        engage(&world, a, hero);
        engage(&world, b, hero);
        world.mutate::<Combat, _>(a, |c| c.last_attack_tick = Some(0));
        world.mutate::<Combat, _>(b, |c| c.last_attack_tick = Some(0));

        let mut sim = sim(world.clone(), SimConfig::default());
        sim.request_flee(hero).unwrap();
        let report = sim.tick().unwrap();
        assert_eq!(denials(&report), vec!["There's nowhere to flee to!"]);
        assert!(world.get::<Combat>(hero).unwrap().in_combat());
        assert!(!world.has::<FleeRequest>(hero));
    }

    #[test]
    fn flee_when_idle_is_denied() {
        let world = Arc::new(World::new());
        let cave = room(&world, "Cave");
        let hero = player(&world, "Ayla", cave);

        let mut sim = sim(world.clone(), SimConfig::default());
        sim.request_flee(hero).unwrap();
        let report = sim.tick().unwrap();
        assert_eq!(denials(&report), vec!["You aren't fighting anyone."]);
    }

    #[test]
    fn successful_flee_releases_everyone() {
        let world = Arc::new(World::new());
        let cave = room(&world, "Cave");
        let tunnel = room(&world, "Tunnel");
        link(&world, cave, Direction::North, tunnel);
        let hero = player(&world, "Ayla", cave);
        // Flee chance caps at 90%, so retry.
        world.mutate::<Stats, _>(hero, |s| {
            *s = s.clone().with_dexterity(30).with_health(10_000)
        });
        world.mutate::<Combat, _>(hero, |c| c.attack_cooldown = 1000);
        let rat = mob(&world, "rat", cave);
        world.mutate::<Combat, _>(rat, |c| c.attack_cooldown = 1000);
        world.mutate::<Combat, _>(rat, |c| c.last_attack_tick = Some(0));
        world.mutate::<Combat, _>(hero, |c| c.last_attack_tick = Some(0));
        engage(&world, hero, rat);

        let mut sim = sim(world.clone(), SimConfig::default());
        let mut escaped = false;
        for _ in 0..20 {
            sim.request_flee(hero).unwrap();
            let report = sim.tick().unwrap();
            if labels(&report).contains(&"flee_succeeded") {
                escaped = true;
                break;
            }
        }
        assert!(escaped);
        assert_eq!(world.get::<Location>(hero).unwrap().room, tunnel);
        assert!(!world.get::<Combat>(hero).unwrap().in_combat());
        assert!(!world.get::<Combat>(rat).unwrap().in_combat());
        assert_consistent(&world, &[hero, rat]);
    }

    #[test]
    fn critical_stun_is_configurable() {
        let world = Arc::new(World::new());
        let cave = room(&world, "Cave");
        let hero = player(&world, "Ayla", cave);
        world.mutate::<Stats, _>(hero, |s| s.health = dm_core::Resource::full(10_000));
        let ogre = mob(&world, "ogre", cave);
        world.mutate::<Stats, _>(ogre, |s| s.health = dm_core::Resource::full(10_000));
        engage(&world, hero, ogre);

        let mut config = SimConfig::default();
        config.combat.crit_stun_ticks = 2;
        let mut sim = sim(world.clone(), config);
        let mut stunned = false;
        for _ in 0..200 {
            let report = sim.tick().unwrap();
            assert_consistent(&world, &[hero, ogre]);
            if labels(&report).contains(&"stunned") {
                stunned = true;
            }
        }
        assert!(stunned);
    }
}
