//! Combat rules: to-hit, damage, flee chance and experience awards.
//!
//! The rule functions take explicit die results so they are fully
//! deterministic; the `roll_*` wrappers draw those results from an RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dice::{DiceExpr, Die, RollResult};

/// Lowest flee chance, in percent.
pub const FLEE_CHANCE_MIN: u32 = 10;
/// Highest flee chance, in percent.
pub const FLEE_CHANCE_MAX: u32 = 90;
const FLEE_CHANCE_BASE: i32 = 50;
const FLEE_DEX_WEIGHT: i32 = 5;
const FLEE_ATTACKER_PENALTY: i32 = 10;

/// Experience per level of a slain victim.
pub const EXPERIENCE_PER_LEVEL: u64 = 100;

/// Outcome of an attack roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitOutcome {
    Miss,
    Hit,
    /// A natural 20: always hits, damage is doubled.
    Critical,
}

impl HitOutcome {
    pub fn is_hit(self) -> bool {
        !matches!(self, Self::Miss)
    }
}

/// The attacker's side of a to-hit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttackProfile {
    pub attack_bonus: i32,
    pub dex_modifier: i32,
    pub damage_bonus: i32,
}

/// A resolved attack roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackRoll {
    pub natural: u32,
    pub total: i32,
    pub outcome: HitOutcome,
}

/// Resolve a d20 attack roll against `armor_class`.
///
/// A natural 1 always misses and a natural 20 always hits as a critical.
/// Otherwise the attack hits when `natural + attack_bonus + dex_modifier`
/// meets or beats the armor class.
pub fn resolve_to_hit(natural: u32, attacker: &AttackProfile, armor_class: i32) -> AttackRoll {
    let total = i32::try_from(natural)
        .unwrap_or(i32::MAX)
        .saturating_add(attacker.attack_bonus)
        .saturating_add(attacker.dex_modifier);
    let outcome = match natural {
        1 => HitOutcome::Miss,
        20 => HitOutcome::Critical,
        _ if total >= armor_class => HitOutcome::Hit,
        _ => HitOutcome::Miss,
    };
    AttackRoll {
        natural,
        total,
        outcome,
    }
}

/// Damage from a rolled weapon expression.
///
/// The roll total already includes the expression's own modifier. The
/// attacker's damage bonus is added, the sum doubled on a critical, and
/// the result never drops below 1.
pub fn damage(weapon: &RollResult, damage_bonus: i32, critical: bool) -> i32 {
    let base = weapon.total().saturating_add(damage_bonus);
    let scaled = if critical {
        base.saturating_mul(2)
    } else {
        base
    };
    scaled.max(1)
}

/// Percent chance to escape, clamped to `[FLEE_CHANCE_MIN, FLEE_CHANCE_MAX]`.
pub fn flee_chance(dex_modifier: i32, attackers: usize) -> u32 {
    let attackers = i32::try_from(attackers).unwrap_or(i32::MAX);
    let raw = FLEE_CHANCE_BASE
        .saturating_add(dex_modifier.saturating_mul(FLEE_DEX_WEIGHT))
        .saturating_sub(attackers.saturating_mul(FLEE_ATTACKER_PENALTY));
    raw.clamp(FLEE_CHANCE_MIN as i32, FLEE_CHANCE_MAX as i32)
        .unsigned_abs()
}

/// A d100 roll at or below the chance succeeds.
pub fn flee_succeeds(d100: u32, chance: u32) -> bool {
    d100 <= chance
}

/// Experience awarded for killing a victim of `victim_level`.
pub fn experience_for_kill(victim_level: u32) -> u64 {
    u64::from(victim_level.max(1)).saturating_mul(EXPERIENCE_PER_LEVEL)
}

// ---------------------------------------------------------------------------
// Seeded-RNG wrappers
// ---------------------------------------------------------------------------

pub fn roll_d20<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(1..=Die::D20.sides())
}

pub fn roll_d100<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(1..=Die::D100.sides())
}

pub fn roll_to_hit<R: Rng + ?Sized>(
    rng: &mut R,
    attacker: &AttackProfile,
    armor_class: i32,
) -> AttackRoll {
    resolve_to_hit(roll_d20(rng), attacker, armor_class)
}

pub fn roll_damage<R: Rng + ?Sized>(
    rng: &mut R,
    weapon: &DiceExpr,
    damage_bonus: i32,
    critical: bool,
) -> i32 {
    damage(&weapon.roll(rng), damage_bonus, critical)
}
