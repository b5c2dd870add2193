//! Component data types owned by entities.
//!
//! Rooms live in [`crate::room`]; everything else an entity can carry is
//! defined here. Each type is registered with a [`crate::kind::ComponentKind`].

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::room::Direction;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Factory template this entity was created from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keywords: Vec::new(),
            template: None,
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Case-insensitive substring match against the name or any keyword.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&query)
            || self
                .keywords
                .iter()
                .any(|k| k.to_lowercase().contains(&query))
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Where an entity currently is. Written only by movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub room: EntityId,
    pub previous_room: Option<EntityId>,
    /// Tick at which the entity entered `room`.
    pub entered_at: u64,
}

impl Location {
    pub fn new(room: EntityId, entered_at: u64) -> Self {
        Self {
            room,
            previous_room: None,
            entered_at,
        }
    }

    /// The location after moving to `destination` at tick `now`.
    pub fn moved_to(&self, destination: EntityId, now: u64) -> Self {
        Self {
            room: destination,
            previous_room: Some(self.room),
            entered_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// A bounded resource such as health. Always `0 <= current <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub current: i32,
    pub max: i32,
}

impl Resource {
    /// A full resource.
    pub fn full(max: i32) -> Self {
        let max = max.max(0);
        Self { current: max, max }
    }

    pub fn new(current: i32, max: i32) -> Self {
        let max = max.max(0);
        Self {
            current: current.clamp(0, max),
            max,
        }
    }

    /// Adjust by `delta`, clamped to `[0, max]`. Returns the new value.
    pub fn adjust(&mut self, delta: i32) -> i32 {
        self.current = self.current.saturating_add(delta).clamp(0, self.max);
        self.current
    }

    /// Raise by up to `amount` without exceeding max. Returns the gain applied.
    pub fn restore(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let before = self.current;
        self.adjust(amount);
        self.current - before
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub health: Resource,
    pub mana: Resource,
    pub stamina: Resource,
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub damage_bonus: i32,
    pub dexterity: i32,
    pub level: u32,
    #[serde(default)]
    pub experience: u64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            health: Resource::full(20),
            mana: Resource::full(10),
            stamina: Resource::full(20),
            armor_class: 10,
            attack_bonus: 0,
            damage_bonus: 0,
            dexterity: 10,
            level: 1,
            experience: 0,
        }
    }
}

impl Stats {
    pub fn with_health(mut self, max: i32) -> Self {
        self.health = Resource::full(max);
        self
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = armor_class;
        self
    }

    pub fn with_attack(mut self, attack_bonus: i32, damage_bonus: i32) -> Self {
        self.attack_bonus = attack_bonus;
        self.damage_bonus = damage_bonus;
        self
    }

    pub fn with_dexterity(mut self, dexterity: i32) -> Self {
        self.dexterity = dexterity;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Apply a signed change to current health. Negative deltas are damage.
    ///
    /// Health is clamped to `[0, max]`; reaching zero is the death trigger
    /// picked up by the death system.
    pub fn apply_health_delta(&mut self, delta: i32) -> i32 {
        self.health.adjust(delta)
    }

    /// Bounded heal. Returns the health actually gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        self.health.restore(amount)
    }

    pub fn restore_mana(&mut self, amount: i32) -> i32 {
        self.mana.restore(amount)
    }

    pub fn restore_stamina(&mut self, amount: i32) -> i32 {
        self.stamina.restore(amount)
    }

    /// Spend stamina if enough is available. Returns false and leaves
    /// stamina untouched otherwise.
    pub fn spend_stamina(&mut self, cost: i32) -> bool {
        if self.stamina.current < cost {
            return false;
        }
        self.stamina.adjust(-cost);
        true
    }

    pub fn is_alive(&self) -> bool {
        self.health.current > 0
    }

    /// Ability modifier derived from dexterity: `floor((dex - 10) / 2)`.
    pub fn dex_modifier(&self) -> i32 {
        (self.dexterity - 10).div_euclid(2)
    }

    pub fn gain_experience(&mut self, amount: u64) {
        self.experience = self.experience.saturating_add(amount);
    }
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatState {
    #[default]
    Idle,
    Engaged,
    Fleeing,
    Stunned,
    Dead,
}

impl std::fmt::Display for CombatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Engaged => write!(f, "engaged"),
            Self::Fleeing => write!(f, "fleeing"),
            Self::Stunned => write!(f, "stunned"),
            Self::Dead => write!(f, "dead"),
        }
    }
}

/// Combat component.
///
/// Relationship mutators re-derive `state`, so an entity that is not dead
/// is in a fighting state exactly when it has a target or at least one
/// attacker. Clearing both returns it to idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combat {
    pub state: CombatState,
    pub target: Option<EntityId>,
    /// Reverse relationship: entities currently targeting this one.
    pub targeted_by: Vec<EntityId>,
    pub last_attack_tick: Option<u64>,
    /// Minimum ticks between two attacks.
    pub attack_cooldown: u64,
    pub stunned_until: Option<u64>,
    /// Weapon damage as a dice expression, e.g. `1d6+2`.
    pub weapon_damage: String,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub last_attacker: Option<EntityId>,
}

impl Default for Combat {
    fn default() -> Self {
        Self {
            state: CombatState::Idle,
            target: None,
            targeted_by: Vec::new(),
            last_attack_tick: None,
            attack_cooldown: 1,
            stunned_until: None,
            weapon_damage: "1d4".to_string(),
            damage_dealt: 0,
            damage_taken: 0,
            last_attacker: None,
        }
    }
}

impl Combat {
    pub fn with_weapon(weapon_damage: impl Into<String>) -> Self {
        Self {
            weapon_damage: weapon_damage.into(),
            ..Self::default()
        }
    }

    pub fn with_cooldown(mut self, ticks: u64) -> Self {
        self.attack_cooldown = ticks;
        self
    }

    pub fn has_opponents(&self) -> bool {
        self.target.is_some() || !self.targeted_by.is_empty()
    }

    /// True while fighting: engaged, stunned or fleeing with opponents.
    pub fn in_combat(&self) -> bool {
        !self.is_dead() && self.has_opponents()
    }

    pub fn is_dead(&self) -> bool {
        self.state == CombatState::Dead
    }

    pub fn set_target(&mut self, target: EntityId) {
        if self.is_dead() {
            return;
        }
        self.target = Some(target);
        self.refresh_state();
    }

    pub fn clear_target(&mut self) {
        self.target = None;
        self.refresh_state();
    }

    pub fn add_attacker(&mut self, attacker: EntityId) {
        if self.is_dead() {
            return;
        }
        if !self.targeted_by.contains(&attacker) {
            self.targeted_by.push(attacker);
        }
        self.refresh_state();
    }

    pub fn remove_attacker(&mut self, attacker: EntityId) {
        self.targeted_by.retain(|id| *id != attacker);
        self.refresh_state();
    }

    /// Drop every relationship with `other`. If it was the current target,
    /// switch to the first remaining attacker. Returns the new target.
    pub fn forget(&mut self, other: EntityId) -> Option<EntityId> {
        self.targeted_by.retain(|id| *id != other);
        if self.target == Some(other) {
            self.target = self.targeted_by.first().copied();
        }
        self.refresh_state();
        self.target
    }

    pub fn clear_relationships(&mut self) {
        self.target = None;
        self.targeted_by.clear();
        self.refresh_state();
    }

    pub fn mark_dead(&mut self) {
        self.target = None;
        self.targeted_by.clear();
        self.state = CombatState::Dead;
    }

    pub fn stun(&mut self, until: u64) {
        if self.in_combat() {
            self.state = CombatState::Stunned;
            self.stunned_until = Some(until);
        }
    }

    /// Leave the stunned state once `now` reaches the stun deadline.
    /// Returns true if the entity recovered.
    pub fn recover(&mut self, now: u64) -> bool {
        if self.state != CombatState::Stunned {
            return false;
        }
        if self.stunned_until.is_some_and(|until| now < until) {
            return false;
        }
        self.stunned_until = None;
        self.state = CombatState::Idle;
        self.refresh_state();
        true
    }

    pub fn begin_flee(&mut self) {
        if self.in_combat() {
            self.state = CombatState::Fleeing;
        }
    }

    pub fn cooldown_elapsed(&self, now: u64) -> bool {
        self.last_attack_tick
            .is_none_or(|last| last.saturating_add(self.attack_cooldown) <= now)
    }

    /// Check the state/relationship invariant.
    pub fn is_consistent(&self) -> bool {
        match self.state {
            CombatState::Dead | CombatState::Idle => !self.has_opponents(),
            CombatState::Engaged | CombatState::Fleeing | CombatState::Stunned => {
                self.has_opponents()
            }
        }
    }

    fn refresh_state(&mut self) {
        self.state = match self.state {
            CombatState::Dead => CombatState::Dead,
            _ if !self.has_opponents() => CombatState::Idle,
            CombatState::Idle => CombatState::Engaged,
            other => other,
        };
        if self.state != CombatState::Stunned {
            self.stunned_until = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    #[default]
    Standing,
    Sitting,
    Resting,
    Sleeping,
}

impl Position {
    pub fn is_standing(self) -> bool {
        self == Self::Standing
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standing => write!(f, "standing"),
            Self::Sitting => write!(f, "sitting"),
            Self::Resting => write!(f, "resting"),
            Self::Sleeping => write!(f, "sleeping"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transient requests
// ---------------------------------------------------------------------------

/// Deposited by the command layer, consumed by the movement system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub direction: Direction,
    pub issued_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackTarget {
    Entity(EntityId),
    /// Name or keyword, optionally with an `N.` ordinal prefix.
    Keyword(String),
}

/// Deposited by the command layer, consumed by combat initiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRequest {
    pub target: AttackTarget,
    pub issued_at: u64,
}

/// Deposited by the command layer, consumed by combat resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleeRequest {
    pub issued_at: u64,
}
