use dm_core::Position;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
    /// Requests older than this many ticks are discarded as stale.
    pub request_ttl: u64,
    pub movement: MovementConfig,
    pub combat: CombatConfig,
    pub regeneration: RegenerationConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_events: 0,
            request_ttl: 5,
            movement: MovementConfig::default(),
            combat: CombatConfig::default(),
            regeneration: RegenerationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Stamina spent per step.
    pub stamina_cost: i32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self { stamina_cost: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Ticks a critical hit stuns its target for. 0 disables stuns.
    pub crit_stun_ticks: u64,
    /// Whether players earn experience for kills.
    pub award_experience: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            crit_stun_ticks: 0,
            award_experience: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenerationConfig {
    /// Regeneration runs on ticks that are a multiple of this.
    pub interval_ticks: u64,
    pub health_rate: f64,
    pub mana_rate: f64,
    pub stamina_rate: f64,
    /// Extra multiplier inside safe rooms.
    pub safe_room_bonus: f64,
    pub standing_factor: f64,
    pub sitting_factor: f64,
    pub resting_factor: f64,
    pub sleeping_factor: f64,
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            interval_ticks: 5,
            health_rate: 2.0,
            mana_rate: 1.0,
            stamina_rate: 3.0,
            safe_room_bonus: 1.5,
            standing_factor: 1.0,
            sitting_factor: 1.5,
            resting_factor: 2.0,
            sleeping_factor: 3.0,
        }
    }
}

impl RegenerationConfig {
    pub fn position_factor(&self, position: Position) -> f64 {
        match position {
            Position::Standing => self.standing_factor,
            Position::Sitting => self.sitting_factor,
            Position::Resting => self.resting_factor,
            Position::Sleeping => self.sleeping_factor,
        }
    }

    fn multipliers(&self) -> [(&'static str, f64); 8] {
        [
            ("health_rate", self.health_rate),
            ("mana_rate", self.mana_rate),
            ("stamina_rate", self.stamina_rate),
            ("safe_room_bonus", self.safe_room_bonus),
            ("standing_factor", self.standing_factor),
            ("sitting_factor", self.sitting_factor),
            ("resting_factor", self.resting_factor),
            ("sleeping_factor", self.sleeping_factor),
        ]
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    pub fn with_request_ttl(mut self, ticks: u64) -> Self {
        self.request_ttl = ticks;
        self
    }

    pub fn with_movement(mut self, movement: MovementConfig) -> Self {
        self.movement = movement;
        self
    }

    pub fn with_combat(mut self, combat: CombatConfig) -> Self {
        self.combat = combat;
        self
    }

    pub fn with_regeneration(mut self, regeneration: RegenerationConfig) -> Self {
        self.regeneration = regeneration;
        self
    }

    /// Parse a JSON document and validate it. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.request_ttl == 0 {
            return Err(SimError::InvalidConfig(
                "request_ttl must be at least 1".into(),
            ));
        }
        if self.movement.stamina_cost < 0 {
            return Err(SimError::InvalidConfig(
                "movement.stamina_cost must not be negative".into(),
            ));
        }
        if self.regeneration.interval_ticks == 0 {
            return Err(SimError::InvalidConfig(
                "regeneration.interval_ticks must be at least 1".into(),
            ));
        }
        for (name, value) in self.regeneration.multipliers() {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "regeneration.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = SimConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.max_events, 0);
        assert_eq!(config.movement.stamina_cost, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_builder_chain() {
        let config = SimConfig::default()
            .with_seed(123)
            .with_max_events(500)
            .with_request_ttl(2);
        assert_eq!(config.seed, 123);
        assert_eq!(config.max_events, 500);
        assert_eq!(config.request_ttl, 2);
    }

    #[test]
    fn position_factors_are_ordered() {
        let regen = RegenerationConfig::default();
        let sleeping = regen.position_factor(Position::Sleeping);
        let resting = regen.position_factor(Position::Resting);
        let sitting = regen.position_factor(Position::Sitting);
        let standing = regen.position_factor(Position::Standing);
        assert!(sleeping > resting && resting > sitting && sitting > standing);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            SimConfig::from_json_str(r#"{"seed": 7, "regeneration": {"interval_ticks": 2}}"#)
                .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.regeneration.interval_ticks, 2);
        assert!((config.regeneration.safe_room_bonus - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.request_ttl, 5);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = SimConfig::from_json_str(r#"{"regeneration": {"interval_ticks": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn negative_multiplier_is_rejected() {
        let mut config = SimConfig::default();
        config.regeneration.safe_room_bonus = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("safe_room_bonus"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimConfig::from_json_str("{not json"),
            Err(SimError::Json(_))
        ));
    }
}
