//! Dice pool construction and rolling.

use rand::Rng;

use super::Die;
use super::roll::{DieResult, RollResult};

/// A collection of dice rolled together, plus a flat modifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DicePool {
    pub dice: Vec<Die>,
    pub modifier: i32,
}

impl DicePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` dice of the given type.
    pub fn add(mut self, die: Die, count: u32) -> Self {
        for _ in 0..count {
            self.dice.push(die);
        }
        self
    }

    pub fn with_modifier(mut self, modifier: i32) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn count(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    /// Roll all dice in the pool using the given RNG.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> RollResult {
        let dice = self
            .dice
            .iter()
            .map(|die| DieResult {
                die: *die,
                value: rng.random_range(1..=die.sides()),
            })
            .collect();
        RollResult {
            dice,
            modifier: self.modifier,
        }
    }
}
