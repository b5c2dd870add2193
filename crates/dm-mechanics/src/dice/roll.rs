//! Dice roll results and aggregation.

use serde::{Deserialize, Serialize};

use super::Die;

/// The result of rolling a single die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieResult {
    pub die: Die,
    /// The value rolled (1 to die.sides()).
    pub value: u32,
}

/// The result of rolling a dice pool, including its flat modifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub dice: Vec<DieResult>,
    pub modifier: i32,
}

impl RollResult {
    /// Result of a single die with no modifier.
    pub fn single(die: Die, value: u32) -> Self {
        Self {
            dice: vec![DieResult { die, value }],
            modifier: 0,
        }
    }

    /// Sum of all die values, without the modifier.
    pub fn dice_total(&self) -> u32 {
        self.dice.iter().map(|d| d.value).sum()
    }

    /// Dice plus modifier. May be negative for large negative modifiers.
    pub fn total(&self) -> i32 {
        i32::try_from(self.dice_total())
            .unwrap_or(i32::MAX)
            .saturating_add(self.modifier)
    }

    /// The first die's face value, or 0 if nothing was rolled.
    pub fn natural(&self) -> u32 {
        self.dice.first().map_or(0, |d| d.value)
    }

    pub fn highest(&self) -> u32 {
        self.dice.iter().map(|d| d.value).max().unwrap_or(0)
    }

    pub fn lowest(&self) -> u32 {
        self.dice.iter().map(|d| d.value).min().unwrap_or(0)
    }

    pub fn count(&self) -> usize {
        self.dice.len()
    }
}

impl std::fmt::Display for RollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<String> = self.dice.iter().map(|d| d.value.to_string()).collect();
        match self.modifier {
            0 => write!(f, "[{}] = {}", values.join(", "), self.total()),
            m if m > 0 => write!(f, "[{}]+{m} = {}", values.join(", "), self.total()),
            m => write!(f, "[{}]{m} = {}", values.join(", "), self.total()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(values: &[u32], modifier: i32) -> RollResult {
        RollResult {
            dice: values
                .iter()
                .map(|value| DieResult {
                    die: Die::D6,
                    value: *value,
                })
                .collect(),
            modifier,
        }
    }

    #[test]
    fn total_includes_modifier() {
        let r = make_result(&[4, 2], 3);
        assert_eq!(r.dice_total(), 6);
        assert_eq!(r.total(), 9);
        assert_eq!(make_result(&[1], -4).total(), -3);
    }

    #[test]
    fn highest_lowest_and_natural() {
        let r = make_result(&[3, 6, 1], 0);
        assert_eq!(r.natural(), 3);
        assert_eq!(r.highest(), 6);
        assert_eq!(r.lowest(), 1);
        assert_eq!(r.count(), 3);
    }

    #[test]
    fn empty_result() {
        let r = RollResult::default();
        assert_eq!(r.total(), 0);
        assert_eq!(r.natural(), 0);
        assert_eq!(r.highest(), 0);
    }

    #[test]
    fn display() {
        assert_eq!(make_result(&[3, 5], 0).to_string(), "[3, 5] = 8");
        assert_eq!(make_result(&[3], 2).to_string(), "[3]+2 = 5");
        assert_eq!(make_result(&[3], -1).to_string(), "[3]-1 = 2");
    }
}
