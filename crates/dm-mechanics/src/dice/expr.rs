//! Parsing of dice expressions such as `1d6+2`.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{DicePool, Die, RollResult};
use crate::error::{MechError, MechResult};

/// Largest number of dice one expression may roll.
pub const MAX_DICE: u32 = 100;

/// `NdS+M`: roll `count` dice of `die` and add `modifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceExpr {
    pub count: u32,
    pub die: Die,
    pub modifier: i32,
}

impl DiceExpr {
    pub fn new(count: u32, die: Die, modifier: i32) -> Self {
        Self {
            count,
            die,
            modifier,
        }
    }

    /// Parse `NdS`, `dS`, `NdS+M` or `NdS-M`. Whitespace is ignored.
    pub fn parse(input: &str) -> MechResult<Self> {
        let invalid = || MechError::InvalidDiceExpr(input.to_string());
        let compact: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        let (count_part, rest) = compact.split_once('d').ok_or_else(invalid)?;
        let count = if count_part.is_empty() {
            1
        } else {
            count_part.parse::<u32>().map_err(|_| invalid())?
        };
        if count == 0 || count > MAX_DICE {
            return Err(invalid());
        }

        let (sides_part, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let (sides, signed) = rest.split_at(pos);
                let magnitude = signed[1..].parse::<i32>().map_err(|_| invalid())?;
                let modifier = if signed.starts_with('-') {
                    -magnitude
                } else {
                    magnitude
                };
                (sides, modifier)
            }
            None => (rest, 0),
        };
        let sides = sides_part.parse::<u32>().map_err(|_| invalid())?;
        let die = Die::with_sides(sides).ok_or_else(invalid)?;

        Ok(Self::new(count, die, modifier))
    }

    pub fn to_pool(&self) -> DicePool {
        DicePool::new()
            .add(self.die, self.count)
            .with_modifier(self.modifier)
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> RollResult {
        self.to_pool().roll(rng)
    }

    /// Lowest possible total.
    pub fn min(&self) -> i32 {
        i32::try_from(self.count)
            .unwrap_or(i32::MAX)
            .saturating_add(self.modifier)
    }

    /// Highest possible total.
    pub fn max(&self) -> i32 {
        i32::try_from(self.count.saturating_mul(self.die.sides()))
            .unwrap_or(i32::MAX)
            .saturating_add(self.modifier)
    }
}

impl FromStr for DiceExpr {
    type Err = MechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.die)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}
