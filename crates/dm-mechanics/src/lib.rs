//! Game mechanics for Duskmoor.
//!
//! Provides dice rolling, dice-expression parsing, and the combat rules
//! used by the simulation: to-hit, damage, flee chance, and experience.

pub mod combat;
pub mod dice;
pub mod error;

pub use combat::{AttackProfile, AttackRoll, HitOutcome};
pub use dice::{DiceExpr, DicePool, Die, DieResult, RollResult};
pub use error::{MechError, MechResult};
