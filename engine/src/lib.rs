//! Skirmish engine: dice, attack/damage resolution, combat state, an
//! append-only combat log and XP-budget encounter generation for 5e-style
//! tabletop combat.

use std::collections::VecDeque;
use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub mod api;
pub mod catalog;
pub mod clock;
pub mod combat;
pub mod conditions;
pub mod config;
pub mod content;
pub mod encounter;
pub mod error;
pub mod life;
pub mod log;
pub mod resolve;
pub mod roll;
pub mod telemetry;
pub mod xp;

pub use api::{CombatSession, CombatSnapshot};
pub use catalog::{Monster, MonsterCatalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use combat::{ActionKind, CombatState, Participant, Role};
pub use encounter::{Difficulty, DifficultyRating, EncounterResult, MonsterPick};
pub use error::{EngineError, EngineResult};
pub use log::{CombatLog, LogEntry, LogKind};
pub use resolve::{
    roll_attack, roll_damage, AttackResult, DamageModifier, DamageProfile, DamageResult,
    DamageType, Defenses,
};
pub use roll::{parse_dice_expression, roll_d20, roll_dice, D20Roll, DiceExpr, DiceRoll};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdMode {
    Normal,
    Advantage,
    Disadvantage,
}

impl AdMode {
    /// Advantage and disadvantage cancel out when both apply.
    pub fn from_flags(advantage: bool, disadvantage: bool) -> Self {
        match (advantage, disadvantage) {
            (true, false) => AdMode::Advantage,
            (false, true) => AdMode::Disadvantage,
            _ => AdMode::Normal,
        }
    }
}

// Seed of the stream a scripted source continues on once its values run out.
const SCRIPT_TAIL_SEED: u64 = 0;

enum Source {
    Seeded(ChaCha8Rng),
    Scripted {
        values: VecDeque<u32>,
        tail: ChaCha8Rng,
    },
}

/// The single source of randomness for the crate.
///
/// Every roll and every random pick goes through a `Dice`, so a seeded or
/// scripted instance makes any combat or encounter reproducible.
pub struct Dice {
    source: Source,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: Source::Seeded(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    /// Replays `values` in order before falling back to a fixed-seed stream.
    ///
    /// Die rolls return a scripted value unchanged; [`Dice::pick`] reduces it
    /// modulo the number of choices.
    pub fn from_scripted(values: Vec<u32>) -> Self {
        Self {
            source: Source::Scripted {
                values: values.into(),
                tail: ChaCha8Rng::seed_from_u64(SCRIPT_TAIL_SEED),
            },
        }
    }

    fn next_scripted(&mut self) -> Option<u32> {
        match &mut self.source {
            Source::Scripted { values, .. } => values.pop_front(),
            Source::Seeded(_) => None,
        }
    }

    fn rng(&mut self) -> &mut ChaCha8Rng {
        match &mut self.source {
            Source::Seeded(rng) => rng,
            Source::Scripted { tail, .. } => tail,
        }
    }

    /// One die in `1..=sides`.
    pub fn roll(&mut self, sides: u32) -> u32 {
        if let Some(value) = self.next_scripted() {
            return value;
        }
        self.rng().gen_range(1..=sides.max(1))
    }

    pub fn d20(&mut self, mode: AdMode) -> u8 {
        let mut roll = || self.roll(20) as u8;
        match mode {
            AdMode::Normal => roll(),
            AdMode::Advantage => {
                let a = roll();
                let b = roll();
                a.max(b)
            }
            AdMode::Disadvantage => {
                let a = roll();
                let b = roll();
                a.min(b)
            }
        }
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn pick(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "pick from an empty set");
        if let Some(value) = self.next_scripted() {
            return value as usize % len.max(1);
        }
        self.rng().gen_range(0..len.max(1))
    }
}

impl fmt::Debug for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Seeded(_) => f.write_str("Dice(seeded)"),
            Source::Scripted { values, .. } => {
                write!(f, "Dice(scripted, {} left)", values.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_cancel() {
        assert_eq!(AdMode::from_flags(true, true), AdMode::Normal);
        assert_eq!(AdMode::from_flags(true, false), AdMode::Advantage);
        assert_eq!(AdMode::from_flags(false, true), AdMode::Disadvantage);
        assert_eq!(AdMode::from_flags(false, false), AdMode::Normal);
    }

    #[test]
    fn seeded_dice_repeat() {
        let mut a = Dice::from_seed(99);
        let mut b = Dice::from_seed(99);
        let xs: Vec<u32> = (0..16).map(|_| a.roll(12)).collect();
        let ys: Vec<u32> = (0..16).map(|_| b.roll(12)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|v| (1..=12).contains(v)));
    }

    #[test]
    fn scripted_values_come_first() {
        let mut dice = Dice::from_scripted(vec![7, 20, 5]);
        assert_eq!(dice.d20(AdMode::Advantage), 20);
        assert_eq!(dice.pick(3), 2);
        let tail = dice.roll(6);
        assert!((1..=6).contains(&tail));
    }
}
