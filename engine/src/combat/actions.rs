use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Action,
    BonusAction,
    Reaction,
    Movement,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Action,
        ActionKind::BonusAction,
        ActionKind::Reaction,
        ActionKind::Movement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Action => "action",
            ActionKind::BonusAction => "bonus_action",
            ActionKind::Reaction => "reaction",
            ActionKind::Movement => "movement",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "action" => Ok(ActionKind::Action),
            "bonus_action" | "bonus" => Ok(ActionKind::BonusAction),
            "reaction" => Ok(ActionKind::Reaction),
            "movement" | "move" => Ok(ActionKind::Movement),
            _ => Err(EngineError::UnknownAction(s.to_string())),
        }
    }
}

/// Per-turn availability of each action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEconomy {
    pub action: bool,
    pub bonus_action: bool,
    pub reaction: bool,
    pub movement: bool,
}

impl Default for ActionEconomy {
    fn default() -> Self {
        Self {
            action: true,
            bonus_action: true,
            reaction: true,
            movement: true,
        }
    }
}

impl ActionEconomy {
    fn slot(&mut self, kind: ActionKind) -> &mut bool {
        match kind {
            ActionKind::Action => &mut self.action,
            ActionKind::BonusAction => &mut self.bonus_action,
            ActionKind::Reaction => &mut self.reaction,
            ActionKind::Movement => &mut self.movement,
        }
    }

    pub fn is_available(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Action => self.action,
            ActionKind::BonusAction => self.bonus_action,
            ActionKind::Reaction => self.reaction,
            ActionKind::Movement => self.movement,
        }
    }

    /// Marks `kind` used. Returns false (and changes nothing) if it already was.
    pub fn consume(&mut self, kind: ActionKind) -> bool {
        let slot = self.slot(kind);
        if *slot {
            *slot = false;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Remaining spell slots keyed by spell level (1 through 9).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpellSlots(BTreeMap<u8, u32>);

impl SpellSlots {
    pub const MAX_LEVEL: u8 = 9;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, level: u8, count: u32) {
        if (1..=Self::MAX_LEVEL).contains(&level) {
            self.0.insert(level, count);
        }
    }

    pub fn remaining(&self, level: u8) -> u32 {
        self.0.get(&level).copied().unwrap_or(0)
    }

    /// Spends one slot of `level`. Fails for levels outside 1..=9 and for
    /// levels with nothing left.
    pub fn spend(&mut self, level: u8) -> bool {
        if !(1..=Self::MAX_LEVEL).contains(&level) {
            return false;
        }
        match self.0.get_mut(&level) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.0.iter().map(|(l, n)| (*l, *n))
    }
}

impl FromIterator<(u8, u32)> for SpellSlots {
    fn from_iter<I: IntoIterator<Item = (u8, u32)>>(iter: I) -> Self {
        let mut slots = SpellSlots::new();
        for (level, count) in iter {
            slots.set(level, count);
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_once_per_turn() {
        let mut eco = ActionEconomy::default();
        assert!(eco.consume(ActionKind::Reaction));
        assert!(!eco.consume(ActionKind::Reaction));
        assert!(eco.is_available(ActionKind::Action));
        eco.reset();
        assert!(eco.is_available(ActionKind::Reaction));
    }

    #[test]
    fn action_names() {
        assert_eq!("Bonus Action".parse::<ActionKind>(), Ok(ActionKind::BonusAction));
        assert_eq!("bonus-action".parse::<ActionKind>(), Ok(ActionKind::BonusAction));
        assert!("dance".parse::<ActionKind>().is_err());
    }

    #[test]
    fn slots_spend_down_to_zero() {
        let mut slots: SpellSlots = [(1, 1), (3, 0), (12, 4)].into_iter().collect();
        assert!(slots.spend(1));
        assert!(!slots.spend(1));
        assert!(!slots.spend(3));
        assert!(!slots.spend(0));
        assert_eq!(slots.remaining(12), 0);
    }
}
