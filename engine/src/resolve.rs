//! Attack and damage resolution.
//!
//! Everything here is pure with respect to combat state: results describe what
//! happened and callers apply `final_damage` to hit points themselves.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::roll::{parse_dice_expression, roll_d20, roll_dice, D20Roll, DiceExpr, DiceRoll};
use crate::{Dice, EngineError};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Bludgeoning,
    Piercing,
    #[default]
    Slashing,
    Fire,
    Cold,
    Lightning,
    Acid,
    Poison,
    Psychic,
    Radiant,
    Necrotic,
    Thunder,
    Force,
}

impl DamageType {
    pub const ALL: [DamageType; 13] = [
        DamageType::Bludgeoning,
        DamageType::Piercing,
        DamageType::Slashing,
        DamageType::Fire,
        DamageType::Cold,
        DamageType::Lightning,
        DamageType::Acid,
        DamageType::Poison,
        DamageType::Psychic,
        DamageType::Radiant,
        DamageType::Necrotic,
        DamageType::Thunder,
        DamageType::Force,
    ];

    pub fn as_str(self) -> &'static str {
        use DamageType::*;
        match self {
            Bludgeoning => "bludgeoning",
            Piercing => "piercing",
            Slashing => "slashing",
            Fire => "fire",
            Cold => "cold",
            Lightning => "lightning",
            Acid => "acid",
            Poison => "poison",
            Psychic => "psychic",
            Radiant => "radiant",
            Necrotic => "necrotic",
            Thunder => "thunder",
            Force => "force",
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DamageType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        DamageType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| EngineError::UnknownDamageType(s.to_string()))
    }
}

/// Which defensive modifier changed a damage roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageModifier {
    Immune,
    Resistant,
    Vulnerable,
}

/// Defensive flags that apply to one hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defenses {
    #[serde(default)]
    pub resistance: bool,
    #[serde(default)]
    pub immunity: bool,
    #[serde(default)]
    pub vulnerability: bool,
}

impl Defenses {
    pub fn merge(self, other: Defenses) -> Defenses {
        Defenses {
            resistance: self.resistance || other.resistance,
            immunity: self.immunity || other.immunity,
            vulnerability: self.vulnerability || other.vulnerability,
        }
    }

    /// Immunity zeroes damage, otherwise resistance halves it (rounding down),
    /// otherwise vulnerability doubles it.
    pub fn apply(self, base: u32) -> (u32, Option<DamageModifier>) {
        if self.immunity {
            (0, Some(DamageModifier::Immune))
        } else if self.resistance {
            (base / 2, Some(DamageModifier::Resistant))
        } else if self.vulnerability {
            (base.saturating_mul(2), Some(DamageModifier::Vulnerable))
        } else {
            (base, None)
        }
    }
}

/// Standing resistances, immunities and vulnerabilities of a creature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageProfile {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub resistances: BTreeSet<DamageType>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub immunities: BTreeSet<DamageType>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub vulnerabilities: BTreeSet<DamageType>,
}

impl DamageProfile {
    pub fn is_empty(&self) -> bool {
        self.resistances.is_empty() && self.immunities.is_empty() && self.vulnerabilities.is_empty()
    }

    pub fn defenses_against(&self, damage_type: DamageType) -> Defenses {
        Defenses {
            resistance: self.resistances.contains(&damage_type),
            immunity: self.immunities.contains(&damage_type),
            vulnerability: self.vulnerabilities.contains(&damage_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResult {
    pub d20: D20Roll,
    pub bonus: i32,
    pub total: i32,
    pub target_ac: i32,
    pub hit: bool,
    pub crit: bool,
    pub crit_fail: bool,
}

/// Roll to hit. A natural 20 always hits and crits; a natural 1 always misses.
pub fn roll_attack(
    dice: &mut Dice,
    bonus: i32,
    target_ac: i32,
    advantage: bool,
    disadvantage: bool,
) -> AttackResult {
    let d20 = roll_d20(dice, advantage, disadvantage);
    let total = d20.result as i32 + bonus;
    let crit = d20.is_natural_20();
    let crit_fail = d20.is_natural_1();
    let hit = crit || (!crit_fail && total >= target_ac);
    AttackResult {
        d20,
        bonus,
        total,
        target_ac,
        hit,
        crit,
        crit_fail,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    /// The expression as the caller wrote it.
    pub expression: String,
    /// What the expression was read as.
    pub dice: DiceExpr,
    pub damage_type: DamageType,
    pub roll: DiceRoll,
    pub base: u32,
    #[serde(rename = "final")]
    pub final_damage: u32,
    pub applied: Option<DamageModifier>,
    pub crit: bool,
}

/// Roll damage from a dice expression and apply defenses to it.
pub fn roll_damage(
    dice: &mut Dice,
    expression: &str,
    damage_type: DamageType,
    crit: bool,
    defenses: Defenses,
) -> DamageResult {
    let expr = parse_dice_expression(expression);
    let roll = roll_dice(dice, expr.count, expr.sides, expr.modifier, crit);
    let base = roll.total;
    let (final_damage, applied) = defenses.apply(base);
    DamageResult {
        expression: expression.to_string(),
        dice: expr,
        damage_type,
        roll,
        base,
        final_damage,
        applied,
        crit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immunity_beats_everything() {
        let all = Defenses {
            resistance: true,
            immunity: true,
            vulnerability: true,
        };
        assert_eq!(all.apply(17), (0, Some(DamageModifier::Immune)));
    }

    #[test]
    fn resistance_rounds_down() {
        let d = Defenses {
            resistance: true,
            ..Defenses::default()
        };
        assert_eq!(d.apply(7), (3, Some(DamageModifier::Resistant)));
    }

    #[test]
    fn profile_maps_types_to_flags() {
        let mut profile = DamageProfile::default();
        profile.resistances.insert(DamageType::Fire);
        profile.vulnerabilities.insert(DamageType::Radiant);
        assert!(profile.defenses_against(DamageType::Fire).resistance);
        assert!(profile.defenses_against(DamageType::Radiant).vulnerability);
        assert_eq!(profile.defenses_against(DamageType::Cold), Defenses::default());
    }

    #[test]
    fn damage_type_parses_case_insensitively() {
        assert_eq!("Fire".parse::<DamageType>(), Ok(DamageType::Fire));
        assert!("ice".parse::<DamageType>().is_err());
    }
}
