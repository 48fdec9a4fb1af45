//! XP-budget encounter generation.
//!
//! Budgets come from the published per-level thresholds; monsters are picked
//! by a randomized greedy search so repeated calls give varied encounters
//! near the requested difficulty.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::catalog::Monster;
use crate::resolve::DamageProfile;
use crate::{Dice, EngineError};

/// Give up after this many picks without reaching the target.
pub const MAX_ATTEMPTS: u32 = 50;
/// An encounter stops growing once its adjusted XP reaches this share of budget.
const TARGET_FILL: f64 = 0.9;
/// No pick may push adjusted XP above this share of budget.
const CEILING: f64 = 1.2;
/// Monsters costing more than this share of budget are skipped when possible.
const AFFORDABLE_SHARE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Deadly,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Deadly,
    ];

    fn column(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Deadly => "deadly",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| EngineError::InvalidDifficulty(s.to_string()))
    }
}

/// How hard an encounter actually is, including the tier below easy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyRating {
    Trivial,
    Easy,
    Medium,
    Hard,
    Deadly,
}

impl DifficultyRating {
    pub const ALL: [DifficultyRating; 5] = [
        DifficultyRating::Trivial,
        DifficultyRating::Easy,
        DifficultyRating::Medium,
        DifficultyRating::Hard,
        DifficultyRating::Deadly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyRating::Trivial => "trivial",
            DifficultyRating::Easy => "easy",
            DifficultyRating::Medium => "medium",
            DifficultyRating::Hard => "hard",
            DifficultyRating::Deadly => "deadly",
        }
    }
}

impl fmt::Display for DifficultyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Difficulty> for DifficultyRating {
    fn from(d: Difficulty) -> Self {
        match d {
            Difficulty::Easy => DifficultyRating::Easy,
            Difficulty::Medium => DifficultyRating::Medium,
            Difficulty::Hard => DifficultyRating::Hard,
            Difficulty::Deadly => DifficultyRating::Deadly,
        }
    }
}

/// Per-character XP thresholds, levels 1 to 20: easy, medium, hard, deadly.
pub const XP_THRESHOLDS: [[u32; 4]; 20] = [
    [25, 50, 75, 100],
    [50, 100, 150, 200],
    [75, 150, 225, 400],
    [125, 250, 375, 500],
    [250, 500, 750, 1100],
    [300, 600, 900, 1400],
    [350, 750, 1100, 1700],
    [450, 900, 1400, 2100],
    [550, 1100, 1600, 2400],
    [600, 1200, 1900, 2800],
    [800, 1600, 2400, 3600],
    [1000, 2000, 3000, 4500],
    [1100, 2200, 3400, 5100],
    [1250, 2500, 3800, 5700],
    [1400, 2800, 4300, 6400],
    [1600, 3200, 4800, 7200],
    [2000, 3900, 5900, 8800],
    [2100, 4200, 6300, 9500],
    [2400, 4900, 7300, 10900],
    [2800, 5700, 8500, 12700],
];

pub fn threshold(level: i32, difficulty: Difficulty) -> u32 {
    let row = level.clamp(1, 20) as usize - 1;
    XP_THRESHOLDS[row][difficulty.column()]
}

/// Sum of the party's thresholds. An empty party has no budget.
pub fn xp_budget(party_levels: &[i32], difficulty: Difficulty) -> u32 {
    party_levels
        .iter()
        .fold(0u32, |acc, &l| acc.saturating_add(threshold(l, difficulty)))
}

/// Encounter multiplier for the number of monsters on the field.
pub fn group_multiplier(monster_count: u32) -> f64 {
    match monster_count {
        0 | 1 => 1.0,
        2 => 1.5,
        3..=6 => 2.0,
        7..=10 => 2.5,
        11..=14 => 3.0,
        _ => 4.0,
    }
}

fn adjusted(total_xp: u32, count: u32) -> f64 {
    total_xp as f64 * group_multiplier(count)
}

/// One line of a generated encounter: a monster and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterPick {
    pub id: String,
    pub name: String,
    pub xp: u32,
    pub quantity: u32,
    pub ac: i32,
    pub hp: u32,
    pub cr: String,
    #[serde(default, skip_serializing_if = "DamageProfile::is_empty")]
    pub profile: DamageProfile,
}

impl MonsterPick {
    pub fn from_monster(m: &Monster, quantity: u32) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            xp: m.xp,
            quantity,
            ac: m.ac,
            hp: m.hp,
            cr: m.cr.clone(),
            profile: m.damage_profile(),
        }
    }

    pub fn total_xp(&self) -> u32 {
        self.xp.saturating_mul(self.quantity)
    }
}

#[derive(Default)]
struct Tally {
    picks: IndexMap<String, MonsterPick>,
    total_xp: u32,
    count: u32,
}

impl Tally {
    fn add(&mut self, m: &Monster, quantity: u32) {
        self.picks
            .entry(m.id.clone())
            .and_modify(|p| p.quantity = p.quantity.saturating_add(quantity))
            .or_insert_with(|| MonsterPick::from_monster(m, quantity));
        self.total_xp = self.total_xp.saturating_add(m.xp.saturating_mul(quantity));
        self.count = self.count.saturating_add(quantity);
    }
}

/// Randomized greedy selection of monsters against an XP budget.
///
/// The result may undershoot the budget (few candidates, attempt bound) and
/// may overshoot it when `min_count` forces extra copies of the cheapest
/// monster. An empty pool or zero budget selects nothing.
pub fn select_monsters(
    pool: &[Monster],
    budget: u32,
    max_count: u32,
    min_count: u32,
    dice: &mut Dice,
) -> Vec<MonsterPick> {
    if pool.is_empty() || budget == 0 {
        return Vec::new();
    }
    let budget_f = budget as f64;

    let mut affordable: Vec<&Monster> = pool
        .iter()
        .filter(|m| m.xp as f64 <= budget_f * AFFORDABLE_SHARE)
        .collect();
    if affordable.is_empty() {
        affordable.extend(pool.iter().min_by_key(|m| m.xp));
    }

    let mut tally = Tally::default();
    let mut slots = max_count;
    let mut attempts = 0;

    while slots > 0 && attempts < MAX_ATTEMPTS {
        attempts += 1;
        let candidates: Vec<&Monster> = affordable
            .iter()
            .copied()
            .filter(|m| {
                let total = tally.total_xp.saturating_add(m.xp);
                adjusted(total, tally.count.saturating_add(1)) <= budget_f * CEILING
            })
            .collect();
        if candidates.is_empty() {
            trace!(attempts, "no candidate fits under the ceiling");
            break;
        }

        let chosen = candidates[dice.pick(candidates.len())];
        tally.add(chosen, 1);
        slots -= 1;
        trace!(id = %chosen.id, count = tally.count, total_xp = tally.total_xp, "picked");

        if adjusted(tally.total_xp, tally.count) >= budget_f * TARGET_FILL {
            break;
        }
    }

    if tally.count < min_count {
        if let Some(cheapest) = affordable.iter().copied().min_by_key(|m| m.xp) {
            let needed = min_count - tally.count;
            debug!(id = %cheapest.id, needed, "topping up to the minimum count");
            tally.add(cheapest, needed);
        }
    }

    tally.picks.into_values().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterResult {
    pub party_levels: Vec<i32>,
    pub difficulty: Difficulty,
    pub xp_budget: u32,
    pub monsters: Vec<MonsterPick>,
    pub total_xp: u32,
    pub monster_count: u32,
    pub multiplier: f64,
    /// `total_xp * multiplier`, rounded down.
    pub adjusted_xp: u32,
}

impl EncounterResult {
    pub fn party_size(&self) -> usize {
        self.party_levels.len()
    }

    /// The difficulty the selected monsters actually add up to.
    pub fn rating(&self) -> DifficultyRating {
        difficulty_for_xp(&self.party_levels, self.adjusted_xp)
    }
}

pub fn generate(
    party_levels: &[i32],
    difficulty: Difficulty,
    pool: &[Monster],
    max_count: u32,
    min_count: u32,
    dice: &mut Dice,
) -> EncounterResult {
    let budget = xp_budget(party_levels, difficulty);
    let monsters = select_monsters(pool, budget, max_count, min_count, dice);
    let total_xp = monsters
        .iter()
        .fold(0u32, |acc, m| acc.saturating_add(m.total_xp()));
    let monster_count = monsters
        .iter()
        .fold(0u32, |acc, m| acc.saturating_add(m.quantity));
    let multiplier = group_multiplier(monster_count);
    let adjusted_xp = (total_xp as f64 * multiplier).floor() as u32;
    debug!(
        %difficulty,
        budget,
        total_xp,
        adjusted_xp,
        monster_count,
        "encounter generated"
    );
    EncounterResult {
        party_levels: party_levels.to_vec(),
        difficulty,
        xp_budget: budget,
        monsters,
        total_xp,
        monster_count,
        multiplier,
        adjusted_xp,
    }
}

/// Classifies adjusted XP against the party's thresholds. Each tier starts
/// at its threshold; an empty party is rated medium.
pub fn difficulty_for_xp(party_levels: &[i32], adjusted_xp: u32) -> DifficultyRating {
    if party_levels.is_empty() {
        return DifficultyRating::Medium;
    }
    let below = |d: Difficulty| adjusted_xp < xp_budget(party_levels, d);
    if below(Difficulty::Easy) {
        DifficultyRating::Trivial
    } else if below(Difficulty::Medium) {
        DifficultyRating::Easy
    } else if below(Difficulty::Hard) {
        DifficultyRating::Medium
    } else if below(Difficulty::Deadly) {
        DifficultyRating::Hard
    } else {
        DifficultyRating::Deadly
    }
}
