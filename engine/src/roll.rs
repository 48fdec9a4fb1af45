//! Dice expressions and the rolls built on them.
//!
//! Expressions use the usual `NdM+K` notation. [`parse_dice_expression`] is
//! lenient and never fails: anything it cannot read becomes one six-sided die.
//! The strict [`DiceExpr::from_str`] is for input that should be rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AdMode, Dice, EngineError};

/// A d20 roll with the raw dice kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    /// The kept die.
    pub result: u8,
    /// Every die rolled, in roll order.
    pub rolls: Vec<u8>,
    pub mode: AdMode,
    /// The die discarded by advantage or disadvantage.
    pub dropped: Option<u8>,
}

impl D20Roll {
    pub fn is_natural_20(&self) -> bool {
        self.result == 20
    }

    pub fn is_natural_1(&self) -> bool {
        self.result == 1
    }
}

/// Roll a d20. Advantage keeps the higher of two dice, disadvantage the
/// lower; with both set they cancel and a single die is rolled.
pub fn roll_d20(dice: &mut Dice, advantage: bool, disadvantage: bool) -> D20Roll {
    let mode = AdMode::from_flags(advantage, disadvantage);
    let first = dice.roll(20) as u8;
    match mode {
        AdMode::Normal => D20Roll {
            result: first,
            rolls: vec![first],
            mode,
            dropped: None,
        },
        AdMode::Advantage => {
            let second = dice.roll(20) as u8;
            D20Roll {
                result: first.max(second),
                rolls: vec![first, second],
                mode,
                dropped: Some(first.min(second)),
            }
        }
        AdMode::Disadvantage => {
            let second = dice.roll(20) as u8;
            D20Roll {
                result: first.min(second),
                rolls: vec![first, second],
                mode,
                dropped: Some(first.max(second)),
            }
        }
    }
}

/// `count` dice with `sides` faces plus a flat `modifier`.
///
/// A zero `count` is a fixed amount (`sides` is then irrelevant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceExpr {
    /// What an unreadable expression degrades to.
    pub const FALLBACK: DiceExpr = DiceExpr::new(1, 6, 0);

    pub const fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    pub const fn flat(modifier: i32) -> Self {
        Self::new(0, 0, modifier)
    }

    pub fn is_flat(&self) -> bool {
        self.count == 0
    }

    pub fn min(&self) -> u32 {
        clamp_total(self.count as i64 + self.modifier as i64)
    }

    pub fn max(&self) -> u32 {
        let faces = (self.count as i64).saturating_mul(self.sides as i64);
        clamp_total(faces.saturating_add(self.modifier as i64))
    }

    /// Expected total, rounded down.
    pub fn average(&self) -> u32 {
        let per_die = (1.0 + self.sides as f64) / 2.0;
        let avg = if self.is_flat() {
            self.modifier as f64
        } else {
            self.count as f64 * per_die + self.modifier as f64
        };
        avg.max(0.0) as u32
    }

    pub fn roll(&self, dice: &mut Dice, crit: bool) -> DiceRoll {
        roll_dice(dice, self.count, self.sides, self.modifier, crit)
    }
}

impl Default for DiceExpr {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_flat() {
            return write!(f, "{}", self.modifier);
        }
        write!(f, "{}d{}", self.count, self.sides)?;
        if self.modifier > 0 {
            write!(f, "+{}", self.modifier)
        } else if self.modifier < 0 {
            write!(f, "{}", self.modifier)
        } else {
            Ok(())
        }
    }
}

impl FromStr for DiceExpr {
    type Err = EngineError;

    /// Strict parse: the whole input must be an expression.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = normalize(s);
        if let Some(flat) = parse_flat(&text) {
            return Ok(flat);
        }
        match scan(&text) {
            Some((expr, used)) if used == text.len() && expr.sides > 0 => Ok(expr),
            _ => Err(EngineError::InvalidDice(s.to_string())),
        }
    }
}

/// Lenient parse of `NdM`, `NdM+K`, `NdM-K` (with `N` defaulting to 1) or a
/// bare non-negative integer. Unreadable text yields [`DiceExpr::FALLBACK`].
pub fn parse_dice_expression(text: &str) -> DiceExpr {
    let text = normalize(text);
    if let Some((expr, _)) = scan(&text) {
        if expr.sides > 0 {
            return expr;
        }
    }
    parse_flat(&text).unwrap_or(DiceExpr::FALLBACK)
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_flat(text: &str) -> Option<DiceExpr> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().map(DiceExpr::flat)
}

fn take_digits<'a>(text: &'a str, pos: &mut usize) -> &'a str {
    let start = *pos;
    let bytes = text.as_bytes();
    while *pos < bytes.len() && bytes[*pos].is_ascii_digit() {
        *pos += 1;
    }
    &text[start..*pos]
}

/// Reads an expression from the start of `text`, returning it with the number
/// of bytes consumed. Anything after a valid prefix is left unread.
fn scan(text: &str) -> Option<(DiceExpr, usize)> {
    let mut pos = 0;
    let count = take_digits(text, &mut pos);
    if text.as_bytes().get(pos) != Some(&b'd') {
        return None;
    }
    pos += 1;
    let sides = take_digits(text, &mut pos);
    if sides.is_empty() {
        return None;
    }

    let mut modifier = 0i32;
    if let Some(&sign) = text.as_bytes().get(pos) {
        if sign == b'+' || sign == b'-' {
            let mut after = pos + 1;
            let digits = take_digits(text, &mut after);
            if !digits.is_empty() {
                let value: i32 = digits.parse().ok()?;
                modifier = if sign == b'-' { -value } else { value };
                pos = after;
            }
        }
    }

    let count = if count.is_empty() {
        1
    } else {
        count.parse().ok()?
    };
    let sides = sides.parse().ok()?;
    Some((DiceExpr::new(count, sides, modifier), pos))
}

/// The outcome of rolling a [`DiceExpr`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub rolls: Vec<u32>,
    /// Sum of `rolls`, saturating at `u32::MAX`.
    pub dice_total: u32,
    pub modifier: i32,
    /// Sum of the dice plus `modifier`, clamped to the `u32` range.
    pub total: u32,
    pub crit: bool,
}

/// Roll `count` dice (twice as many on a critical hit) and add `modifier`
/// once. The total is floored at zero.
pub fn roll_dice(dice: &mut Dice, count: u32, sides: u32, modifier: i32, crit: bool) -> DiceRoll {
    let actual = if crit { count.saturating_mul(2) } else { count };
    let rolls: Vec<u32> = (0..actual).map(|_| dice.roll(sides)).collect();
    let sum = rolls.iter().fold(0i64, |acc, &r| acc.saturating_add(r as i64));
    let dice_total = clamp_total(sum);
    let total = clamp_total(sum.saturating_add(modifier as i64));
    DiceRoll {
        rolls,
        dice_total,
        modifier,
        total,
        crit,
    }
}

fn clamp_total(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}
