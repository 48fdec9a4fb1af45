use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeState {
    Up,
    /// At 0 HP. The participant stays in the combat.
    Downed,
}

/// Current and maximum hit points with `current` kept in `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawHitPoints")]
pub struct HitPoints {
    current: u32,
    max: u32,
}

#[derive(Deserialize)]
struct RawHitPoints {
    current: u32,
    max: u32,
}

impl From<RawHitPoints> for HitPoints {
    fn from(raw: RawHitPoints) -> Self {
        HitPoints::with_current(raw.current, raw.max)
    }
}

/// Hit points before and after one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpChange {
    pub before: u32,
    pub after: u32,
}

impl HpChange {
    /// True when this change took the creature from above 0 to exactly 0.
    pub fn dropped(&self) -> bool {
        self.before > 0 && self.after == 0
    }

    pub fn delta(&self) -> i64 {
        self.after as i64 - self.before as i64
    }
}

impl HitPoints {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Starts below maximum; `current` is clamped to `max`.
    pub fn with_current(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn state(&self) -> LifeState {
        if self.current == 0 {
            LifeState::Downed
        } else {
            LifeState::Up
        }
    }

    pub fn is_downed(&self) -> bool {
        self.state() == LifeState::Downed
    }

    pub fn apply_damage(&mut self, amount: u32) -> HpChange {
        let before = self.current;
        self.current = self.current.saturating_sub(amount);
        HpChange {
            before,
            after: self.current,
        }
    }

    pub fn heal(&mut self, amount: u32) -> HpChange {
        let before = self.current;
        self.current = self.current.saturating_add(amount).min(self.max);
        HpChange {
            before,
            after: self.current,
        }
    }
}
