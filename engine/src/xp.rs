use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::combat::{Participant, Role};
use crate::encounter::MonsterPick;
use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpLine {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub xp_each: u32,
    pub xp_total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    pub total: u32,
    pub breakdown: Vec<XpLine>,
}

impl XpAward {
    fn push(&mut self, id: &str, name: &str, quantity: u32, xp_each: u32) {
        let xp_total = xp_each.saturating_mul(quantity);
        self.total = self.total.saturating_add(xp_total);
        self.breakdown.push(XpLine {
            id: id.to_string(),
            name: name.to_string(),
            quantity,
            xp_each,
            xp_total,
        });
    }

    /// Even share per party member, rounded down. Zero for an empty party.
    pub fn per_member(&self, party_size: usize) -> u32 {
        if party_size == 0 {
            0
        } else {
            self.total / party_size as u32
        }
    }
}

/// XP for a set of defeated monster picks.
pub fn encounter_xp(defeated: &[MonsterPick]) -> XpAward {
    let mut award = XpAward::default();
    for pick in defeated {
        award.push(&pick.id, &pick.name, pick.quantity, pick.xp);
    }
    award
}

/// XP for the monsters of a finished combat that ended at 0 HP.
pub fn defeated_monster_xp(participants: &[Participant]) -> XpAward {
    let mut award = XpAward::default();
    for p in participants {
        if p.role == Role::Monster && p.is_downed() {
            award.push(&p.id, &p.name, 1, p.xp.unwrap_or(0));
        }
    }
    award
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Milestone {
    /// Side objective.
    Minor,
    /// Main objective.
    Major,
    Story,
}

impl FromStr for Milestone {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minor" => Ok(Milestone::Minor),
            "major" => Ok(Milestone::Major),
            "story" => Ok(Milestone::Story),
            _ => Err(EngineError::UnknownMilestone(s.to_string())),
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Milestone::Minor => "minor",
            Milestone::Major => "major",
            Milestone::Story => "story",
        })
    }
}

pub fn milestone_xp(milestone: Milestone) -> u32 {
    match milestone {
        Milestone::Minor => 100,
        Milestone::Major => 500,
        Milestone::Story => 1000,
    }
}

/// Bonus for finishing an adventure: the average recommended level × 200.
pub fn quest_completion_xp(level_min: u32, level_max: u32) -> u32 {
    level_min.saturating_add(level_max).saturating_mul(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(id: &str, name: &str, xp: u32, quantity: u32) -> MonsterPick {
        MonsterPick {
            id: id.into(),
            name: name.into(),
            xp,
            quantity,
            ac: 13,
            hp: 10,
            cr: "1/4".into(),
            profile: Default::default(),
        }
    }

    #[test]
    fn encounter_award_itemizes_each_monster() {
        let award = encounter_xp(&[
            pick("goblin", "Goblin", 50, 3),
            pick("hobgoblin", "Hobgoblin", 100, 1),
        ]);
        assert_eq!(award.total, 250);
        let lines: Vec<_> = award
            .breakdown
            .iter()
            .map(|l| (l.name.as_str(), l.quantity, l.xp_each, l.xp_total))
            .collect();
        assert_eq!(lines, vec![("Goblin", 3, 50, 150), ("Hobgoblin", 1, 100, 100)]);
        assert_eq!(encounter_xp(&[]), XpAward::default());
    }

    #[test]
    fn encounter_award_saturates() {
        let award = encounter_xp(&[pick("a", "A", u32::MAX, 2), pick("b", "B", 10, 1)]);
        assert_eq!(award.total, u32::MAX);
        assert_eq!(award.breakdown[0].xp_total, u32::MAX);
    }

    #[test]
    fn milestone_values_and_names() {
        assert_eq!(milestone_xp(Milestone::Minor), 100);
        assert_eq!(milestone_xp(Milestone::Major), 500);
        assert_eq!(milestone_xp(Milestone::Story), 1000);
        assert_eq!(" Major ".parse::<Milestone>(), Ok(Milestone::Major));
        assert_eq!(Milestone::Story.to_string(), "story");
        assert_eq!("epic".parse::<Milestone>(), Err(EngineError::UnknownMilestone("epic".into())));
    }

    #[test]
    fn quest_bonus_uses_average_level() {
        assert_eq!(quest_completion_xp(1, 4), 500);
        assert_eq!(quest_completion_xp(3, 3), 600);
    }

    #[test]
    fn split_rounds_down() {
        let award = XpAward {
            total: 250,
            breakdown: Vec::new(),
        };
        assert_eq!(award.per_member(3), 83);
        assert_eq!(award.per_member(0), 0);
    }
}
