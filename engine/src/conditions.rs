use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The conditions currently on a participant.
///
/// Names are free-form so tables can track house conditions; they are stored
/// trimmed and lowercased so `Prone` and `prone` are the same condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet(BTreeSet<String>);

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&key(name))
    }

    /// Returns true if the condition was newly added.
    pub fn insert(&mut self, name: &str) -> bool {
        self.0.insert(key(name))
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(&key(name))
    }

    /// Flips presence and returns whether the condition is now active.
    pub fn toggle(&mut self, name: &str) -> bool {
        let k = key(name);
        if self.0.remove(&k) {
            false
        } else {
            self.0.insert(k);
            true
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| key(s.as_ref())).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub summary: &'static str,
}

pub const STANDARD_CONDITIONS: &[ConditionInfo] = &[
    ConditionInfo {
        key: "blinded",
        name: "Blinded",
        summary: "Fails checks that need sight. Attacks against it have advantage; its attacks have disadvantage.",
    },
    ConditionInfo {
        key: "charmed",
        name: "Charmed",
        summary: "Cannot attack the charmer. The charmer has advantage on social checks against it.",
    },
    ConditionInfo {
        key: "concentrating",
        name: "Concentrating",
        summary: "Maintaining a concentration spell.",
    },
    ConditionInfo {
        key: "deafened",
        name: "Deafened",
        summary: "Fails checks that need hearing.",
    },
    ConditionInfo {
        key: "exhaustion",
        name: "Exhaustion",
        summary: "Levels of exhaustion stack progressively worse penalties.",
    },
    ConditionInfo {
        key: "frightened",
        name: "Frightened",
        summary: "Disadvantage on checks and attacks while the source of fear is in sight.",
    },
    ConditionInfo {
        key: "grappled",
        name: "Grappled",
        summary: "Speed 0 and cannot benefit from speed bonuses.",
    },
    ConditionInfo {
        key: "incapacitated",
        name: "Incapacitated",
        summary: "Cannot take actions or reactions.",
    },
    ConditionInfo {
        key: "invisible",
        name: "Invisible",
        summary: "Cannot be seen without magic. Its attacks have advantage; attacks against it have disadvantage.",
    },
    ConditionInfo {
        key: "paralyzed",
        name: "Paralyzed",
        summary: "Incapacitated, cannot move or speak. Fails STR and DEX saves.",
    },
    ConditionInfo {
        key: "petrified",
        name: "Petrified",
        summary: "Turned to stone: weight x10, does not age.",
    },
    ConditionInfo {
        key: "poisoned",
        name: "Poisoned",
        summary: "Disadvantage on attack rolls and ability checks.",
    },
    ConditionInfo {
        key: "prone",
        name: "Prone",
        summary: "Can only crawl. Disadvantage on attacks; melee attacks against it within 5 ft have advantage.",
    },
    ConditionInfo {
        key: "restrained",
        name: "Restrained",
        summary: "Speed 0. Disadvantage on attacks and DEX saves.",
    },
    ConditionInfo {
        key: "stunned",
        name: "Stunned",
        summary: "Incapacitated, cannot move. Fails STR and DEX saves.",
    },
    ConditionInfo {
        key: "unconscious",
        name: "Unconscious",
        summary: "Incapacitated, cannot move or speak, drops what it holds.",
    },
];

pub fn condition_info(name: &str) -> Option<&'static ConditionInfo> {
    let k = key(name);
    STANDARD_CONDITIONS.iter().find(|c| c.key == k)
}
