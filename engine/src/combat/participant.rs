use std::fmt;

use serde::{Deserialize, Serialize};

use super::actions::{ActionEconomy, SpellSlots};
use crate::conditions::ConditionSet;
use crate::life::HitPoints;
use crate::resolve::DamageProfile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Player,
    Monster,
    Npc,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Player => "player",
            Role::Monster => "monster",
            Role::Npc => "npc",
        })
    }
}

/// One creature in the initiative order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub hp: HitPoints,
    pub ac: i32,
    #[serde(default)]
    pub initiative: i32,
    #[serde(default)]
    pub conditions: ConditionSet,
    #[serde(default)]
    pub economy: ActionEconomy,
    #[serde(default)]
    pub spell_slots: SpellSlots,
    #[serde(default, skip_serializing_if = "DamageProfile::is_empty")]
    pub damage_profile: DamageProfile,
    /// XP awarded when defeated; only meaningful for monsters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<u32>,
    /// Catalog id of the monster this participant was spawned from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monster_id: Option<String>,
}

impl Participant {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        max_hp: u32,
        ac: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            hp: HitPoints::new(max_hp),
            ac,
            initiative: 0,
            conditions: ConditionSet::new(),
            economy: ActionEconomy::default(),
            spell_slots: SpellSlots::new(),
            damage_profile: DamageProfile::default(),
            xp: None,
            monster_id: None,
        }
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = initiative;
        self
    }

    pub fn with_hp(mut self, hp: HitPoints) -> Self {
        self.hp = hp;
        self
    }

    pub fn with_spell_slots(mut self, slots: SpellSlots) -> Self {
        self.spell_slots = slots;
        self
    }

    pub fn with_damage_profile(mut self, profile: DamageProfile) -> Self {
        self.damage_profile = profile;
        self
    }

    pub fn with_xp(mut self, xp: u32) -> Self {
        self.xp = Some(xp);
        self
    }

    pub fn is_downed(&self) -> bool {
        self.hp.is_downed()
    }
}
