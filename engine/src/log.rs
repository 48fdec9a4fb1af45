//! Append-only combat log.
//!
//! Entries are created through [`CombatLog::record`] and never change after
//! that. Each entry keeps its structured payload and the message rendered
//! from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resolve::{AttackResult, DamageModifier, DamageResult};

pub type CombatId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Attack,
    Damage,
    Heal,
    Condition,
    Spell,
    Death,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "details", rename_all = "snake_case")]
pub enum LogPayload {
    Attack(AttackResult),
    Damage(DamageResult),
    Heal { amount: u32, before: u32, after: u32 },
    Condition { condition: String, added: bool },
    Spell { spell: String, level: u8 },
    Death,
    Other {
        message: String,
        #[serde(default)]
        details: serde_json::Value,
    },
}

impl LogPayload {
    pub fn kind(&self) -> LogKind {
        match self {
            LogPayload::Attack(_) => LogKind::Attack,
            LogPayload::Damage(_) => LogKind::Damage,
            LogPayload::Heal { .. } => LogKind::Heal,
            LogPayload::Condition { .. } => LogKind::Condition,
            LogPayload::Spell { .. } => LogKind::Spell,
            LogPayload::Death => LogKind::Death,
            LogPayload::Other { .. } => LogKind::Other,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        LogPayload::Other {
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Round, turn and wall-clock time supplied by the caller for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub round: u32,
    /// 1-based position in the initiative order.
    pub turn: u32,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    seq: u64,
    combat_id: Option<CombatId>,
    round: u32,
    turn: u32,
    at: DateTime<Utc>,
    actor: EntityRef,
    target: Option<EntityRef>,
    #[serde(flatten)]
    payload: LogPayload,
    message: String,
}

impl LogEntry {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn combat_id(&self) -> Option<CombatId> {
        self.combat_id
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    pub fn actor(&self) -> &EntityRef {
        &self.actor
    }

    pub fn target(&self) -> Option<&EntityRef> {
        self.target.as_ref()
    }

    pub fn kind(&self) -> LogKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &LogPayload {
        &self.payload
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The payload as JSON, for consumers that want raw fields.
    pub fn details(&self) -> serde_json::Value {
        serde_json::to_value(&self.payload)
            .ok()
            .and_then(|v| v.get("details").cloned())
            .unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CombatLog {
    entries: Vec<LogEntry>,
    next_seq: u64,
}

impl CombatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, rendering its message from the payload.
    pub fn record(
        &mut self,
        combat_id: Option<CombatId>,
        actor: EntityRef,
        target: Option<EntityRef>,
        payload: LogPayload,
        stamp: Stamp,
    ) -> &LogEntry {
        let message = render(&actor, target.as_ref(), &payload);
        let entry = LogEntry {
            seq: self.next_seq,
            combat_id,
            round: stamp.round,
            turn: stamp.turn,
            at: stamp.at,
            actor,
            target,
            payload,
            message,
        };
        self.next_seq += 1;

        // A clock that steps backwards must not reorder existing entries, so
        // the entry goes after everything at or before its timestamp.
        let at = entry.at;
        let index = self.entries.partition_point(|e| e.at <= at);
        self.entries.insert(index, entry);
        &self.entries[index]
    }

    /// Newest first, optionally restricted to one combat, at most `limit`.
    pub fn query(&self, combat_id: Option<CombatId>, limit: usize) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| combat_id.is_none() || e.combat_id == combat_id)
            .take(limit)
            .collect()
    }

    /// Deletes every entry (or every entry of one combat); returns how many.
    pub fn clear(&mut self, combat_id: Option<CombatId>) -> usize {
        let before = self.entries.len();
        match combat_id {
            None => self.entries.clear(),
            Some(id) => self.entries.retain(|e| e.combat_id != Some(id)),
        }
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

fn who(actor: &EntityRef, target: Option<&EntityRef>) -> String {
    match target {
        Some(t) => format!("{} → {}", actor.name, t.name),
        None => actor.name.clone(),
    }
}

pub(crate) fn format_d20_sequence(raw: &[u8], kept: u8) -> String {
    match raw {
        [] => format!("d20=? (keep={kept})"),
        [only] => format!("d20={only} (keep={kept})"),
        [first, second] => format!("d20={first} vs d20={second} (keep={kept})"),
        _ => {
            let joined = raw.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ");
            format!("d20s=[{joined}] (keep={kept})")
        }
    }
}

pub(crate) fn format_modifier(modifier: i32) -> String {
    if modifier >= 0 {
        format!("+{modifier}")
    } else {
        format!("-{}", modifier.abs())
    }
}

fn render_attack(atk: &AttackResult) -> String {
    let outcome = if atk.crit {
        "CRIT!"
    } else if atk.crit_fail {
        "MISS (NAT1)"
    } else if atk.hit {
        "HIT"
    } else {
        "MISS"
    };
    format!(
        "{} {} = {} vs AC {} → {}",
        format_d20_sequence(&atk.d20.rolls, atk.d20.result),
        format_modifier(atk.bonus),
        atk.total,
        atk.target_ac,
        outcome
    )
}

fn render_damage(dmg: &DamageResult) -> String {
    let rolled = if dmg.dice.is_flat() {
        "flat".to_string()
    } else if dmg.crit {
        format!("crit: rolled 2×({}d{})", dmg.dice.count, dmg.dice.sides)
    } else {
        format!("rolled {}d{}", dmg.dice.count, dmg.dice.sides)
    };
    let mut line = if dmg.dice.is_flat() {
        format!("{} = {} {}", rolled, dmg.base, dmg.damage_type)
    } else {
        format!(
            "{} {:?} {} = {} {}",
            rolled,
            dmg.roll.rolls,
            format_modifier(dmg.roll.modifier),
            dmg.base,
            dmg.damage_type
        )
    };
    match dmg.applied {
        Some(DamageModifier::Immune) => line.push_str(" (immune → 0)"),
        Some(DamageModifier::Resistant) => {
            line.push_str(&format!(" (resistant → {})", dmg.final_damage))
        }
        Some(DamageModifier::Vulnerable) => {
            line.push_str(&format!(" (vulnerable → {})", dmg.final_damage))
        }
        None => {}
    }
    line
}

pub(crate) fn render(
    actor: &EntityRef,
    target: Option<&EntityRef>,
    payload: &LogPayload,
) -> String {
    let names = who(actor, target);
    match payload {
        LogPayload::Attack(atk) => format!("[ATTACK][{names}] {}", render_attack(atk)),
        LogPayload::Damage(dmg) => format!("[DMG][{names}] {}", render_damage(dmg)),
        LogPayload::Heal { amount, before, after } => {
            format!("[HEAL][{names}] +{amount} HP ({before} → {after})")
        }
        LogPayload::Condition { condition, added } => {
            let subject = target.unwrap_or(actor);
            if *added {
                format!("[COND][{}] gains {condition}", subject.name)
            } else {
                format!("[COND][{}] is no longer {condition}", subject.name)
            }
        }
        LogPayload::Spell { spell, level } => {
            let level = if *level == 0 {
                "cantrip".to_string()
            } else {
                format!("level {level}")
            };
            format!("[SPELL][{names}] casts {spell} ({level})")
        }
        LogPayload::Death => {
            let subject = target.unwrap_or(actor);
            format!("[DEATH][{}] is defeated", subject.name)
        }
        LogPayload::Other { message, .. } => message.clone(),
    }
}
