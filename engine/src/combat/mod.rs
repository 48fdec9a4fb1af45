//! Turn order and per-participant combat state.
//!
//! `CombatState` is plain data plus the operations that keep its invariants:
//! unique ids, a turn pointer that stays meaningful across roster changes, and
//! hit points clamped to `0..=max`. It does not log; the session layer turns
//! the values returned here into log entries.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::life::HpChange;
use crate::{EngineError, EngineResult};

pub mod actions;
pub mod participant;

pub use actions::{ActionEconomy, ActionKind, SpellSlots};
pub use participant::{Participant, Role};

/// Where the turn pointer landed after [`CombatState::advance_turn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnAdvance {
    pub round: u32,
    /// 0-based index into the initiative order.
    pub turn: usize,
    pub actor_id: Option<String>,
    pub new_round: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    participants: Vec<Participant>,
    round: u32,
    turn: usize,
    active: bool,
    origin_step: Option<u32>,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roster and begins at round 1, turn 0.
    ///
    /// The roster is kept in the given order; sorting by initiative is a
    /// separate, explicit step.
    pub fn start(
        &mut self,
        participants: Vec<Participant>,
        origin_step: Option<u32>,
    ) -> EngineResult<()> {
        check_unique(&participants)?;
        self.participants = participants;
        self.round = 1;
        self.turn = 0;
        self.active = true;
        self.origin_step = origin_step;
        info!(
            participants = self.participants.len(),
            origin_step = ?origin_step,
            "combat started"
        );
        Ok(())
    }

    /// Deactivates the combat and hands back the final participant states.
    pub fn end_combat(&mut self) -> Vec<Participant> {
        info!(round = self.round, "combat ended");
        self.active = false;
        self.participants.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn origin_step(&self) -> Option<u32> {
        self.origin_step
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &str) -> EngineResult<&Participant> {
        self.participants
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| EngineError::ParticipantNotFound(id.to_string()))
    }

    fn participant_mut(&mut self, id: &str) -> EngineResult<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| EngineError::ParticipantNotFound(id.to_string()))
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.participants.iter().position(|p| p.id == id)
    }

    /// The participant whose turn it is.
    pub fn current(&self) -> Option<&Participant> {
        if !self.active {
            return None;
        }
        self.participants.get(self.turn)
    }

    pub fn economy(&self, id: &str) -> EngineResult<ActionEconomy> {
        Ok(self.participant(id)?.economy)
    }

    pub fn spell_slots(&self, id: &str) -> EngineResult<SpellSlots> {
        Ok(self.participant(id)?.spell_slots.clone())
    }

    pub fn add_participant(&mut self, participant: Participant) -> EngineResult<()> {
        if self.index_of(&participant.id).is_some() {
            return Err(EngineError::DuplicateParticipant(participant.id));
        }
        debug!(id = %participant.id, "participant added");
        self.participants.push(participant);
        Ok(())
    }

    /// Removes a participant and reconciles the turn pointer.
    ///
    /// Removing someone before the pointer shifts it back by one. Removing the
    /// current actor passes the turn to whoever now holds that index, wrapping
    /// to the top of the order (and the next round) if it ran off the end.
    pub fn remove_participant(&mut self, id: &str) -> EngineResult<Participant> {
        let index = self
            .index_of(id)
            .ok_or_else(|| EngineError::ParticipantNotFound(id.to_string()))?;
        let removed = self.participants.remove(index);

        if index < self.turn {
            self.turn -= 1;
        } else if index == self.turn && self.turn >= self.participants.len() {
            self.turn = 0;
            if self.active && !self.participants.is_empty() {
                self.round += 1;
            }
        }
        debug!(id, turn = self.turn, round = self.round, "participant removed");
        Ok(removed)
    }

    /// Stable sort by initiative, highest first. The pointer keeps following
    /// the participant whose turn it was.
    pub fn sort_by_initiative(&mut self) {
        let current_id = self.participants.get(self.turn).map(|p| p.id.clone());
        self.participants.sort_by(|a, b| b.initiative.cmp(&a.initiative));
        if let Some(id) = current_id {
            self.turn = self.index_of(&id).unwrap_or(0);
        }
    }

    pub fn advance_turn(&mut self) -> EngineResult<TurnAdvance> {
        if !self.active {
            return Err(EngineError::CombatInactive);
        }
        let mut new_round = false;
        if !self.participants.is_empty() {
            self.turn += 1;
            if self.turn >= self.participants.len() {
                self.turn = 0;
                self.round += 1;
                new_round = true;
                debug!(round = self.round, "new round");
            }
        }
        Ok(TurnAdvance {
            round: self.round,
            turn: self.turn,
            actor_id: self.participants.get(self.turn).map(|p| p.id.clone()),
            new_round,
        })
    }

    pub fn apply_damage(&mut self, id: &str, amount: u32) -> EngineResult<HpChange> {
        let p = self.participant_mut(id)?;
        let change = p.hp.apply_damage(amount);
        if change.dropped() {
            info!(id, "participant dropped to 0 HP");
        }
        Ok(change)
    }

    pub fn apply_heal(&mut self, id: &str, amount: u32) -> EngineResult<HpChange> {
        Ok(self.participant_mut(id)?.hp.heal(amount))
    }

    /// Returns whether the condition is present afterwards.
    pub fn toggle_condition(&mut self, id: &str, condition: &str) -> EngineResult<bool> {
        Ok(self.participant_mut(id)?.conditions.toggle(condition))
    }

    /// Returns false when the resource was already spent this turn.
    pub fn use_action(&mut self, id: &str, kind: ActionKind) -> EngineResult<bool> {
        Ok(self.participant_mut(id)?.economy.consume(kind))
    }

    pub fn reset_action_economy(&mut self, id: &str) -> EngineResult<()> {
        self.participant_mut(id)?.economy.reset();
        Ok(())
    }

    pub fn use_spell_slot(&mut self, id: &str, level: u8) -> EngineResult<bool> {
        Ok(self.participant_mut(id)?.spell_slots.spend(level))
    }

    /// Rebuilds a state from persisted parts, re-checking its invariants.
    pub fn from_parts(
        participants: Vec<Participant>,
        round: u32,
        turn: usize,
        active: bool,
        origin_step: Option<u32>,
    ) -> EngineResult<Self> {
        check_unique(&participants)?;
        if active && round == 0 {
            return Err(EngineError::Snapshot("active combat with round 0".into()));
        }
        if !participants.is_empty() && turn >= participants.len() {
            return Err(EngineError::Snapshot(format!(
                "turn {turn} out of range for {} participants",
                participants.len()
            )));
        }
        Ok(Self {
            participants,
            round,
            turn,
            active,
            origin_step,
        })
    }
}

fn check_unique(participants: &[Participant]) -> EngineResult<()> {
    let mut seen = std::collections::HashSet::new();
    for p in participants {
        if !seen.insert(p.id.as_str()) {
            return Err(EngineError::DuplicateParticipant(p.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(ids: &[&str]) -> Vec<Participant> {
        ids.iter()
            .map(|id| Participant::new(*id, id.to_uppercase(), Role::Player, 10, 12))
            .collect()
    }

    #[test]
    fn inactive_combat_cannot_advance() {
        let mut state = CombatState::new();
        assert_eq!(state.advance_turn(), Err(EngineError::CombatInactive));
    }

    #[test]
    fn empty_roster_advance_is_noop() {
        let mut state = CombatState::new();
        state.start(Vec::new(), None).unwrap();
        let adv = state.advance_turn().unwrap();
        assert_eq!((adv.round, adv.turn, adv.actor_id), (1, 0, None));
    }

    #[test]
    fn removing_last_current_wraps_round() {
        let mut state = CombatState::new();
        state.start(roster(&["a", "b", "c"]), None).unwrap();
        state.advance_turn().unwrap();
        state.advance_turn().unwrap();
        state.remove_participant("c").unwrap();
        assert_eq!((state.round(), state.turn()), (2, 0));
        assert_eq!(state.current().map(|p| p.id.as_str()), Some("a"));
    }
}
