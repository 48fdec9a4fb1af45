//! The surface the session layer talks to: a [`CombatSession`] that ties
//! combat state, the combat log, dice and a clock together, the encounter
//! entry points, and a self-running skirmish used by the CLI.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{MonsterAttack, MonsterCatalog};
use crate::clock::{Clock, ManualClock, SystemClock};
use crate::combat::{
    ActionEconomy, ActionKind, CombatState, Participant, Role, SpellSlots, TurnAdvance,
};
use crate::config::SessionConfig;
use crate::content::builtin_catalog;
use crate::encounter::{self, Difficulty, DifficultyRating, EncounterResult};
use crate::life::HpChange;
use crate::log::{CombatId, CombatLog, EntityRef, LogEntry, LogPayload, Stamp};
use crate::resolve::{roll_attack, roll_damage, AttackResult, DamageResult, DamageType, Defenses};
use crate::xp::{defeated_monster_xp, XpAward};
use crate::{AdMode, Dice, EngineError, EngineResult};

const MAX_ROUNDS: u32 = 30;
const SECONDS_PER_TURN: i64 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRequest {
    pub attacker_id: String,
    pub target_id: String,
    pub bonus: i32,
    #[serde(default)]
    pub advantage: bool,
    #[serde(default)]
    pub disadvantage: bool,
    /// Overrides the target's own AC.
    #[serde(default)]
    pub target_ac: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRequest {
    pub attacker_id: String,
    pub target_id: String,
    pub expression: String,
    #[serde(default)]
    pub damage_type: DamageType,
    #[serde(default)]
    pub crit: bool,
    /// Added on top of the target's own damage profile.
    #[serde(default)]
    pub defenses: Defenses,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellRequest {
    pub caster_id: String,
    pub spell: String,
    /// 0 for a cantrip.
    pub level: u8,
    #[serde(default)]
    pub target_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DamageOutcome {
    pub result: DamageResult,
    pub hp: HpChange,
    pub downed: bool,
}

/// Everything needed to resume a session's combat elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    pub combat_id: Option<CombatId>,
    pub next_combat_id: CombatId,
    pub participants: Vec<Participant>,
    pub round: u32,
    pub turn: usize,
    pub active: bool,
    #[serde(default)]
    pub origin_step: Option<u32>,
}

impl CombatSnapshot {
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string(self).map_err(|e| EngineError::Snapshot(e.to_string()))
    }

    pub fn from_json(text: &str) -> EngineResult<Self> {
        serde_json::from_str(text).map_err(|e| EngineError::Snapshot(e.to_string()))
    }
}

/// One combat session: state, log, dice and clock behind a single writer.
#[derive(Debug)]
pub struct CombatSession<C: Clock = SystemClock> {
    state: CombatState,
    log: CombatLog,
    dice: Dice,
    clock: C,
    config: SessionConfig,
    combat_id: Option<CombatId>,
    next_combat_id: CombatId,
}

impl CombatSession<SystemClock> {
    pub fn new(config: SessionConfig) -> Self {
        let dice = match config.seed {
            Some(seed) => Dice::from_seed(seed),
            None => Dice::from_entropy(),
        };
        Self::with_parts(config, dice, SystemClock)
    }
}

impl<C: Clock> CombatSession<C> {
    pub fn with_parts(config: SessionConfig, dice: Dice, clock: C) -> Self {
        Self {
            state: CombatState::new(),
            log: CombatLog::new(),
            dice,
            clock,
            config,
            combat_id: None,
            next_combat_id: 1,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn dice(&mut self) -> &mut Dice {
        &mut self.dice
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn combat_id(&self) -> Option<CombatId> {
        self.combat_id
    }

    fn ensure_active(&self) -> EngineResult<()> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(EngineError::CombatInactive)
        }
    }

    fn stamp(&self) -> Stamp {
        Stamp {
            round: self.state.round(),
            turn: self.state.turn() as u32 + 1,
            at: self.clock.now(),
        }
    }

    fn entity(&self, id: &str) -> EngineResult<EntityRef> {
        let p = self.state.participant(id)?;
        Ok(EntityRef::new(&p.id, &p.name))
    }

    fn record(
        &mut self,
        actor: EntityRef,
        target: Option<EntityRef>,
        payload: LogPayload,
    ) -> LogEntry {
        let stamp = self.stamp();
        self.log
            .record(self.combat_id, actor, target, payload, stamp)
            .clone()
    }

    fn narrate(&mut self, message: String) {
        self.record(EntityRef::new("system", "System"), None, LogPayload::other(message));
    }

    /// Begins a new combat with the given roster, sorted by initiative.
    pub fn start(
        &mut self,
        participants: Vec<Participant>,
        origin_step: Option<u32>,
    ) -> EngineResult<CombatId> {
        self.state.start(participants, origin_step)?;
        self.state.sort_by_initiative();
        let id = self.next_combat_id;
        self.next_combat_id += 1;
        self.combat_id = Some(id);

        if let Some(first) = self.state.current().map(|p| p.id.clone()) {
            self.state.reset_action_economy(&first)?;
        }
        let count = self.state.participants().len();
        self.narrate(format!("[START] Combat #{id} begins with {count} participants"));
        Ok(id)
    }

    /// Moves to the next turn and refreshes the new actor's action economy.
    pub fn advance(&mut self) -> EngineResult<TurnAdvance> {
        let adv = self.state.advance_turn()?;
        if let Some(id) = &adv.actor_id {
            self.state.reset_action_economy(id)?;
        }
        if adv.new_round {
            self.narrate(format!("[ROUND] Round {}", adv.round));
        }
        Ok(adv)
    }

    pub fn attack(&mut self, req: &AttackRequest) -> EngineResult<AttackResult> {
        self.ensure_active()?;
        let attacker = self.entity(&req.attacker_id)?;
        let target = self.entity(&req.target_id)?;
        let ac = match req.target_ac {
            Some(ac) => ac,
            None => self.state.participant(&req.target_id)?.ac,
        };
        let result = roll_attack(&mut self.dice, req.bonus, ac, req.advantage, req.disadvantage);
        self.record(attacker, Some(target), LogPayload::Attack(result.clone()));
        Ok(result)
    }

    /// Rolls damage against the target's defenses, applies it, and logs the
    /// damage and a death if this hit dropped the target.
    pub fn damage(&mut self, req: &DamageRequest) -> EngineResult<DamageOutcome> {
        self.ensure_active()?;
        let attacker = self.entity(&req.attacker_id)?;
        let target = self.entity(&req.target_id)?;
        let defenses = self
            .state
            .participant(&req.target_id)?
            .damage_profile
            .defenses_against(req.damage_type)
            .merge(req.defenses);

        let result = roll_damage(
            &mut self.dice,
            &req.expression,
            req.damage_type,
            req.crit,
            defenses,
        );
        let hp = self.state.apply_damage(&req.target_id, result.final_damage)?;
        self.record(attacker.clone(), Some(target.clone()), LogPayload::Damage(result.clone()));
        if hp.dropped() {
            self.record(attacker, Some(target), LogPayload::Death);
        }
        Ok(DamageOutcome {
            result,
            downed: hp.after == 0,
            hp,
        })
    }

    /// Applies a fixed amount of damage with no roll (falls, hazards).
    pub fn apply_damage(&mut self, target_id: &str, amount: u32) -> EngineResult<HpChange> {
        self.ensure_active()?;
        let target = self.entity(target_id)?;
        let hp = self.state.apply_damage(target_id, amount)?;
        self.narrate(format!(
            "[HP][{}] takes {amount} damage ({} → {})",
            target.name, hp.before, hp.after
        ));
        if hp.dropped() {
            self.record(target, None, LogPayload::Death);
        }
        Ok(hp)
    }

    pub fn heal(
        &mut self,
        healer_id: &str,
        target_id: &str,
        amount: u32,
    ) -> EngineResult<HpChange> {
        self.ensure_active()?;
        let healer = self.entity(healer_id)?;
        let target = self.entity(target_id)?;
        let hp = self.state.apply_heal(target_id, amount)?;
        self.record(
            healer,
            Some(target),
            LogPayload::Heal {
                amount,
                before: hp.before,
                after: hp.after,
            },
        );
        Ok(hp)
    }

    /// Casts a spell, spending a slot of its level. Cantrips are free.
    /// Returns false, and logs nothing, when no slot is left.
    pub fn cast_spell(&mut self, req: &SpellRequest) -> EngineResult<bool> {
        self.ensure_active()?;
        let caster = self.entity(&req.caster_id)?;
        let target = req.target_id.as_deref().map(|id| self.entity(id)).transpose()?;
        if req.level > 0 && !self.state.use_spell_slot(&req.caster_id, req.level)? {
            debug!(caster = %req.caster_id, level = req.level, "no spell slot left");
            return Ok(false);
        }
        self.record(
            caster,
            target,
            LogPayload::Spell {
                spell: req.spell.clone(),
                level: req.level,
            },
        );
        Ok(true)
    }

    pub fn use_action(&mut self, id: &str, kind: ActionKind) -> EngineResult<bool> {
        self.ensure_active()?;
        self.state.use_action(id, kind)
    }

    pub fn reset_action_economy(&mut self, id: &str) -> EngineResult<()> {
        self.state.reset_action_economy(id)
    }

    pub fn toggle_condition(&mut self, id: &str, condition: &str) -> EngineResult<bool> {
        self.ensure_active()?;
        let who = self.entity(id)?;
        let added = self.state.toggle_condition(id, condition)?;
        self.record(
            who,
            None,
            LogPayload::Condition {
                condition: condition.trim().to_lowercase(),
                added,
            },
        );
        Ok(added)
    }

    pub fn add_participant(&mut self, participant: Participant) -> EngineResult<()> {
        self.state.add_participant(participant)
    }

    /// Removes a participant. When that hands the turn to someone else, their
    /// turn starts here: their economy resets and a rollover logs the round.
    pub fn remove_participant(&mut self, id: &str) -> EngineResult<Participant> {
        let actor_before = self.current().map(|p| p.id.clone());
        let round_before = self.state.round();
        let removed = self.state.remove_participant(id)?;
        if !self.state.is_active() {
            return Ok(removed);
        }
        let actor_after = self.current().map(|p| p.id.clone());
        if let Some(actor) = actor_after.filter(|a| actor_before.as_ref() != Some(a)) {
            self.state.reset_action_economy(&actor)?;
        }
        if self.state.round() > round_before {
            self.narrate(format!("[ROUND] Round {}", self.state.round()));
        }
        Ok(removed)
    }

    pub fn sort_by_initiative(&mut self) {
        self.state.sort_by_initiative();
    }

    /// Ends the combat and returns the participants for copy-back.
    pub fn end(&mut self) -> EngineResult<Vec<Participant>> {
        self.ensure_active()?;
        let id = self.combat_id.unwrap_or_default();
        let rounds = self.state.round();
        self.narrate(format!("[END] Combat #{id} ends after {rounds} rounds"));
        Ok(self.state.end_combat())
    }

    pub fn participants(&self) -> &[Participant] {
        self.state.participants()
    }

    pub fn participant(&self, id: &str) -> EngineResult<&Participant> {
        self.state.participant(id)
    }

    pub fn current(&self) -> Option<&Participant> {
        self.state.current()
    }

    pub fn economy(&self, id: &str) -> EngineResult<ActionEconomy> {
        self.state.economy(id)
    }

    pub fn spell_slots(&self, id: &str) -> EngineResult<SpellSlots> {
        self.state.spell_slots(id)
    }

    /// Newest first. `limit` defaults to the configured log limit.
    pub fn log_entries(&self, combat_id: Option<CombatId>, limit: Option<usize>) -> Vec<&LogEntry> {
        self.log.query(combat_id, limit.unwrap_or(self.config.log_limit))
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn clear_log(&mut self, combat_id: Option<CombatId>) -> usize {
        self.log.clear(combat_id)
    }

    /// Builds one participant per monster unit. Ids are `{monster}_{n}` with
    /// `n` one past the current roster size; names are numbered when a pick
    /// has more than one unit. Initiative is a d20 plus the configured bonus.
    pub fn spawn_encounter(&mut self, encounter: &EncounterResult) -> Vec<Participant> {
        let mut taken: Vec<String> =
            self.state.participants().iter().map(|p| p.id.clone()).collect();
        let mut spawned = Vec::new();
        for pick in &encounter.monsters {
            for n in 1..=pick.quantity {
                let mut seq = taken.len() + 1;
                let mut id = format!("{}_{seq}", pick.id);
                while taken.contains(&id) {
                    seq += 1;
                    id = format!("{}_{seq}", pick.id);
                }
                let name = if pick.quantity > 1 {
                    format!("{} {n}", pick.name)
                } else {
                    pick.name.clone()
                };
                let initiative =
                    self.dice.d20(AdMode::Normal) as i32 + self.config.monster_initiative_bonus;
                let mut p = Participant::new(id.clone(), name, Role::Monster, pick.hp, pick.ac)
                    .with_initiative(initiative)
                    .with_damage_profile(pick.profile.clone())
                    .with_xp(pick.xp);
                p.monster_id = Some(pick.id.clone());
                taken.push(id);
                spawned.push(p);
            }
        }
        spawned
    }

    /// Adds a generated encounter to the roster and returns the new ids.
    /// Initiative order is left alone; sort explicitly afterwards.
    pub fn add_encounter(&mut self, encounter: &EncounterResult) -> EngineResult<Vec<String>> {
        let spawned = self.spawn_encounter(encounter);
        let ids = spawned.iter().map(|p| p.id.clone()).collect();
        for p in spawned {
            self.state.add_participant(p)?;
        }
        Ok(ids)
    }

    pub fn snapshot(&self) -> CombatSnapshot {
        CombatSnapshot {
            combat_id: self.combat_id,
            next_combat_id: self.next_combat_id,
            participants: self.state.participants().to_vec(),
            round: self.state.round(),
            turn: self.state.turn(),
            active: self.state.is_active(),
            origin_step: self.state.origin_step(),
        }
    }

    /// Replaces the session's combat with a snapshot. The log is untouched.
    pub fn restore(&mut self, snapshot: CombatSnapshot) -> EngineResult<()> {
        self.state = CombatState::from_parts(
            snapshot.participants,
            snapshot.round,
            snapshot.turn,
            snapshot.active,
            snapshot.origin_step,
        )?;
        self.combat_id = snapshot.combat_id;
        self.next_combat_id = snapshot
            .next_combat_id
            .max(snapshot.combat_id.map_or(1, |id| id + 1));
        Ok(())
    }
}

pub fn compute_budget(party_levels: &[i32], difficulty: Difficulty) -> u32 {
    encounter::xp_budget(party_levels, difficulty)
}

pub fn classify_difficulty(party_levels: &[i32], adjusted_xp: u32) -> DifficultyRating {
    encounter::difficulty_for_xp(party_levels, adjusted_xp)
}

fn default_max_monsters() -> u32 {
    10
}

fn default_min_monsters() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRequest {
    pub party_levels: Vec<i32>,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Restricts the pool to these catalog ids; empty means the whole catalog.
    #[serde(default)]
    pub monsters: Vec<String>,
    #[serde(default = "default_max_monsters")]
    pub max_monsters: u32,
    #[serde(default = "default_min_monsters")]
    pub min_monsters: u32,
}

pub fn generate_encounter(
    request: &EncounterRequest,
    catalog: &MonsterCatalog,
    dice: &mut Dice,
) -> EngineResult<EncounterResult> {
    let pool = if request.monsters.is_empty() {
        catalog.monsters().to_vec()
    } else {
        catalog.select(&request.monsters)?
    };
    Ok(encounter::generate(
        &request.party_levels,
        request.difficulty,
        &pool,
        request.max_monsters,
        request.min_monsters,
        dice,
    ))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PartyMember {
    pub name: String,
    #[serde(default = "default_level")]
    pub level: i32,
    pub hp: u32,
    pub ac: i32,
    pub attack_bonus: i32,
    pub damage: String,
    #[serde(default)]
    pub damage_type: DamageType,
    #[serde(default)]
    pub initiative_bonus: i32,
}

fn default_level() -> i32 {
    1
}

fn default_catalog() -> String {
    "srd_core".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SkirmishConfig {
    pub party: Vec<PartyMember>,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Built-in catalog name, used unless `catalog_path` is set.
    #[serde(default = "default_catalog")]
    pub catalog: String,
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub monsters: Vec<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_max_monsters")]
    pub max_monsters: u32,
    #[serde(default = "default_min_monsters")]
    pub min_monsters: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Survivor {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SkirmishResult {
    pub winner: String,
    pub rounds: u32,
    pub encounter: EncounterResult,
    pub survivors: Vec<Survivor>,
    pub xp: XpAward,
    pub log: Vec<String>,
}

fn fallback_attack() -> MonsterAttack {
    MonsterAttack {
        name: "Strike".to_string(),
        bonus: 2,
        damage: "1d6".to_string(),
        damage_type: DamageType::Bludgeoning,
    }
}

fn side_of(p: &Participant) -> bool {
    p.role == Role::Player
}

fn side_standing(participants: &[Participant], players: bool) -> bool {
    participants
        .iter()
        .any(|p| side_of(p) == players && !p.is_downed())
}

/// Generates an encounter for the party and fights it out: everyone attacks
/// the weakest standing enemy until one side is down or the round cap hits.
pub fn simulate_skirmish(cfg: SkirmishConfig) -> Result<SkirmishResult> {
    if cfg.party.is_empty() {
        bail!("skirmish needs at least one party member");
    }
    let catalog = match &cfg.catalog_path {
        Some(path) => MonsterCatalog::load(path)?,
        None => builtin_catalog(&cfg.catalog)?,
    };

    let mut dice = Dice::from_seed(cfg.seed);
    let levels: Vec<i32> = cfg.party.iter().map(|m| m.level).collect();
    let request = EncounterRequest {
        party_levels: levels,
        difficulty: cfg.difficulty,
        monsters: cfg.monsters.clone(),
        max_monsters: cfg.max_monsters,
        min_monsters: cfg.min_monsters,
    };
    let encounter =
        generate_encounter(&request, &catalog, &mut dice).context("generating encounter")?;
    if encounter.monsters.is_empty() {
        bail!("no monsters fit a {} encounter for this party", cfg.difficulty);
    }

    let mut attacks: HashMap<String, MonsterAttack> = HashMap::new();
    let mut roster = Vec::new();
    for (i, member) in cfg.party.iter().enumerate() {
        let id = format!("pc_{}", i + 1);
        let initiative = dice.d20(AdMode::Normal) as i32 + member.initiative_bonus;
        roster.push(
            Participant::new(&id, &member.name, Role::Player, member.hp, member.ac)
                .with_initiative(initiative),
        );
        attacks.insert(
            id,
            MonsterAttack {
                name: "Attack".to_string(),
                bonus: member.attack_bonus,
                damage: member.damage.clone(),
                damage_type: member.damage_type,
            },
        );
    }

    let clock = ManualClock::default();
    let session_cfg = SessionConfig {
        seed: Some(cfg.seed),
        ..SessionConfig::default()
    };
    let mut session = CombatSession::with_parts(session_cfg, dice, &clock);
    for p in session.spawn_encounter(&encounter) {
        let attack = p
            .monster_id
            .as_deref()
            .and_then(|id| catalog.get(id).ok())
            .and_then(|m| m.attack.clone())
            .unwrap_or_else(fallback_attack);
        attacks.insert(p.id.clone(), attack);
        roster.push(p);
    }
    session.start(roster, None)?;

    loop {
        let Some(actor) = session.current().cloned() else {
            break;
        };
        if !actor.is_downed() {
            let target = session
                .participants()
                .iter()
                .filter(|p| side_of(p) != side_of(&actor) && !p.is_downed())
                .min_by_key(|p| p.hp.current())
                .map(|p| p.id.clone());
            if let (Some(target_id), Some(attack)) = (target, attacks.get(&actor.id)) {
                session.use_action(&actor.id, ActionKind::Action)?;
                let atk = session.attack(&AttackRequest {
                    attacker_id: actor.id.clone(),
                    target_id: target_id.clone(),
                    bonus: attack.bonus,
                    advantage: false,
                    disadvantage: false,
                    target_ac: None,
                })?;
                if atk.hit {
                    session.damage(&DamageRequest {
                        attacker_id: actor.id.clone(),
                        target_id,
                        expression: attack.damage.clone(),
                        damage_type: attack.damage_type,
                        crit: atk.crit,
                        defenses: Defenses::default(),
                    })?;
                }
            }
        }

        let players_up = side_standing(session.participants(), true);
        let monsters_up = side_standing(session.participants(), false);
        if !players_up || !monsters_up {
            break;
        }
        let adv = session.advance()?;
        clock.advance(Duration::seconds(SECONDS_PER_TURN));
        if adv.round > MAX_ROUNDS {
            break;
        }
    }

    let players_up = side_standing(session.participants(), true);
    let monsters_up = side_standing(session.participants(), false);
    let winner = match (players_up, monsters_up) {
        (true, false) => "party",
        (false, true) => "monsters",
        _ => "draw",
    };
    let rounds = session.state().round().min(MAX_ROUNDS);
    let finals = session.end()?;
    info!(winner, rounds, "skirmish finished");

    let survivors = finals
        .iter()
        .filter(|p| !p.is_downed())
        .map(|p| Survivor {
            name: p.name.clone(),
            hp: p.hp.current(),
            max_hp: p.hp.max(),
        })
        .collect();
    let mut log: Vec<String> = session
        .log()
        .iter()
        .map(|e| e.message().to_string())
        .collect();
    log.push(format!("[RESULT] winner={winner} rounds={rounds}"));

    Ok(SkirmishResult {
        winner: winner.to_string(),
        rounds,
        encounter,
        survivors,
        xp: defeated_monster_xp(&finals),
        log,
    })
}
