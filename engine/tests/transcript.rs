use chrono::Duration;
use skirmish_engine::api::{AttackRequest, DamageRequest};
use skirmish_engine::config::SessionConfig;
use skirmish_engine::{
    CombatSession, DamageProfile, DamageType, Defenses, Dice, ManualClock, Participant, Role,
};

fn attack(attacker: &str, target: &str, bonus: i32) -> AttackRequest {
    AttackRequest {
        attacker_id: attacker.into(),
        target_id: target.into(),
        bonus,
        advantage: false,
        disadvantage: false,
        target_ac: None,
    }
}

#[test]
fn short_fight_transcript() {
    let clock = ManualClock::default();
    let dice = Dice::from_scripted(vec![20, 5, 6, 1]);
    let mut s = CombatSession::with_parts(SessionConfig::default(), dice, &clock);
    s.start(
        vec![
            Participant::new("goblin", "Goblin", Role::Monster, 7, 15).with_initiative(12),
            Participant::new("fighter", "Fighter", Role::Player, 20, 16).with_initiative(15),
        ],
        None,
    )
    .unwrap();

    let atk = s.attack(&attack("fighter", "goblin", 5)).unwrap();
    s.damage(&DamageRequest {
        attacker_id: "fighter".into(),
        target_id: "goblin".into(),
        expression: "1d8+3".into(),
        damage_type: DamageType::Slashing,
        crit: atk.crit,
        defenses: Defenses::default(),
    })
    .unwrap();
    s.advance().unwrap();
    clock.advance(Duration::seconds(6));
    s.attack(&attack("goblin", "fighter", 4)).unwrap();
    s.advance().unwrap();
    clock.advance(Duration::seconds(6));
    s.toggle_condition("fighter", "Prone").unwrap();
    s.end().unwrap();

    let transcript = s
        .log()
        .iter()
        .map(|e| format!("r{} t{} {}", e.round(), e.turn(), e.message()))
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(transcript, @r"
    r1 t1 [START] Combat #1 begins with 2 participants
    r1 t1 [ATTACK][Fighter → Goblin] d20=20 (keep=20) +5 = 25 vs AC 15 → CRIT!
    r1 t1 [DMG][Fighter → Goblin] crit: rolled 2×(1d8) [5, 6] +3 = 14 slashing
    r1 t1 [DEATH][Goblin] is defeated
    r1 t2 [ATTACK][Goblin → Fighter] d20=1 (keep=1) +4 = 5 vs AC 16 → MISS (NAT1)
    r2 t1 [ROUND] Round 2
    r2 t1 [COND][Fighter] gains prone
    r2 t1 [END] Combat #1 ends after 2 rounds
    ");
}

#[test]
fn resisted_and_flat_damage_render() {
    let mut profile = DamageProfile::default();
    profile.resistances.insert(DamageType::Fire);
    let mut s = CombatSession::with_parts(
        SessionConfig::default(),
        Dice::from_scripted(vec![3, 4]),
        ManualClock::default(),
    );
    s.start(
        vec![
            Participant::new("mage", "Mage", Role::Player, 9, 12),
            Participant::new("troll", "Troll", Role::Monster, 84, 15).with_damage_profile(profile),
        ],
        None,
    )
    .unwrap();
    let fire = DamageRequest {
        attacker_id: "mage".into(),
        target_id: "troll".into(),
        expression: "2d6+1".into(),
        damage_type: DamageType::Fire,
        crit: false,
        defenses: Defenses::default(),
    };
    s.damage(&fire).unwrap();
    s.damage(&DamageRequest {
        expression: "10".into(),
        defenses: Defenses { vulnerability: true, ..Defenses::default() },
        damage_type: DamageType::Acid,
        ..fire
    })
    .unwrap();

    let lines: Vec<&str> = s.log().iter().skip(1).map(|e| e.message()).collect();
    assert_eq!(
        lines,
        vec![
            "[DMG][Mage → Troll] rolled 2d6 [3, 4] +1 = 8 fire (resistant → 4)",
            "[DMG][Mage → Troll] flat = 10 acid (vulnerable → 20)",
        ]
    );
    assert_eq!(s.participant("troll").unwrap().hp.current(), 60);
}
