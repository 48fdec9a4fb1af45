use skirmish_engine::api::{
    generate_encounter, simulate_skirmish, EncounterRequest, PartyMember, SkirmishConfig,
};
use skirmish_engine::content::{builtin_catalog, builtin_catalogs};
use skirmish_engine::{DamageType, Dice, Difficulty, EngineError};

fn party() -> Vec<PartyMember> {
    ["Fighter", "Cleric", "Rogue", "Wizard"]
        .iter()
        .map(|name| PartyMember {
            name: name.to_string(),
            level: 3,
            hp: 24,
            ac: 15,
            attack_bonus: 5,
            damage: "1d8+3".into(),
            damage_type: DamageType::Slashing,
            initiative_bonus: 2,
        })
        .collect()
}

fn skirmish(seed: u64) -> SkirmishConfig {
    SkirmishConfig {
        party: party(),
        difficulty: Difficulty::Medium,
        catalog: "srd_core".into(),
        catalog_path: None,
        monsters: vec![],
        seed,
        max_monsters: 6,
        min_monsters: 1,
    }
}

#[test]
fn every_builtin_catalog_parses() {
    for name in builtin_catalogs().keys() {
        let catalog = builtin_catalog(name).unwrap();
        assert!(!catalog.is_empty(), "{name} is empty");
        assert!(catalog.iter().all(|m| m.xp > 0 && m.hp > 0));
    }
    assert!(builtin_catalog("dragons").is_err());
}

#[test]
fn crypt_monsters_carry_damage_profiles() {
    let crypt = builtin_catalog("crypt").unwrap();
    let skeleton = crypt.get("skeleton").unwrap();
    assert!(skeleton.vulnerabilities.contains(&DamageType::Bludgeoning));
    assert!(skeleton.immunities.contains(&DamageType::Poison));
}

#[test]
fn generate_from_builtin_catalog() {
    let catalog = builtin_catalog("srd_core").unwrap();
    let request = EncounterRequest {
        party_levels: vec![3, 3, 3, 3],
        difficulty: Difficulty::Medium,
        monsters: vec!["goblin".into(), "wolf".into()],
        max_monsters: 10,
        min_monsters: 2,
    };
    let mut dice = Dice::from_seed(2025);
    let enc = generate_encounter(&request, &catalog, &mut dice).unwrap();
    assert_eq!(enc.xp_budget, 600);
    assert!(enc.monster_count >= 2);
    assert!(enc.monsters.iter().all(|m| m.id == "goblin" || m.id == "wolf"));
}

#[test]
fn unknown_pool_id_is_reported() {
    let catalog = builtin_catalog("srd_core").unwrap();
    let request = EncounterRequest {
        party_levels: vec![1],
        difficulty: Difficulty::Easy,
        monsters: vec!["tarrasque".into()],
        max_monsters: 10,
        min_monsters: 1,
    };
    let mut dice = Dice::from_seed(1);
    assert_eq!(
        generate_encounter(&request, &catalog, &mut dice),
        Err(EngineError::UnknownMonster("tarrasque".into()))
    );
}

#[test]
fn skirmish_with_builtins_runs() {
    let res = simulate_skirmish(skirmish(2025)).unwrap();
    assert!(res.rounds > 0);
    assert!(["party", "monsters", "draw"].contains(&res.winner.as_str()));
    assert!(res.log.first().unwrap().starts_with("[START]"));
    assert!(res.log.last().unwrap().starts_with("[RESULT]"));
    if res.winner == "party" {
        assert_eq!(res.xp.total, res.encounter.total_xp);
    }
}

#[test]
fn skirmish_is_reproducible_per_seed() {
    let a = simulate_skirmish(skirmish(77)).unwrap();
    let b = simulate_skirmish(skirmish(77)).unwrap();
    assert_eq!(a.log, b.log);
    assert_eq!(a.winner, b.winner);
}

#[test]
fn skirmish_without_party_fails() {
    let mut cfg = skirmish(1);
    cfg.party.clear();
    assert!(simulate_skirmish(cfg).is_err());
}

#[test]
fn skirmish_config_reads_yaml_defaults() {
    let yaml = r#"
party:
  - name: Paladin
    level: 5
    hp: 44
    ac: 18
    attack_bonus: 7
    damage: 2d6+4
difficulty: hard
seed: 9
"#;
    let cfg: SkirmishConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.catalog, "srd_core");
    assert_eq!(cfg.max_monsters, 10);
    assert_eq!(cfg.party[0].damage_type, DamageType::Slashing);
    assert_eq!(cfg.difficulty, Difficulty::Hard);
}
