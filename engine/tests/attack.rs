use skirmish_engine::{
    roll_attack, roll_damage, AttackResult, DamageModifier, DamageType, Defenses, Dice,
};

#[test]
fn attack_flags_and_logic_are_self_consistent() {
    let mut dice = Dice::from_seed(777);
    for _ in 0..200 {
        let res: AttackResult = roll_attack(&mut dice, 5, 15, false, false);
        assert_eq!(res.crit, res.d20.result == 20);
        assert_eq!(res.crit_fail, res.d20.result == 1);
        let expected_hit = res.crit || (!res.crit_fail && res.total >= res.target_ac);
        assert_eq!(res.hit, expected_hit);
        assert_eq!(res.total, res.d20.result as i32 + 5);
    }
}

#[test]
fn natural_twenty_hits_any_armor() {
    let mut dice = Dice::from_scripted(vec![20]);
    let res = roll_attack(&mut dice, -5, 99, false, false);
    assert!(res.hit);
    assert!(res.crit);
}

#[test]
fn natural_one_misses_any_armor() {
    let mut dice = Dice::from_scripted(vec![1]);
    let res = roll_attack(&mut dice, 30, 2, false, false);
    assert!(!res.hit);
    assert!(res.crit_fail);
    assert!(!res.crit);
}

#[test]
fn meeting_armor_class_hits() {
    let mut dice = Dice::from_scripted(vec![10, 10]);
    assert!(roll_attack(&mut dice, 5, 15, false, false).hit);
    assert!(!roll_attack(&mut dice, 5, 16, false, false).hit);
}

#[test]
fn advantage_keeps_higher_die() {
    let mut dice = Dice::from_scripted(vec![3, 19]);
    let res = roll_attack(&mut dice, 0, 10, true, false);
    assert_eq!(res.d20.result, 19);
    assert_eq!(res.d20.rolls, vec![3, 19]);
    assert_eq!(res.d20.dropped, Some(3));
}

#[test]
fn damage_roll_is_within_bounds() {
    let mut dice = Dice::from_seed(42);
    let noncrit = roll_damage(&mut dice, "2d6+3", DamageType::Slashing, false, Defenses::default());
    assert!((5..=15).contains(&noncrit.final_damage));
    assert_eq!(noncrit.roll.rolls.len(), 2);

    let mut dice2 = Dice::from_seed(42);
    let crit = roll_damage(&mut dice2, "2d6+3", DamageType::Slashing, true, Defenses::default());
    assert!((7..=27).contains(&crit.final_damage));
    assert_eq!(crit.roll.rolls.len(), 4);
}

#[test]
fn defenses_change_final_damage() {
    let resist = Defenses { resistance: true, ..Defenses::default() };
    let immune = Defenses { immunity: true, ..Defenses::default() };
    let vuln = Defenses { vulnerability: true, ..Defenses::default() };

    let mut dice = Dice::from_scripted(vec![4, 4, 4, 4, 4, 4]);
    let r = roll_damage(&mut dice, "2d6+1", DamageType::Fire, false, resist);
    assert_eq!((r.base, r.final_damage, r.applied), (9, 4, Some(DamageModifier::Resistant)));

    let i = roll_damage(&mut dice, "2d6+1", DamageType::Fire, false, immune);
    assert_eq!((i.base, i.final_damage), (9, 0));

    let v = roll_damage(&mut dice, "2d6+1", DamageType::Fire, false, vuln);
    assert_eq!((v.base, v.final_damage), (9, 18));
}

#[test]
fn unreadable_damage_expression_rolls_a_d6() {
    let mut dice = Dice::from_scripted(vec![5]);
    let res = roll_damage(&mut dice, "lots", DamageType::Force, false, Defenses::default());
    assert_eq!(res.dice.to_string(), "1d6");
    assert_eq!(res.base, 5);
}

#[test]
fn flat_damage_rolls_nothing() {
    let mut dice = Dice::from_scripted(vec![]);
    let res = roll_damage(&mut dice, "7", DamageType::Bludgeoning, true, Defenses::default());
    assert!(res.roll.rolls.is_empty());
    assert_eq!(res.final_damage, 7);
}
