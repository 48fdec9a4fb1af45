use proptest::prelude::*;
use skirmish_engine::encounter::{select_monsters, xp_budget, Difficulty};
use skirmish_engine::life::HitPoints;
use skirmish_engine::{roll_attack, roll_dice, Defenses, Dice, Monster};

proptest! {
    #[test]
    fn roll_dice_counts_bounds_and_total(
        seed in any::<u64>(),
        count in 0u32..12,
        sides in prop_oneof![1u32..30, (u32::MAX - 3)..=u32::MAX],
        modifier in -40i32..40,
        crit in any::<bool>(),
    ) {
        let mut dice = Dice::from_seed(seed);
        let roll = roll_dice(&mut dice, count, sides, modifier, crit);
        let expected = if crit { count * 2 } else { count };
        prop_assert_eq!(roll.rolls.len() as u32, expected);
        prop_assert!(roll.rolls.iter().all(|r| (1..=sides).contains(r)));
        let sum: i64 = roll.rolls.iter().map(|&r| r as i64).sum();
        prop_assert_eq!(roll.dice_total as i64, sum.min(u32::MAX as i64));
        prop_assert_eq!(roll.total as i64, (sum + modifier as i64).clamp(0, u32::MAX as i64));
    }

    #[test]
    fn natural_dice_override_arithmetic(
        bonus in -20i32..40,
        ac in 0i32..40,
        nat20 in any::<bool>(),
    ) {
        let die = if nat20 { 20 } else { 1 };
        let mut dice = Dice::from_scripted(vec![die]);
        let atk = roll_attack(&mut dice, bonus, ac, false, false);
        prop_assert_eq!(atk.hit, nat20);
        prop_assert_eq!(atk.crit, nat20);
        prop_assert_eq!(atk.crit_fail, !nat20);
    }

    #[test]
    fn defense_arithmetic(
        base in 0u32..500,
        resistance in any::<bool>(),
        immunity in any::<bool>(),
        vulnerability in any::<bool>(),
    ) {
        let (fin, _) = Defenses { resistance, immunity, vulnerability }.apply(base);
        let expected = if immunity {
            0
        } else if resistance {
            base / 2
        } else if vulnerability {
            base * 2
        } else {
            base
        };
        prop_assert_eq!(fin, expected);
    }

    #[test]
    fn damage_then_heal(max in 1u32..200, current in 0u32..200, amount in 0u32..300) {
        let mut hp = HitPoints::with_current(current, max);
        let start = hp.current();
        hp.apply_damage(amount);
        hp.heal(amount);
        if amount <= start {
            prop_assert_eq!(hp.current(), start);
        } else {
            prop_assert_eq!(hp.current(), amount.min(max));
        }
    }

    #[test]
    fn single_monster_pool_with_minimum_one(
        seed in any::<u64>(),
        xp in 1u32..5000,
        budget in 1u32..20000,
    ) {
        let pool = vec![Monster {
            id: "only".into(),
            name: "Only".into(),
            xp,
            ac: 10,
            hp: 5,
            cr: "0".into(),
            kind: None,
            resistances: Default::default(),
            immunities: Default::default(),
            vulnerabilities: Default::default(),
            attack: None,
        }];
        let mut dice = Dice::from_seed(seed);
        let picks = select_monsters(&pool, budget, 10, 1, &mut dice);
        prop_assert_eq!(picks.len(), 1);
        prop_assert!(picks[0].quantity >= 1);
    }

    #[test]
    fn budget_is_linear_in_party(levels in proptest::collection::vec(-5i32..30, 0..8)) {
        let per_member: u32 = levels.iter().map(|&l| xp_budget(&[l], Difficulty::Hard)).sum();
        prop_assert_eq!(xp_budget(&levels, Difficulty::Hard), per_member);
    }
}
