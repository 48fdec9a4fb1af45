use skirmish_engine::encounter::{
    difficulty_for_xp, generate, group_multiplier, select_monsters, xp_budget, Difficulty,
    DifficultyRating,
};
use skirmish_engine::{Dice, Monster};

fn monster(id: &str, xp: u32) -> Monster {
    Monster {
        id: id.into(),
        name: id.to_uppercase(),
        xp,
        ac: 12,
        hp: 10,
        cr: "1".into(),
        kind: None,
        resistances: Default::default(),
        immunities: Default::default(),
        vulnerabilities: Default::default(),
        attack: None,
    }
}

#[test]
fn budget_for_four_level_three_medium() {
    assert_eq!(xp_budget(&[3, 3, 3, 3], Difficulty::Medium), 600);
    assert_eq!(xp_budget(&[5], Difficulty::Deadly), 1100);
}

#[test]
fn multiplier_matches_published_bands() {
    assert_eq!(group_multiplier(1), 1.0);
    assert_eq!(group_multiplier(2), 1.5);
    assert_eq!(group_multiplier(6), 2.0);
    assert_eq!(group_multiplier(10), 2.5);
    assert_eq!(group_multiplier(14), 3.0);
    assert_eq!(group_multiplier(15), 4.0);
}

#[test]
fn single_monster_pool_yields_one_entry() {
    let pool = vec![monster("rat", 25)];
    let mut dice = Dice::from_seed(1);
    let picks = select_monsters(&pool, 50, 10, 1, &mut dice);
    assert_eq!(picks.len(), 1);
    assert_eq!(picks[0].id, "rat");
    assert_eq!(picks[0].quantity, 1);
}

#[test]
fn too_expensive_pool_still_meets_minimum() {
    let pool = vec![monster("ogre", 450), monster("troll", 1800)];
    let mut dice = Dice::from_seed(1);
    let picks = select_monsters(&pool, 50, 10, 1, &mut dice);
    assert_eq!(picks.len(), 1);
    assert_eq!((picks[0].id.as_str(), picks[0].quantity), ("ogre", 1));
}

#[test]
fn minimum_count_tops_up_with_cheapest() {
    let pool = vec![monster("rat", 25)];
    let mut dice = Dice::from_seed(1);
    let picks = select_monsters(&pool, 50, 10, 3, &mut dice);
    assert_eq!(picks.len(), 1);
    assert_eq!(picks[0].quantity, 3);
}

#[test]
fn slot_limit_caps_the_search() {
    let pool = vec![monster("rat", 25)];
    let budget = xp_budget(&[20, 20, 20, 20], Difficulty::Deadly);
    let mut dice = Dice::from_seed(9);
    let picks = select_monsters(&pool, budget, 3, 1, &mut dice);
    assert_eq!(picks[0].quantity, 3);

    let picks = select_monsters(&pool, budget, 0, 2, &mut dice);
    assert_eq!(picks[0].quantity, 2);
}

#[test]
fn empty_pool_or_budget_selects_nothing() {
    let mut dice = Dice::from_seed(1);
    assert!(select_monsters(&[], 500, 10, 1, &mut dice).is_empty());
    assert!(select_monsters(&[monster("rat", 25)], 0, 10, 1, &mut dice).is_empty());
}

#[test]
fn picks_stay_in_first_picked_order() {
    let pool = vec![monster("a", 25), monster("b", 25)];
    // pick b, then a, then b again
    let mut dice = Dice::from_scripted(vec![1, 0, 1]);
    let picks = select_monsters(&pool, 400, 3, 1, &mut dice);
    let order: Vec<(&str, u32)> = picks.iter().map(|p| (p.id.as_str(), p.quantity)).collect();
    assert_eq!(order, vec![("b", 2), ("a", 1)]);
}

#[test]
fn generated_totals_are_consistent() {
    let pool = vec![monster("rat", 25), monster("wolf", 50), monster("orc", 100)];
    let levels = [2, 3, 3, 4];
    for seed in 0..50 {
        let mut dice = Dice::from_seed(seed);
        let enc = generate(&levels, Difficulty::Hard, &pool, 10, 1, &mut dice);
        let total: u32 = enc.monsters.iter().map(|m| m.xp * m.quantity).sum();
        let count: u32 = enc.monsters.iter().map(|m| m.quantity).sum();
        assert_eq!(enc.total_xp, total);
        assert_eq!(enc.monster_count, count);
        assert_eq!(enc.multiplier, group_multiplier(count));
        assert_eq!(enc.adjusted_xp, (total as f64 * enc.multiplier) as u32);
        assert!(count >= 1 && count <= 10);
        assert!(enc.adjusted_xp as f64 <= enc.xp_budget as f64 * 1.2);
    }
}

#[test]
fn rating_uses_strict_lower_bounds() {
    let party = [1, 1];
    // thresholds: easy 50, medium 100, hard 150, deadly 200
    assert_eq!(difficulty_for_xp(&party, 49), DifficultyRating::Trivial);
    assert_eq!(difficulty_for_xp(&party, 50), DifficultyRating::Easy);
    assert_eq!(difficulty_for_xp(&party, 99), DifficultyRating::Easy);
    assert_eq!(difficulty_for_xp(&party, 100), DifficultyRating::Medium);
    assert_eq!(difficulty_for_xp(&party, 150), DifficultyRating::Hard);
    assert_eq!(difficulty_for_xp(&party, 200), DifficultyRating::Deadly);
}

#[test]
fn empty_party_has_no_budget_and_rates_medium() {
    assert_eq!(xp_budget(&[], Difficulty::Hard), 0);
    assert_eq!(difficulty_for_xp(&[], 10_000), DifficultyRating::Medium);
    let mut dice = Dice::from_seed(3);
    let enc = generate(&[], Difficulty::Easy, &[monster("rat", 25)], 10, 1, &mut dice);
    assert!(enc.monsters.is_empty());
    assert_eq!(enc.adjusted_xp, 0);
}

#[test]
fn huge_minimum_saturates_xp_totals() {
    let pool = vec![monster("ogre", 450)];
    let mut dice = Dice::from_seed(4);
    let enc = generate(&[5, 5, 5, 5], Difficulty::Hard, &pool, 10, 10_000_000, &mut dice);
    assert_eq!(enc.monster_count, 10_000_000);
    assert_eq!(enc.monsters.len(), 1);
    assert_eq!(enc.monsters[0].total_xp(), u32::MAX);
    assert_eq!(enc.total_xp, u32::MAX);
    assert_eq!(enc.adjusted_xp, u32::MAX);
    assert_eq!(enc.rating(), DifficultyRating::Deadly);
}
