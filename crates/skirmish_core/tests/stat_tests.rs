//! Stat scaling tests.
//!
//! Upgrade formulas are exact integer percentages, so these compare
//! against the closed forms directly.

use proptest::prelude::*;
use skirmish_core::archetypes::Archetype::Archer;
use skirmish_core::combat::{calculate_stats, max_base_hp, ARCHER_COOLDOWN_FLOOR_PERCENT};
use skirmish_test_utils::determinism::strategies::arb_archetype;

#[test]
fn archer_cooldown_never_below_floor() {
    let base = calculate_stats(Archer, 0).attack_cooldown;
    let floor = base * ARCHER_COOLDOWN_FLOOR_PERCENT / 100;

    for level in [0, 50, 1000] {
        let cooldown = calculate_stats(Archer, level).attack_cooldown;
        assert!(cooldown >= floor, "level {level}: {cooldown} < {floor}");
    }
    assert_eq!(calculate_stats(Archer, 0).attack_cooldown, Archer.profile().attack_cooldown);
    assert_eq!(calculate_stats(Archer, 50).attack_cooldown, floor);
    assert_eq!(calculate_stats(Archer, 1000).attack_cooldown, floor);
}

#[test]
fn archer_cooldown_shrinks_with_level() {
    let mut previous = u32::MAX;
    for level in 0..=40 {
        let cooldown = calculate_stats(Archer, level).attack_cooldown;
        assert!(cooldown <= previous);
        previous = cooldown;
    }
}

#[test]
fn base_hp_scales_five_percent_per_level() {
    assert_eq!(max_base_hp(2000, 0), 2000);
    assert_eq!(max_base_hp(2000, 5), 2500);
    assert_eq!(max_base_hp(2000, 10), 3000);
}

proptest! {
    #[test]
    fn prop_max_hp_scales_five_percent_per_level(archetype in arb_archetype(), level in 0u32..=500) {
        let base = calculate_stats(archetype, 0).max_hp;
        let expected = u64::from(base) * (100 + 5 * u64::from(level)) / 100;
        let stats = calculate_stats(archetype, level);
        prop_assert_eq!(u64::from(stats.max_hp), expected);
        prop_assert_eq!(stats.hp, stats.max_hp);
    }

    #[test]
    fn prop_stats_never_shrink_with_level(archetype in arb_archetype(), level in 0u32..=200) {
        let lower = calculate_stats(archetype, level);
        let higher = calculate_stats(archetype, level + 1);
        prop_assert!(higher.max_hp >= lower.max_hp);
        prop_assert!(higher.damage >= lower.damage);
        prop_assert!(higher.speed >= lower.speed);
    }
}
