//! Gold, production queue, towers and upgrades through the engine.

use skirmish_core::defense::next_tower_cost;
use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{grant_gold, quiet_engine, run_frames};

#[test]
fn dismissing_a_queued_unit_refunds_it() {
    let mut engine = quiet_engine(MatchConfig::default());
    let gold = engine.world().treasuries[Faction::Player].gold();

    assert!(engine.queue_unit(Archetype::Archer).is_applied());
    assert!(engine.dismiss_unit(Archetype::Archer).is_applied());

    assert_eq!(engine.world().treasuries[Faction::Player].gold(), gold);
    assert!(engine.world().registry.queue(Faction::Player).is_empty());
}

#[test]
fn unaffordable_unit_leaves_queue_and_gold_alone() {
    let mut engine = quiet_engine(MatchConfig::default());
    assert_eq!(engine.world().treasuries[Faction::Player].gold(), 200);

    assert!(engine.queue_unit(Archetype::Swordsman).is_applied());
    assert_eq!(
        engine.queue_unit(Archetype::Paladin),
        CommandOutcome::Rejected(Rejection::InsufficientGold)
    );

    assert_eq!(engine.world().registry.queue(Faction::Player).len(), 1);
    assert_eq!(engine.world().treasuries[Faction::Player].gold(), 100);
}

#[test]
fn queued_unit_spawns_at_home_base() {
    let mut engine = quiet_engine(MatchConfig::default());
    assert!(engine.queue_unit(Archetype::Swordsman).is_applied());

    run_frames(&mut engine, 150);

    let world = engine.world();
    assert!(world.registry.queue(Faction::Player).is_empty());
    assert_eq!(world.stats[Faction::Player].units_spawned, 1);
    let unit = &world.registry.units()[0];
    assert_eq!(unit.archetype, Archetype::Swordsman);
    assert_eq!(unit.faction, Faction::Player);
}

#[test]
fn tower_cap_stops_the_sixth_purchase() {
    let mut engine = quiet_engine(MatchConfig::default());
    grant_gold(&mut engine, Faction::Player, 10_000);
    let start = engine.world().treasuries[Faction::Player].gold();

    let mut spent = 0;
    for _ in 0..5 {
        spent += next_tower_cost(engine.world(), Faction::Player);
        assert!(engine.buy_tower().is_applied());
    }
    assert_eq!(spent, 300 + 450 + 600 + 750 + 900);
    assert_eq!(engine.buy_tower(), CommandOutcome::Rejected(Rejection::TowerCap));

    assert_eq!(engine.world().structures[Faction::Player].tower_count(), 5);
    assert_eq!(engine.world().treasuries[Faction::Player].gold(), start - spent);
}

#[test]
fn miner_completes_a_trip() {
    let mut engine = quiet_engine(MatchConfig::default());
    assert!(engine.queue_unit(Archetype::Miner).is_applied());

    let mut frames = 0;
    while engine.world().stats[Faction::Player].gold_mined == 0 && frames < 1_000 {
        engine.update();
        frames += 1;
    }

    assert_eq!(engine.world().stats[Faction::Player].gold_mined, 12);
    let miner = &engine.world().registry.units()[0];
    assert_eq!(miner.state, UnitState::MineWalkToMine);
    assert_eq!(miner.cargo, 0);
}

#[test]
fn session_upgrades_are_not_persisted() {
    let mut engine = quiet_engine(MatchConfig::default());
    grant_gold(&mut engine, Faction::Player, 1_000);
    engine.set_upgrade_level(Faction::Player, UpgradeKind::TowerPower, 2);

    assert!(engine
        .purchase_session_upgrade(Faction::Player, UpgradeKind::PopulationCap)
        .is_applied());
    assert_eq!(engine.world().population_cap(Faction::Player), 25);

    let permanent = engine.world().upgrades[Faction::Player].permanent();
    assert_eq!(permanent.level(UpgradeKind::PopulationCap), 0);
    assert_eq!(permanent.level(UpgradeKind::TowerPower), 2);
}

#[test]
fn permanent_kinds_cannot_be_bought_mid_match() {
    let mut engine = quiet_engine(MatchConfig::default());
    grant_gold(&mut engine, Faction::Player, 1_000);
    assert_eq!(
        engine.purchase_session_upgrade(Faction::Player, UpgradeKind::TowerPower),
        CommandOutcome::Rejected(Rejection::Unavailable)
    );
}

#[test]
fn base_hp_upgrade_keeps_damage_taken() {
    let mut engine = quiet_engine(MatchConfig::default());
    engine.world_mut().structures[Faction::Player].apply_damage(500);

    engine.set_upgrade_level(Faction::Player, UpgradeKind::BaseHp, 5);
    let base = &engine.world().structures[Faction::Player];
    assert_eq!(base.max_hp, 2500);
    assert_eq!(base.hp, 2000);

    engine.set_upgrade_level(Faction::Player, UpgradeKind::BaseHp, 10);
    let base = &engine.world().structures[Faction::Player];
    assert_eq!(base.max_hp, 3000);
    assert_eq!(base.hp, 2500);
}

#[test]
fn passive_income_pays_both_sides() {
    let mut engine = quiet_engine(MatchConfig::default());
    run_frames(&mut engine, 60);
    for faction in Faction::ALL {
        assert_eq!(engine.world().treasuries[faction].gold(), 202);
    }
}
