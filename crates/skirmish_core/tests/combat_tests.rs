//! Combat, abilities and match end through the engine tick.

use skirmish_core::combat::freeze_duration;
use skirmish_core::components::Projectile;
use skirmish_core::defense::select_tower_target;
use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{
    grant_gold, place_unit, quiet_engine, quiet_engine_with_hooks, run_frames,
};

fn cast(engine: &mut GameEngine, ability: AbilityKind, x: i32) -> CommandOutcome {
    engine.apply_command(Faction::Player, Command::CastAbility { ability, x: fx(x) })
}

#[test]
fn unit_dies_once_and_pays_once() {
    let hooks = RecordingHooks::new();
    let mut engine = quiet_engine_with_hooks(MatchConfig::default(), Box::new(hooks.clone()));
    let victim = place_unit(&mut engine, Faction::Opponent, Archetype::Miner, 800);
    if let Some(unit) = engine.world_mut().registry.unit_mut(victim) {
        unit.stats.hp = 1;
    }

    assert!(cast(&mut engine, AbilityKind::Freeze, 800).is_applied());
    engine.update();

    let unit = engine.world().registry.unit(victim).unwrap();
    assert_eq!(unit.state, UnitState::Die);

    let mut late = RecordingHooks::new();
    let dealt = engine
        .world_mut()
        .damage_unit(&mut late, victim, 500, Faction::Player);
    assert_eq!(dealt, 0);
    assert!(late.events().is_empty());

    run_frames(&mut engine, 60);
    let kills = hooks.count(|e| matches!(e, HookEvent::UnitKilled { id, .. } if *id == victim));
    assert_eq!(kills, 1);
    assert_eq!(engine.world().stats[Faction::Player].kills, 1);
    assert_eq!(engine.world().stats[Faction::Opponent].losses, 1);
    assert!(engine.world().registry.unit(victim).is_none());
}

#[test]
fn freeze_zone_expires_after_its_duration() {
    let mut engine = quiet_engine(MatchConfig::default());
    assert!(cast(&mut engine, AbilityKind::Freeze, 800).is_applied());
    let duration = freeze_duration(0);
    assert_eq!(engine.world().registry.hazards()[0].remaining, duration);

    run_frames(&mut engine, u64::from(duration) - 1);
    assert_eq!(engine.world().registry.hazards()[0].remaining, 1);

    engine.update();
    assert!(engine.world().registry.hazards().is_empty());
}

#[test]
fn cast_on_cooldown_changes_nothing() {
    let mut engine = quiet_engine(MatchConfig::default());
    assert!(cast(&mut engine, AbilityKind::Freeze, 800).is_applied());
    assert!(cast(&mut engine, AbilityKind::Barrage, 800).is_applied());
    run_frames(&mut engine, 10);

    let before = engine.state_hash();
    let cooldown = engine.world().abilities.timers[Faction::Player]
        .get(AbilityKind::Freeze)
        .cooldown;

    assert_eq!(
        cast(&mut engine, AbilityKind::Freeze, 900),
        CommandOutcome::Rejected(Rejection::OnCooldown)
    );
    assert_eq!(
        cast(&mut engine, AbilityKind::Barrage, 900),
        CommandOutcome::Rejected(Rejection::OnCooldown)
    );

    assert_eq!(engine.state_hash(), before);
    assert_eq!(engine.world().registry.hazards().len(), 1);
    assert_eq!(
        engine.world().abilities.timers[Faction::Player]
            .get(AbilityKind::Freeze)
            .cooldown,
        cooldown
    );
}

#[test]
fn cast_into_fog_is_rejected() {
    let mut engine = quiet_engine(MatchConfig::default());
    assert_eq!(
        cast(&mut engine, AbilityKind::ChainStrike, 1500),
        CommandOutcome::Rejected(Rejection::OutOfSight)
    );
    assert_eq!(
        cast(&mut engine, AbilityKind::ChainStrike, 3200),
        CommandOutcome::Rejected(Rejection::OutOfBounds)
    );
    assert_eq!(
        engine.world().abilities.timers[Faction::Player]
            .get(AbilityKind::ChainStrike)
            .cooldown,
        0
    );
}

#[test]
fn pausing_mid_barrage_resumes_exactly() {
    let mut straight = quiet_engine(MatchConfig::default());
    let mut paused = quiet_engine(MatchConfig::default());
    for engine in [&mut straight, &mut paused] {
        place_unit(engine, Faction::Opponent, Archetype::Paladin, 820);
        assert!(cast(engine, AbilityKind::Barrage, 800).is_applied());
    }

    run_frames(&mut paused, 60);
    assert!(paused.toggle_pause().is_applied());
    let pending = paused.world().abilities.shots.clone();
    assert!(!pending.is_empty());

    run_frames(&mut paused, 500);
    assert_eq!(paused.frame(), 60);
    assert_eq!(paused.world().abilities.shots, pending);
    assert_eq!(
        cast(&mut paused, AbilityKind::Freeze, 800),
        CommandOutcome::Rejected(Rejection::NotRunning)
    );

    assert!(paused.toggle_pause().is_applied());
    run_frames(&mut paused, 200);
    run_frames(&mut straight, 260);

    assert_eq!(paused.frame(), straight.frame());
    assert_eq!(paused.state_hash(), straight.state_hash());
    assert!(paused.world().abilities.shots.is_empty());
}

#[test]
fn last_hit_on_enemy_base_wins_the_match() {
    let hooks = RecordingHooks::new();
    let mut engine = quiet_engine_with_hooks(MatchConfig::default(), Box::new(hooks.clone()));
    engine.world_mut().structures[Faction::Opponent].hp = 1;
    engine.world_mut().registry.insert_projectile(Projectile {
        id: 0,
        x: fx(2897),
        y: fx(24),
        vx: fx(6),
        vy: Fixed::ZERO,
        faction: Faction::Player,
        damage: 14,
        kind: ProjectileKind::Arrow,
        homing: None,
        from_skill: false,
        lifetime: 120,
        chain: None,
    });

    engine.update();

    assert_eq!(engine.phase(), MatchPhase::Victory);
    assert!(engine.world().structures[Faction::Opponent].is_destroyed());
    assert_eq!(hooks.count(|e| *e == HookEvent::MatchEnded(MatchPhase::Victory)), 1);
}

#[test]
fn nothing_but_particles_moves_after_the_match() {
    let mut engine = quiet_engine(MatchConfig::default());
    let unit = place_unit(&mut engine, Faction::Player, Archetype::Swordsman, 600);
    assert!(engine.queue_unit(Archetype::Swordsman).is_applied());
    run_frames(&mut engine, 5);

    engine.world_mut().structures[Faction::Opponent].hp = 0;
    engine.update();
    assert_eq!(engine.phase(), MatchPhase::Victory);

    let frame = engine.frame();
    let x = engine.world().registry.unit(unit).unwrap().x;
    let queue = engine.world().registry.queue(Faction::Player).clone();
    let particles = engine.world().registry.particles().to_vec();
    assert!(!particles.is_empty());

    run_frames(&mut engine, 30);

    assert_eq!(engine.frame(), frame);
    assert_eq!(engine.world().registry.unit(unit).unwrap().x, x);
    assert_eq!(engine.world().registry.queue(Faction::Player), &queue);
    assert_ne!(engine.world().registry.particles(), particles.as_slice());
    assert_eq!(
        engine.queue_unit(Archetype::Miner),
        CommandOutcome::Rejected(Rejection::NotRunning)
    );
    assert_eq!(
        engine.apply_command(Faction::Player, Command::SetRallyPoint(fx(500))),
        CommandOutcome::Rejected(Rejection::NotRunning)
    );
}

#[test]
fn defeat_takes_precedence_when_both_bases_fall() {
    let mut engine = quiet_engine(MatchConfig::default());
    for faction in Faction::ALL {
        engine.world_mut().structures[faction].hp = 0;
    }
    engine.update();
    assert_eq!(engine.phase(), MatchPhase::Defeat);
}

#[test]
fn tower_targets_enemy_closest_to_base() {
    let mut engine = quiet_engine(MatchConfig::default());
    place_unit(&mut engine, Faction::Opponent, Archetype::Swordsman, 450);
    let near = place_unit(&mut engine, Faction::Opponent, Archetype::Archer, 300);
    let tied = place_unit(&mut engine, Faction::Opponent, Archetype::Paladin, 300);
    place_unit(&mut engine, Faction::Opponent, Archetype::Hero, 700);
    place_unit(&mut engine, Faction::Player, Archetype::Swordsman, 200);

    assert!(near < tied);
    assert_eq!(select_tower_target(engine.world(), Faction::Player), Some(near));
}

#[test]
fn tower_ignores_enemies_out_of_range() {
    let mut engine = quiet_engine(MatchConfig::default());
    place_unit(&mut engine, Faction::Opponent, Archetype::Hero, 700);
    assert_eq!(select_tower_target(engine.world(), Faction::Player), None);
}

#[test]
fn owned_tower_shoots_approaching_enemy() {
    let hooks = RecordingHooks::new();
    let mut engine = quiet_engine_with_hooks(MatchConfig::default(), Box::new(hooks.clone()));
    grant_gold(&mut engine, Faction::Player, 300);
    assert!(engine.buy_tower().is_applied());
    let target = place_unit(&mut engine, Faction::Opponent, Archetype::Paladin, 400);

    engine.update();

    let fired = hooks.count(|e| {
        matches!(e, HookEvent::TowerFired { faction: Faction::Player, target: t } if *t == target)
    });
    assert_eq!(fired, 1);
}
