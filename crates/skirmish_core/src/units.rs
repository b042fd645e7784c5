//! Unit behavior: targeting, attacks, movement, mining and death.
//!
//! Every unit runs the same state machine; archetypes differ only in the
//! numbers of their profile and in whether they fire arrows. Units are
//! processed in id order. Each one is copied out of the registry, updated
//! against the rest of the world and written back, so an attack can damage
//! its target while the attacker is being updated.

use crate::combat::{attack_damage, miner_yield, point_blank_percent};
use crate::components::{
    Hazard, Particle, ParticleKind, PatrolHeading, Projectile, ProjectileKind, TargetRef, Unit,
    UnitId, UnitState,
};
use crate::factions::Faction;
use crate::hooks::EngineHooks;
use crate::math::{fx, scale_fixed_percent, step_toward, Fixed};
use crate::orders::Strategy;
use crate::upgrades::UpgradeKind;
use crate::world::World;

/// Frames of visual chill after leaving a freeze zone.
pub const FREEZE_LINGER_FRAMES: u32 = 30;
/// Lane units per frame travelled by an arrow.
pub const ARROW_SPEED: i32 = 6;
/// Height arrows are loosed from.
pub const ARROW_HEIGHT: i32 = 24;
/// Frames a gold sparkle lives.
const GOLD_PARTICLE_LIFE: u32 = 30;

/// How a unit behaves once it reaches its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrival {
    /// Stand still and hold.
    Hold,
    /// Turn around toward the other patrol end.
    Patrol,
    /// Keep pushing; the destination is the enemy base.
    Advance,
    /// Reached home after a retreat.
    Home,
}

/// Where a unit wants to go this tick.
#[derive(Debug, Clone, Copy)]
struct Destination {
    x: Fixed,
    arrival: Arrival,
}

/// Run the unit pass: vanguard flags, every state machine, then removal of
/// finished death sequences.
pub fn update_units(world: &mut World, hooks: &mut dyn EngineHooks) {
    for faction in Faction::ALL {
        assign_vanguard(world, faction);
    }

    for id in world.registry.unit_ids() {
        let Some(mut unit) = world.registry.unit(id).cloned() else {
            continue;
        };
        refresh_slow(&mut unit, world.registry.hazards());
        unit.anim_frame = unit.anim_frame.wrapping_add(1);

        match unit.state {
            UnitState::Die | UnitState::Dead => update_death(&mut unit),
            UnitState::MineWalkToMine | UnitState::MineGathering | UnitState::MineReturn => {
                update_miner(world, &mut unit);
            }
            _ => update_combat_unit(world, hooks, &mut unit),
        }

        if let Some(slot) = world.registry.unit_mut(id) {
            *slot = unit;
        }
    }

    world.registry.retain_units(|u| u.state != UnitState::Dead);
}

/// Flag the first `vanguard_count` living combat units (by id) of a faction.
pub fn assign_vanguard(world: &mut World, faction: Faction) {
    let orders = &world.orders[faction];
    let combat_units = world
        .registry
        .living_units(faction)
        .filter(|u| !u.archetype.is_miner())
        .count();
    let quota = if orders.vanguard_point.is_some() {
        orders.vanguard_count(combat_units)
    } else {
        0
    };

    let mut assigned = 0;
    for unit in world.registry.units_mut() {
        if unit.faction != faction || !unit.is_alive() || unit.archetype.is_miner() {
            continue;
        }
        unit.is_vanguard = assigned < quota;
        if unit.is_vanguard {
            assigned += 1;
        }
    }
}

/// Speed percentage kept by a unit given the enemy hazards it stands in.
#[must_use]
pub fn slow_percent(unit: &Unit, hazards: &[Hazard]) -> u32 {
    hazards
        .iter()
        .filter(|h| h.faction != unit.faction && h.contains(unit.x))
        .map(|h| h.slow_percent)
        .min()
        .unwrap_or(100)
}

fn refresh_slow(unit: &mut Unit, hazards: &[Hazard]) {
    unit.is_slowed = unit.is_alive() && slow_percent(unit, hazards) < 100;
    if unit.is_slowed {
        unit.freeze_timer = FREEZE_LINGER_FRAMES;
    } else {
        unit.freeze_timer = unit.freeze_timer.saturating_sub(1);
    }
}

fn effective_speed(unit: &Unit, hazards: &[Hazard]) -> Fixed {
    scale_fixed_percent(unit.stats.speed, slow_percent(unit, hazards))
}

fn update_death(unit: &mut Unit) {
    unit.death_timer = unit.death_timer.saturating_sub(1);
    if unit.death_timer == 0 {
        unit.state = UnitState::Dead;
    }
}

fn update_miner(world: &mut World, unit: &mut Unit) {
    let speed = effective_speed(unit, world.registry.hazards());
    match unit.state {
        UnitState::MineWalkToMine => {
            let mine = world.mine_x(unit.faction);
            unit.x = step_toward(unit.x, mine, speed);
            if unit.x == mine {
                unit.state = UnitState::MineGathering;
                unit.gather_timer = world.config.mine_gather_frames;
            }
        }
        UnitState::MineGathering => {
            unit.gather_timer = unit.gather_timer.saturating_sub(1);
            if unit.gather_timer == 0 {
                unit.cargo = miner_yield(world.upgrades[unit.faction].level(UpgradeKind::MinerSpeed));
                unit.state = UnitState::MineReturn;
            }
        }
        UnitState::MineReturn => {
            let base = world.base_x(unit.faction);
            unit.x = step_toward(unit.x, base, speed);
            if unit.x == base {
                let cargo = std::mem::take(&mut unit.cargo);
                world.treasuries[unit.faction].credit(cargo);
                world.stats[unit.faction].gold_mined += u64::from(cargo);
                world
                    .registry
                    .push_particle(Particle::at(ParticleKind::Gold, base, fx(30), GOLD_PARTICLE_LIFE));
                unit.state = UnitState::MineWalkToMine;
                tracing::trace!(id = unit.id, cargo, "Miner deposited gold");
            }
        }
        _ => {}
    }
}

fn update_combat_unit(world: &mut World, hooks: &mut dyn EngineHooks, unit: &mut Unit) {
    let retreating = world.orders[unit.faction].strategy == Strategy::Retreat;

    if let Some(target) = unit.target {
        if retreating || !target_in_reach(world, unit, target) {
            unit.target = None;
            unit.state = UnitState::Move;
        }
    }

    if unit.target.is_none() && !retreating {
        if let Some(target) = scan_for_target(world, unit) {
            unit.target = Some(target);
            unit.state = UnitState::Attack;
        }
    }

    if let Some(target) = unit.target {
        unit.state = UnitState::Attack;
        let ready = world.frame.saturating_sub(unit.last_attack_frame)
            >= u64::from(unit.stats.attack_cooldown);
        if ready {
            attack(world, hooks, unit, target);
            unit.last_attack_frame = world.frame;
        }
        return;
    }

    move_unit(world, unit);
}

/// Whether a held target can still be attacked.
fn target_in_reach(world: &World, unit: &Unit, target: TargetRef) -> bool {
    let enemy = unit.faction.opponent();
    match target {
        TargetRef::Unit(id) => world
            .registry
            .living_unit(id)
            .is_some_and(|t| t.faction == enemy && unit.distance_to(t.x) <= unit.stats.range),
        TargetRef::Base => {
            !world.structures[enemy].is_destroyed()
                && unit.distance_to(world.base_x(enemy)) <= unit.stats.range
        }
    }
}

/// Pick a target: the nearest living enemy in range, preferring ones at or
/// beyond min range, else the enemy base when in range.
#[must_use]
pub fn scan_for_target(world: &World, unit: &Unit) -> Option<TargetRef> {
    let enemy = unit.faction.opponent();
    let nearest = world
        .registry
        .living_units(enemy)
        .map(|t| (unit.distance_to(t.x), t.id))
        .filter(|(distance, _)| *distance <= unit.stats.range)
        .min_by_key(|(distance, id)| (*distance < unit.stats.min_range, *distance, *id));
    if let Some((_, id)) = nearest {
        return Some(TargetRef::Unit(id));
    }

    let base_in_reach = !world.structures[enemy].is_destroyed()
        && unit.distance_to(world.base_x(enemy)) <= unit.stats.range;
    base_in_reach.then_some(TargetRef::Base)
}

fn attack(world: &mut World, hooks: &mut dyn EngineHooks, unit: &Unit, target: TargetRef) {
    let enemy = unit.faction.opponent();
    match target {
        TargetRef::Unit(id) => {
            let Some(victim) = world.registry.living_unit(id) else {
                return;
            };
            let distance = unit.distance_to(victim.x);
            let damage = attack_damage(
                unit.stats.damage,
                unit.is_slowed,
                victim.is_slowed,
                point_blank_percent(distance, unit.stats.min_range),
            );
            if unit.archetype.is_ranged() {
                world.registry.insert_projectile(arrow(unit, Some(id), damage));
            } else {
                world.damage_unit(hooks, id, damage, unit.faction);
            }
        }
        TargetRef::Base => {
            let damage = attack_damage(unit.stats.damage, unit.is_slowed, false, 100);
            if unit.archetype.is_ranged() {
                world.registry.insert_projectile(arrow(unit, None, damage));
            } else {
                world.damage_base(hooks, enemy, damage);
            }
        }
    }
}

fn arrow(unit: &Unit, homing: Option<UnitId>, damage: u32) -> Projectile {
    Projectile {
        id: 0,
        x: unit.x,
        y: fx(ARROW_HEIGHT),
        vx: fx(ARROW_SPEED * unit.faction.direction()),
        vy: Fixed::ZERO,
        faction: unit.faction,
        damage,
        kind: ProjectileKind::Arrow,
        homing,
        from_skill: false,
        lifetime: 120,
        chain: None,
    }
}

fn destination(world: &World, unit: &Unit) -> Destination {
    let faction = unit.faction;
    let orders = &world.orders[faction];
    let own_base = world.base_x(faction);

    if orders.strategy == Strategy::Retreat {
        return Destination {
            x: own_base,
            arrival: Arrival::Home,
        };
    }
    if unit.is_vanguard {
        if let Some(point) = orders.vanguard_point {
            return Destination {
                x: point,
                arrival: Arrival::Hold,
            };
        }
    }
    if let (Some(rally), Some(patrol)) = (orders.rally_point, orders.patrol_point) {
        let x = match unit.patrol_heading {
            PatrolHeading::A => rally,
            PatrolHeading::B => patrol,
        };
        return Destination {
            x,
            arrival: Arrival::Patrol,
        };
    }
    let vanguard_active = orders.vanguard_point.is_some() && orders.vanguard_percent() > 0;
    if vanguard_active || orders.strategy.holds_position() {
        return Destination {
            x: orders.hold_point(faction, own_base),
            arrival: Arrival::Hold,
        };
    }
    Destination {
        x: world.base_x(faction.opponent()),
        arrival: Arrival::Advance,
    }
}

fn move_unit(world: &World, unit: &mut Unit) {
    let destination = destination(world, unit);
    let speed = effective_speed(unit, world.registry.hazards());

    if unit.x == destination.x {
        arrive(unit, destination.arrival);
        return;
    }
    unit.x = step_toward(unit.x, destination.x, speed);
    unit.state = if destination.arrival == Arrival::Home {
        UnitState::Retreat
    } else {
        UnitState::Move
    };
    if unit.x == destination.x {
        arrive(unit, destination.arrival);
    }
}

fn arrive(unit: &mut Unit, arrival: Arrival) {
    match arrival {
        Arrival::Patrol => {
            unit.patrol_heading = unit.patrol_heading.flipped();
            unit.state = UnitState::Move;
        }
        Arrival::Hold | Arrival::Advance | Arrival::Home => unit.state = UnitState::Idle,
    }
}
