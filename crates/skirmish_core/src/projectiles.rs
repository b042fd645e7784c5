//! Projectile flight and impact.

use crate::abilities::{next_chain_target, BARRAGE_SPLASH_RADIUS};
use crate::combat::{attack_damage, chain_jump_damage};
use crate::components::{Particle, ParticleKind, Projectile, ProjectileKind, UnitId};
use crate::hooks::EngineHooks;
use crate::math::{fx, lane_distance, step_toward, Fixed};
use crate::world::World;

const SPARK_LIFE: u32 = 12;
const ARC_LIFE: u32 = 10;

/// What happened to a projectile this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flight {
    /// Still in the air.
    Flying,
    /// Hit something or expired.
    Done,
}

/// Advance every projectile one frame and resolve impacts.
pub fn update_projectiles(world: &mut World, hooks: &mut dyn EngineHooks) {
    let projectiles = world.registry.take_projectiles();
    let mut survivors = Vec::with_capacity(projectiles.len());

    for mut projectile in projectiles {
        projectile.lifetime = projectile.lifetime.saturating_sub(1);
        let flight = match projectile.kind {
            ProjectileKind::Barrage => fall(world, hooks, &mut projectile),
            _ => match projectile.homing {
                Some(target) => home(world, hooks, &mut projectile, target),
                None => fly_at_base(world, hooks, &mut projectile),
            },
        };
        if flight == Flight::Flying && projectile.lifetime > 0 {
            survivors.push(projectile);
        }
    }

    world.registry.restore_projectiles(survivors);
}

/// Barrage shells fall straight down and splash enemy units on landing.
fn fall(world: &mut World, hooks: &mut dyn EngineHooks, shell: &mut Projectile) -> Flight {
    shell.y += shell.vy;
    if shell.y > Fixed::ZERO {
        return Flight::Flying;
    }

    let radius = fx(BARRAGE_SPLASH_RADIUS);
    let victims: Vec<UnitId> = world
        .registry
        .living_units(shell.faction.opponent())
        .filter(|u| lane_distance(u.x, shell.x) <= radius)
        .map(|u| u.id)
        .collect();
    for id in victims {
        world.damage_unit(hooks, id, shell.damage, shell.faction);
    }
    world
        .registry
        .push_particle(Particle::at(ParticleKind::Spark, shell.x, Fixed::ZERO, SPARK_LIFE));
    Flight::Done
}

/// Homing projectiles chase a unit; a vanished target makes them fizzle.
fn home(world: &mut World, hooks: &mut dyn EngineHooks, projectile: &mut Projectile, target: UnitId) -> Flight {
    let Some(target_x) = world.registry.living_unit(target).map(|u| u.x) else {
        return Flight::Done;
    };
    let speed = projectile.vx.abs();
    projectile.x = step_toward(projectile.x, target_x, speed);
    if projectile.x != target_x {
        return Flight::Flying;
    }

    match projectile.kind {
        ProjectileKind::Lightning => strike_chain(world, hooks, projectile, target),
        _ => {
            world.damage_unit(hooks, target, projectile.damage, projectile.faction);
            world
                .registry
                .push_particle(Particle::at(ParticleKind::Spark, target_x, fx(20), SPARK_LIFE));
        }
    }
    Flight::Done
}

/// Lightning hits its target and then jumps from victim to victim.
fn strike_chain(world: &mut World, hooks: &mut dyn EngineHooks, bolt: &Projectile, first: UnitId) {
    let mut hop = bolt.chain.clone().unwrap_or_default();
    let mut victim = first;
    let mut damage = bolt.damage;

    loop {
        let Some((x, slowed)) = world.registry.living_unit(victim).map(|u| (u.x, u.is_slowed)) else {
            break;
        };
        world.damage_unit(hooks, victim, attack_damage(damage, false, slowed, 100), bolt.faction);
        hop.struck.push(victim);

        if hop.jumps_left == 0 {
            break;
        }
        let Some(next) = next_chain_target(world, bolt.faction, x, &hop.struck) else {
            break;
        };
        let Some(next_x) = world.registry.unit(next).map(|u| u.x) else {
            break;
        };
        world.registry.push_particle(Particle {
            x,
            y: fx(20),
            vx: (next_x - x) / fx(ARC_LIFE as i32),
            vy: Fixed::ZERO,
            life: ARC_LIFE,
            kind: ParticleKind::Arc,
        });
        hop.jumps_left -= 1;
        damage = chain_jump_damage(damage);
        victim = next;
    }
}

/// Straight shots travel until they reach the enemy base.
fn fly_at_base(world: &mut World, hooks: &mut dyn EngineHooks, projectile: &mut Projectile) -> Flight {
    let enemy = projectile.faction.opponent();
    let base_x = world.base_x(enemy);
    projectile.x = step_toward(projectile.x, base_x, projectile.vx.abs());
    if projectile.x != base_x {
        return Flight::Flying;
    }
    if !projectile.from_skill {
        world.damage_base(hooks, enemy, projectile.damage);
    }
    Flight::Done
}
