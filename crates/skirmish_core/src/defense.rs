//! Base structures and their towers.

use serde::{Deserialize, Serialize};

use crate::combat::{tower_cost, tower_damage};
use crate::components::{Projectile, ProjectileKind, UnitId};
use crate::error::{CommandOutcome, Rejection};
use crate::factions::Faction;
use crate::hooks::EngineHooks;
use crate::math::{fx, lane_distance, Fixed};
use crate::upgrades::UpgradeKind;
use crate::world::World;

/// Lane units per frame travelled by a tower shot.
pub const TOWER_SHOT_SPEED: i32 = 8;
/// Height tower shots are fired from.
pub const TOWER_SHOT_HEIGHT: i32 = 60;

/// One base-mounted tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tower {
    /// Frames until the tower can fire again.
    pub cooldown: u32,
}

/// A faction's base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Structure {
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Towers, each with an independent cooldown.
    pub towers: Vec<Tower>,
}

impl Structure {
    /// A fresh base at full health with no towers.
    #[must_use]
    pub const fn new(max_hp: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            towers: Vec::new(),
        }
    }

    /// Whether the base has been destroyed.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.hp == 0
    }

    /// Number of towers.
    #[must_use]
    pub fn tower_count(&self) -> u32 {
        self.towers.len() as u32
    }

    /// Apply damage, flooring at zero. Returns the damage dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        dealt
    }

    /// Change max HP and shift current HP by the same delta, clamped to
    /// `0..=new_max`.
    pub fn rescale(&mut self, new_max: u32) {
        let shifted = i64::from(self.hp) + i64::from(new_max) - i64::from(self.max_hp);
        self.hp = shifted.clamp(0, i64::from(new_max)) as u32;
        self.max_hp = new_max;
    }
}

/// Buy a tower for a faction's base.
pub fn buy_tower(world: &mut World, faction: Faction) -> CommandOutcome {
    if !world.phase.is_running() {
        return Rejection::NotRunning.into();
    }
    let owned = world.structures[faction].tower_count();
    if owned >= world.config.towers.max_towers {
        return Rejection::TowerCap.into();
    }
    let cost = tower_cost(
        world.config.towers.base_cost,
        world.config.towers.cost_increment,
        owned,
    );
    if !world.charge(faction, cost) {
        return Rejection::InsufficientGold.into();
    }
    world.structures[faction].towers.push(Tower::default());
    tracing::info!(%faction, towers = owned + 1, cost, "Tower purchased");
    CommandOutcome::Applied
}

/// Price of the next tower for a faction.
#[must_use]
pub fn next_tower_cost(world: &World, faction: Faction) -> u32 {
    tower_cost(
        world.config.towers.base_cost,
        world.config.towers.cost_increment,
        world.structures[faction].tower_count(),
    )
}

/// The enemy a tower should shoot: the living enemy closest to the base
/// within range, lowest id first on ties.
#[must_use]
pub fn select_tower_target(world: &World, faction: Faction) -> Option<UnitId> {
    let base_x = world.base_x(faction);
    let range = fx(world.config.towers.range);
    world
        .registry
        .living_units(faction.opponent())
        .map(|unit| (lane_distance(unit.x, base_x), unit.id))
        .filter(|(distance, _)| *distance <= range)
        .min()
        .map(|(_, id)| id)
}

/// Tick every tower: cool down, then fire when ready and a target exists.
pub fn update_towers(world: &mut World, hooks: &mut dyn EngineHooks) {
    for faction in Faction::ALL {
        let tower_count = world.structures[faction].towers.len();
        if tower_count == 0 {
            continue;
        }
        let damage = tower_damage(
            world.config.towers.base_damage,
            world.upgrades[faction].level(UpgradeKind::TowerPower),
        );
        let base_x = world.base_x(faction);

        for index in 0..tower_count {
            let tower = &mut world.structures[faction].towers[index];
            if tower.cooldown > 0 {
                tower.cooldown -= 1;
                continue;
            }
            let Some(target) = select_tower_target(world, faction) else {
                continue;
            };
            world.structures[faction].towers[index].cooldown = world.config.towers.cooldown_frames;
            world.registry.insert_projectile(tower_shot(faction, base_x, damage, target));
            hooks.on_tower_fired(faction, target);
            tracing::trace!(%faction, tower = index, target, "Tower fired");
        }
    }
}

fn tower_shot(faction: Faction, base_x: Fixed, damage: u32, target: UnitId) -> Projectile {
    Projectile {
        id: 0,
        x: base_x,
        y: fx(TOWER_SHOT_HEIGHT),
        vx: fx(TOWER_SHOT_SPEED * faction.direction()),
        vy: Fixed::ZERO,
        faction,
        damage,
        kind: ProjectileKind::TowerShot,
        homing: Some(target),
        from_skill: false,
        lifetime: 240,
        chain: None,
    }
}
