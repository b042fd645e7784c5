//! Barrage, chain strike and freeze.
//!
//! Casting never starts a timer outside the tick loop. A barrage becomes a
//! list of [`ScheduledShot`]s keyed by frame and a chain strike becomes a
//! [`Storm`] that counts down with the match. Frames only advance while
//! the match runs, so pausing keeps everything exactly where it was.

use serde::{Deserialize, Serialize};

use crate::combat::{
    barrage_damage, barrage_duration, chain_damage, freeze_duration, freeze_width,
};
use crate::components::{ChainHop, Hazard, Projectile, ProjectileKind, UnitId};
use crate::error::{CommandOutcome, Rejection};
use crate::factions::{Faction, PerFaction};
use crate::hooks::EngineHooks;
use crate::math::{fixed_serde, fx, lane_distance, Fixed};
use crate::random::RandomSource;
use crate::upgrades::UpgradeKind;
use crate::world::World;

/// Frames between consecutive barrage shells.
pub const BARRAGE_SHOT_INTERVAL: u32 = 6;
/// Horizontal jitter of a barrage shell around the cast point.
pub const BARRAGE_JITTER: i32 = 60;
/// Height barrage shells spawn at.
pub const BARRAGE_SPAWN_HEIGHT: i32 = 400;
/// Fall speed of barrage shells.
pub const BARRAGE_FALL_SPEED: i32 = 8;
/// Splash radius of a landing shell.
pub const BARRAGE_SPLASH_RADIUS: i32 = 40;
/// Lifetime of a chain strike storm.
pub const STORM_DURATION: u32 = 240;
/// Frames between storm strikes.
pub const STORM_PULSE_INTERVAL: u32 = 40;
/// How far from the storm center the first strike reaches.
pub const STORM_STRIKE_RADIUS: i32 = 150;
/// How far a bolt can jump from its last victim.
pub const CHAIN_JUMP_RADIUS: i32 = 120;
/// Jumps after the first hit.
pub const CHAIN_MAX_JUMPS: u32 = 4;
/// Lightning bolt speed.
pub const LIGHTNING_SPEED: i32 = 20;
/// Max-HP percentage a freeze zone deals per pulse.
pub const FREEZE_DAMAGE_PERCENT: u32 = 3;
/// Speed kept inside a freeze zone.
pub const FREEZE_SLOW_PERCENT: u32 = 50;

/// One of the three castable abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Falling shells around a point.
    Barrage,
    /// A storm that arcs lightning between units.
    ChainStrike,
    /// A slowing, damaging zone.
    Freeze,
}

impl AbilityKind {
    /// All abilities in display order.
    pub const ALL: [Self; 3] = [Self::Barrage, Self::ChainStrike, Self::Freeze];

    /// The upgrade that powers this ability.
    #[must_use]
    pub const fn upgrade(self) -> UpgradeKind {
        match self {
            Self::Barrage => UpgradeKind::BarragePower,
            Self::ChainStrike => UpgradeKind::ChainPower,
            Self::Freeze => UpgradeKind::FreezePower,
        }
    }

    /// Name used on the wire and in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Barrage => "Barrage",
            Self::ChainStrike => "ChainStrike",
            Self::Freeze => "Freeze",
        }
    }

    /// Parse a wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    const fn index(self) -> usize {
        match self {
            Self::Barrage => 0,
            Self::ChainStrike => 1,
            Self::Freeze => 2,
        }
    }
}

/// Cooldown and active window of one ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AbilityTimer {
    /// Frames until the ability can be cast again.
    pub cooldown: u32,
    /// Frames left in the current effect.
    pub active: u32,
    /// Length of the current effect, for progress bars.
    pub max_duration: u32,
}

/// All ability timers of one faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AbilityTimers {
    timers: [AbilityTimer; 3],
}

impl AbilityTimers {
    /// Timer of an ability.
    #[must_use]
    pub const fn get(&self, kind: AbilityKind) -> &AbilityTimer {
        &self.timers[kind.index()]
    }

    /// Timer of an ability, mutably.
    pub fn get_mut(&mut self, kind: AbilityKind) -> &mut AbilityTimer {
        &mut self.timers[kind.index()]
    }

    /// Count every timer down by one frame.
    pub fn tick(&mut self) {
        for timer in &mut self.timers {
            timer.cooldown = timer.cooldown.saturating_sub(1);
            timer.active = timer.active.saturating_sub(1);
        }
    }
}

/// A barrage shell waiting for its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduledShot {
    /// Frame the shell spawns on.
    pub fire_frame: u64,
    /// Lane position, jitter included.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Caster.
    pub faction: Faction,
    /// Damage on landing.
    pub damage: u32,
}

/// An active chain strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Storm {
    /// Anchor position.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Frames left.
    pub remaining: u32,
    /// Caster.
    pub faction: Faction,
    /// Damage of the first hit of each bolt.
    pub damage: u32,
}

/// Delayed ability effects of a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AbilityEffects {
    /// Timers per faction.
    pub timers: PerFaction<AbilityTimers>,
    /// Barrage shells not yet spawned.
    pub shots: Vec<ScheduledShot>,
    /// Active storms.
    pub storms: Vec<Storm>,
}

/// The furthest lane position a faction can see toward the enemy.
///
/// Vision reaches a fixed distance past the base, or past the most
/// advanced living unit, whichever is further.
#[must_use]
pub fn fog_boundary(world: &World, faction: Faction) -> Fixed {
    let base = world.base_x(faction);
    let base_vision = fx(world.config.vision.base_vision);
    let unit_vision = fx(world.config.vision.unit_vision);
    let units = world.registry.living_units(faction).map(|u| u.x);
    match faction {
        Faction::Player => {
            let furthest = units.max().map_or(base, |x| x + unit_vision);
            (base + base_vision).max(furthest)
        }
        Faction::Opponent => {
            let furthest = units.min().map_or(base, |x| x - unit_vision);
            (base - base_vision).min(furthest)
        }
    }
}

/// Whether a faction can see lane position `x`.
#[must_use]
pub fn is_visible(world: &World, faction: Faction, x: Fixed) -> bool {
    let boundary = fog_boundary(world, faction);
    match faction {
        Faction::Player => x <= boundary,
        Faction::Opponent => x >= boundary,
    }
}

/// Cast an ability.
///
/// Rejected while the match is not running, while the ability cools down,
/// and when `x` is off the lane or hidden by fog. A rejected cast changes
/// nothing.
pub fn cast_ability(
    world: &mut World,
    hooks: &mut dyn EngineHooks,
    random: &mut dyn RandomSource,
    faction: Faction,
    kind: AbilityKind,
    x: Fixed,
) -> CommandOutcome {
    if !world.phase.is_running() {
        return Rejection::NotRunning.into();
    }
    if world.abilities.timers[faction].get(kind).cooldown > 0 {
        return Rejection::OnCooldown.into();
    }
    if !world.on_lane(x) {
        return Rejection::OutOfBounds.into();
    }
    if !is_visible(world, faction, x) {
        return Rejection::OutOfSight.into();
    }

    let level = world.upgrades[faction].level(kind.upgrade());
    let duration = match kind {
        AbilityKind::Barrage => schedule_barrage(world, random, faction, x, level),
        AbilityKind::ChainStrike => {
            world.abilities.storms.push(Storm {
                x,
                remaining: STORM_DURATION,
                faction,
                damage: chain_damage(level),
            });
            STORM_DURATION
        }
        AbilityKind::Freeze => {
            let duration = freeze_duration(level);
            world.registry.insert_hazard(Hazard {
                id: 0,
                x,
                half_width: fx((freeze_width(level) / 2) as i32),
                remaining: duration,
                duration,
                damage_percent: FREEZE_DAMAGE_PERCENT,
                slow_percent: FREEZE_SLOW_PERCENT,
                faction,
            });
            duration
        }
    };

    let cooldown = match kind {
        AbilityKind::Barrage => world.config.abilities.barrage_cooldown,
        AbilityKind::ChainStrike => world.config.abilities.chain_cooldown,
        AbilityKind::Freeze => world.config.abilities.freeze_cooldown,
    };
    let timer = world.abilities.timers[faction].get_mut(kind);
    timer.cooldown = cooldown;
    timer.active = duration;
    timer.max_duration = duration;

    hooks.on_ability_cast(faction, kind, x);
    tracing::debug!(%faction, ability = kind.name(), x = %x, level, "Ability cast");
    CommandOutcome::Applied
}

fn schedule_barrage(
    world: &mut World,
    random: &mut dyn RandomSource,
    faction: Faction,
    x: Fixed,
    level: u32,
) -> u32 {
    let duration = barrage_duration(level);
    let damage = barrage_damage(level);
    let shots = duration / BARRAGE_SHOT_INTERVAL;
    for i in 0..shots {
        let jitter = random.range_inclusive(-BARRAGE_JITTER, BARRAGE_JITTER);
        world.abilities.shots.push(ScheduledShot {
            fire_frame: world.frame + 1 + u64::from(i * BARRAGE_SHOT_INTERVAL),
            x: world.clamp_to_lane(x + fx(jitter)),
            faction,
            damage,
        });
    }
    duration
}

/// Spawn due barrage shells and pulse storms.
pub fn update_abilities(world: &mut World) {
    let frame = world.frame;
    let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut world.abilities.shots)
        .into_iter()
        .partition(|shot| shot.fire_frame <= frame);
    world.abilities.shots = pending;
    for shot in due {
        world.registry.insert_projectile(barrage_shell(&shot));
    }

    let storms = std::mem::take(&mut world.abilities.storms);
    let mut active = Vec::with_capacity(storms.len());
    for mut storm in storms {
        storm.remaining = storm.remaining.saturating_sub(1);
        if storm.remaining % STORM_PULSE_INTERVAL == 0 {
            if let Some(target) = storm_target(world, &storm) {
                world.registry.insert_projectile(lightning_bolt(&storm, target));
            }
        }
        if storm.remaining > 0 {
            active.push(storm);
        }
    }
    world.abilities.storms = active;
}

/// Nearest living enemy of the caster within strike radius of the storm.
fn storm_target(world: &World, storm: &Storm) -> Option<UnitId> {
    let radius = fx(STORM_STRIKE_RADIUS);
    world
        .registry
        .living_units(storm.faction.opponent())
        .map(|u| (lane_distance(u.x, storm.x), u.id))
        .filter(|(distance, _)| *distance <= radius)
        .min()
        .map(|(_, id)| id)
}

/// Next chain victim: nearest living enemy within jump radius of `from`
/// that has not been struck yet.
#[must_use]
pub fn next_chain_target(world: &World, caster: Faction, from: Fixed, struck: &[UnitId]) -> Option<UnitId> {
    let radius = fx(CHAIN_JUMP_RADIUS);
    world
        .registry
        .living_units(caster.opponent())
        .filter(|u| !struck.contains(&u.id))
        .map(|u| (lane_distance(u.x, from), u.id))
        .filter(|(distance, _)| *distance <= radius)
        .min()
        .map(|(_, id)| id)
}

fn barrage_shell(shot: &ScheduledShot) -> Projectile {
    Projectile {
        id: 0,
        x: shot.x,
        y: fx(BARRAGE_SPAWN_HEIGHT),
        vx: Fixed::ZERO,
        vy: fx(-BARRAGE_FALL_SPEED),
        faction: shot.faction,
        damage: shot.damage,
        kind: ProjectileKind::Barrage,
        homing: None,
        from_skill: true,
        lifetime: (BARRAGE_SPAWN_HEIGHT / BARRAGE_FALL_SPEED) as u32 + 2,
        chain: None,
    }
}

fn lightning_bolt(storm: &Storm, target: UnitId) -> Projectile {
    Projectile {
        id: 0,
        x: storm.x,
        y: fx(BARRAGE_SPAWN_HEIGHT),
        vx: fx(LIGHTNING_SPEED),
        vy: Fixed::ZERO,
        faction: storm.faction,
        damage: storm.damage,
        kind: ProjectileKind::Lightning,
        homing: Some(target),
        from_skill: true,
        lifetime: 60,
        chain: Some(ChainHop {
            jumps_left: CHAIN_MAX_JUMPS,
            struck: Vec::new(),
        }),
    }
}
