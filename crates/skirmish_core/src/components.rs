//! Entity data: units, projectiles, hazards and visual-only particles.
//!
//! Entities refer to each other only by id. A [`TargetRef::Unit`] is a weak
//! relation resolved against the registry every tick; failing to resolve it
//! simply means the target is lost.

use serde::{Deserialize, Serialize};

use crate::archetypes::Archetype;
use crate::combat::UnitStats;
use crate::factions::Faction;
use crate::math::{fixed_serde, lane_distance, Fixed};

/// Unique identifier for a unit.
pub type UnitId = u32;

/// Unique identifier for a projectile.
pub type ProjectileId = u32;

/// Unique identifier for a hazard.
pub type HazardId = u32;

/// Finite-state-machine state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// Holding position.
    Idle,
    /// Walking toward a destination.
    Move,
    /// Engaging a target.
    Attack,
    /// Miner walking out to the mine.
    MineWalkToMine,
    /// Miner gathering at the mine.
    MineGathering,
    /// Miner carrying gold home.
    MineReturn,
    /// Playing the death sequence.
    Die,
    /// Finished dying, about to be removed.
    Dead,
    /// Falling back to the home base.
    Retreat,
}

impl UnitState {
    /// Whether the unit is dying or dead.
    #[must_use]
    pub const fn is_dying(self) -> bool {
        matches!(self, Self::Die | Self::Dead)
    }
}

/// What a unit is currently attacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    /// An enemy unit, by id.
    Unit(UnitId),
    /// The enemy base structure.
    Base,
}

/// Which end of a patrol a unit is walking toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PatrolHeading {
    /// Toward the rally point.
    #[default]
    A,
    /// Toward the patrol point.
    B,
}

impl PatrolHeading {
    /// The other heading.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// A faction-owned mobile combatant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Unique id.
    pub id: UnitId,
    /// Owning faction.
    pub faction: Faction,
    /// Archetype.
    pub archetype: Archetype,
    /// Lane coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Visual-only vertical offset.
    pub y_offset: i32,
    /// State machine state.
    pub state: UnitState,
    /// Effective stats.
    pub stats: UnitStats,
    /// Frame of the last attack.
    pub last_attack_frame: u64,
    /// Animation frame counter.
    pub anim_frame: u32,
    /// Frames left in the death sequence.
    pub death_timer: u32,
    /// Frames of lingering chill after leaving a freeze zone.
    pub freeze_timer: u32,
    /// Whether the unit belongs to the vanguard this tick.
    pub is_vanguard: bool,
    /// Whether the unit stands in a slowing hazard this tick.
    pub is_slowed: bool,
    /// Patrol direction.
    pub patrol_heading: PatrolHeading,
    /// Current target.
    pub target: Option<TargetRef>,
    /// Gold carried by a miner.
    pub cargo: u32,
    /// Frames left gathering at the mine.
    pub gather_timer: u32,
}

impl Unit {
    /// Create a freshly spawned unit.
    #[must_use]
    pub fn new(id: UnitId, faction: Faction, archetype: Archetype, x: Fixed, stats: UnitStats) -> Self {
        let state = if archetype.is_miner() {
            UnitState::MineWalkToMine
        } else {
            UnitState::Move
        };
        Self {
            id,
            faction,
            archetype,
            x,
            y_offset: 0,
            state,
            stats,
            last_attack_frame: 0,
            anim_frame: 0,
            death_timer: 0,
            freeze_timer: 0,
            is_vanguard: false,
            is_slowed: false,
            patrol_heading: PatrolHeading::A,
            target: None,
            cargo: 0,
            gather_timer: 0,
        }
    }

    /// Alive and not in the death sequence.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.state.is_dying()
    }

    /// Distance to a lane coordinate.
    #[must_use]
    pub fn distance_to(&self, x: Fixed) -> Fixed {
        lane_distance(self.x, x)
    }
}

/// Kind of projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Archer arrow.
    Arrow,
    /// Chain strike bolt.
    Lightning,
    /// Tower shot.
    TowerShot,
    /// Falling barrage shell.
    Barrage,
}

/// Remaining jumps of a chain strike bolt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChainHop {
    /// Jumps still allowed after the current hit.
    pub jumps_left: u32,
    /// Units already struck by this chain.
    pub struck: Vec<UnitId>,
}

/// A short-lived ballistic entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projectile {
    /// Unique id.
    pub id: ProjectileId,
    /// Lane coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Height above the lane.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Horizontal speed per frame (sign is direction).
    #[serde(with = "fixed_serde")]
    pub vx: Fixed,
    /// Vertical speed per frame (negative falls).
    #[serde(with = "fixed_serde")]
    pub vy: Fixed,
    /// Faction that fired it.
    pub faction: Faction,
    /// Damage on impact.
    pub damage: u32,
    /// Kind tag.
    pub kind: ProjectileKind,
    /// Homing target, if any.
    pub homing: Option<UnitId>,
    /// Skill-sourced projectiles never damage structures.
    pub from_skill: bool,
    /// Frames before the projectile expires.
    pub lifetime: u32,
    /// Chain state of lightning bolts.
    pub chain: Option<ChainHop>,
}

/// Visual-only particle kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Hit spark.
    Spark,
    /// Lightning arc between two units.
    Arc,
    /// Gold deposit sparkle.
    Gold,
    /// Victory firework.
    Firework,
}

/// A cosmetic effect. Never influences gameplay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Particle {
    /// Lane coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Height.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
    /// Horizontal drift per frame.
    #[serde(with = "fixed_serde")]
    pub vx: Fixed,
    /// Vertical drift per frame.
    #[serde(with = "fixed_serde")]
    pub vy: Fixed,
    /// Frames left.
    pub life: u32,
    /// Kind tag.
    pub kind: ParticleKind,
}

impl Particle {
    /// A stationary particle.
    #[must_use]
    pub fn at(kind: ParticleKind, x: Fixed, y: Fixed, life: u32) -> Self {
        Self {
            x,
            y,
            vx: Fixed::ZERO,
            vy: Fixed::ZERO,
            life,
            kind,
        }
    }
}

/// A persistent area effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hazard {
    /// Unique id.
    pub id: HazardId,
    /// Center of the zone.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Half of the zone's width.
    #[serde(with = "fixed_serde")]
    pub half_width: Fixed,
    /// Frames left.
    pub remaining: u32,
    /// Total lifetime, for progress display.
    pub duration: u32,
    /// Percentage of max HP dealt each pulse.
    pub damage_percent: u32,
    /// Speed kept by units inside, in percent.
    pub slow_percent: u32,
    /// Owner; its units are unaffected.
    pub faction: Faction,
}

impl Hazard {
    /// Whether a lane coordinate lies within the zone.
    #[must_use]
    pub fn contains(&self, x: Fixed) -> bool {
        lane_distance(self.x, x) <= self.half_width
    }
}
