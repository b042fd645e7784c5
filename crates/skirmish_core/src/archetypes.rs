//! Unit archetypes and their base profiles.
//!
//! Archetypes share almost all of their state-machine logic and differ
//! mainly in numbers, so they are a small constant table plus a handful of
//! behaviour predicates rather than separate types.

use serde::{Deserialize, Serialize};

/// One of the fixed unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    /// Economy unit: walks to the mine and back, never fights.
    Miner,
    /// Cheap melee line unit.
    Swordsman,
    /// Ranged unit firing arrows.
    Archer,
    /// Slow, durable melee tank.
    Paladin,
    /// Elite melee champion.
    Hero,
}

/// Base numbers for an archetype before upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchetypeProfile {
    /// Gold cost.
    pub cost: u32,
    /// Production time in frames before spawn-speed upgrades.
    pub spawn_frames: u32,
    /// Base hit points.
    pub hp: u32,
    /// Base damage per attack.
    pub damage: u32,
    /// Weapon range in lane units.
    pub range: u32,
    /// Targets closer than this are hit at a point-blank penalty.
    pub min_range: u32,
    /// Movement speed in hundredths of a lane unit per frame.
    pub speed_centi: u32,
    /// Frames between attacks.
    pub attack_cooldown: u32,
    /// Population slots used.
    pub population: u32,
    /// Gold credited to the faction that kills one.
    pub kill_reward: u32,
}

/// Flat reward for killing a melee unit.
pub const MELEE_KILL_REWARD: u32 = 20;
/// Reward for killing an archer.
pub const ARCHER_KILL_REWARD: u32 = 35;
/// Reward for killing the hero.
pub const HERO_KILL_REWARD: u32 = 100;

const MINER: ArchetypeProfile = ArchetypeProfile {
    cost: 50,
    spawn_frames: 120,
    hp: 80,
    damage: 0,
    range: 0,
    min_range: 0,
    speed_centi: 120,
    attack_cooldown: 0,
    population: 1,
    kill_reward: MELEE_KILL_REWARD,
};

const SWORDSMAN: ArchetypeProfile = ArchetypeProfile {
    cost: 100,
    spawn_frames: 150,
    hp: 220,
    damage: 18,
    range: 28,
    min_range: 0,
    speed_centi: 100,
    attack_cooldown: 50,
    population: 1,
    kill_reward: MELEE_KILL_REWARD,
};

const ARCHER: ArchetypeProfile = ArchetypeProfile {
    cost: 125,
    spawn_frames: 180,
    hp: 140,
    damage: 14,
    range: 220,
    min_range: 60,
    speed_centi: 90,
    attack_cooldown: 70,
    population: 1,
    kill_reward: ARCHER_KILL_REWARD,
};

const PALADIN: ArchetypeProfile = ArchetypeProfile {
    cost: 200,
    spawn_frames: 270,
    hp: 520,
    damage: 26,
    range: 30,
    min_range: 0,
    speed_centi: 70,
    attack_cooldown: 80,
    population: 1,
    kill_reward: MELEE_KILL_REWARD,
};

const HERO: ArchetypeProfile = ArchetypeProfile {
    cost: 500,
    spawn_frames: 420,
    hp: 900,
    damage: 55,
    range: 36,
    min_range: 0,
    speed_centi: 110,
    attack_cooldown: 45,
    population: 3,
    kill_reward: HERO_KILL_REWARD,
};

impl Archetype {
    /// All archetypes in display order.
    pub const ALL: [Self; 5] = [
        Self::Miner,
        Self::Swordsman,
        Self::Archer,
        Self::Paladin,
        Self::Hero,
    ];

    /// Combat archetypes (everything except the miner).
    pub const COMBAT: [Self; 4] = [Self::Swordsman, Self::Archer, Self::Paladin, Self::Hero];

    /// Base profile for this archetype.
    #[must_use]
    pub const fn profile(self) -> &'static ArchetypeProfile {
        match self {
            Self::Miner => &MINER,
            Self::Swordsman => &SWORDSMAN,
            Self::Archer => &ARCHER,
            Self::Paladin => &PALADIN,
            Self::Hero => &HERO,
        }
    }

    /// Gold cost.
    #[must_use]
    pub const fn cost(self) -> u32 {
        self.profile().cost
    }

    /// Population slots used.
    #[must_use]
    pub const fn population(self) -> u32 {
        self.profile().population
    }

    /// Whether this is the economy unit.
    #[must_use]
    pub const fn is_miner(self) -> bool {
        matches!(self, Self::Miner)
    }

    /// Whether this archetype attacks with projectiles.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(self, Self::Archer)
    }

    /// Whether this is the elite archetype whose speed scales with upgrades.
    #[must_use]
    pub const fn is_elite(self) -> bool {
        matches!(self, Self::Hero)
    }

    /// Lowercase name for logs and serialized reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Miner => "miner",
            Self::Swordsman => "swordsman",
            Self::Archer => "archer",
            Self::Paladin => "paladin",
            Self::Hero => "hero",
        }
    }

    /// Parse a lowercase archetype name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
