//! The complete deterministic state of one match.
//!
//! [`World`] owns every entity and counter of a match. It is plain data:
//! it serializes with bincode, hashes for determinism checks, and holds no
//! hooks or random source. The subsystems in [`crate::units`],
//! [`crate::abilities`], [`crate::defense`] and [`crate::production`]
//! operate on it in a fixed order driven by [`crate::engine::GameEngine`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityEffects;
use crate::archetypes::Archetype;
use crate::combat::{calculate_stats, kill_reward, max_base_hp};
use crate::components::{Unit, UnitId, UnitState};
use crate::config::MatchConfig;
use crate::defense::Structure;
use crate::economy::{population_cap, Treasury};
use crate::factions::{Faction, PerFaction};
use crate::hooks::EngineHooks;
use crate::math::{fixed_serde, fx, ratio, Fixed};
use crate::orders::ArmyOrders;
use crate::registry::EntityRegistry;
use crate::upgrades::{UpgradeKind, UpgradeState};

/// Screen shake added per base hit.
pub const SHAKE_PER_HIT: i32 = 4;
/// Screen shake never exceeds this.
pub const MAX_SHAKE: i32 = 20;

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Waiting for `start()`.
    #[default]
    NotStarted,
    /// Simulating.
    Running,
    /// Halted by the player.
    Paused,
    /// The opposing base fell.
    Victory,
    /// The local base fell.
    Defeat,
}

impl MatchPhase {
    /// Whether ticks advance the simulation.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether the match is over.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }
}

/// Running totals for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MatchStats {
    /// Units produced.
    pub units_spawned: u32,
    /// Enemy units killed.
    pub kills: u32,
    /// Units lost.
    pub losses: u32,
    /// Gold brought home by miners.
    pub gold_mined: u64,
    /// Damage dealt to the enemy base.
    pub base_damage_dealt: u64,
}

/// Everything that makes up the state of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Tunables.
    pub config: MatchConfig,
    /// Frames simulated while running.
    pub frame: u64,
    /// Lifecycle phase.
    pub phase: MatchPhase,
    /// Entities.
    pub registry: EntityRegistry,
    /// Gold per faction.
    pub treasuries: PerFaction<Treasury>,
    /// Upgrade levels per faction.
    pub upgrades: PerFaction<UpgradeState>,
    /// Army directives per faction.
    pub orders: PerFaction<ArmyOrders>,
    /// Bases and towers.
    pub structures: PerFaction<Structure>,
    /// Ability timers and delayed effects.
    pub abilities: AbilityEffects,
    /// Per-faction totals.
    pub stats: PerFaction<MatchStats>,
    /// Screen shake magnitude, decaying each frame.
    #[serde(with = "fixed_serde")]
    pub shake: Fixed,
}

impl World {
    /// A fresh match that has not started.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        let base_hp = max_base_hp(config.base_hp, 0);
        let gold = config.starting_gold;
        Self {
            config,
            frame: 0,
            phase: MatchPhase::NotStarted,
            registry: EntityRegistry::new(),
            treasuries: PerFaction::from_fn(|_| Treasury::new(gold)),
            upgrades: PerFaction::default(),
            orders: PerFaction::default(),
            structures: PerFaction::from_fn(|_| Structure::new(base_hp)),
            abilities: AbilityEffects::default(),
            stats: PerFaction::default(),
            shake: Fixed::ZERO,
        }
    }

    /// Lane coordinate of a faction's base.
    #[must_use]
    pub fn base_x(&self, faction: Faction) -> Fixed {
        match faction {
            Faction::Player => fx(self.config.player_base_x),
            Faction::Opponent => fx(self.config.opponent_base_x),
        }
    }

    /// Lane coordinate of a faction's mine.
    #[must_use]
    pub fn mine_x(&self, faction: Faction) -> Fixed {
        self.base_x(faction) + fx(self.config.mine_offset * faction.direction())
    }

    /// Whether `x` lies on the lane.
    #[must_use]
    pub fn on_lane(&self, x: Fixed) -> bool {
        x >= Fixed::ZERO && x <= fx(self.config.lane_length)
    }

    /// Clamp `x` to the lane.
    #[must_use]
    pub fn clamp_to_lane(&self, x: Fixed) -> Fixed {
        x.clamp(Fixed::ZERO, fx(self.config.lane_length))
    }

    /// Mirror a coordinate to the other side of the lane.
    #[must_use]
    pub fn mirror_x(&self, x: Fixed) -> Fixed {
        fx(self.config.lane_length) - x
    }

    /// A faction's population cap.
    #[must_use]
    pub fn population_cap(&self, faction: Faction) -> u32 {
        population_cap(
            &self.config,
            self.upgrades[faction].level(UpgradeKind::PopulationCap),
        )
    }

    /// Charge a faction for a purchase.
    ///
    /// The local player must afford it. The opposing faction's balance is
    /// authoritative wherever that side is driven from, so here it is
    /// debited without a check.
    pub fn charge(&mut self, faction: Faction, amount: u32) -> bool {
        match faction {
            Faction::Player => self.treasuries[faction].try_spend(amount),
            Faction::Opponent => {
                self.treasuries[faction].spend_saturating(amount);
                true
            }
        }
    }

    /// Place a new unit on the lane with stats for `level`.
    pub fn spawn_unit(&mut self, faction: Faction, archetype: Archetype, x: Fixed, level: u32) -> UnitId {
        let unit = Unit::new(0, faction, archetype, x, calculate_stats(archetype, level));
        self.registry.insert_unit(unit)
    }

    /// Damage a unit on behalf of `killer`.
    ///
    /// A unit already dying takes nothing, so several sources landing in one
    /// tick can only kill it once. Entering the death sequence pays the kill
    /// reward and notifies hooks. Returns the damage dealt.
    pub fn damage_unit(
        &mut self,
        hooks: &mut dyn EngineHooks,
        id: UnitId,
        amount: u32,
        killer: Faction,
    ) -> u32 {
        let death_frames = self.config.death_frames;
        let Some(unit) = self.registry.unit_mut(id) else {
            return 0;
        };
        if unit.state.is_dying() {
            return 0;
        }
        let dealt = unit.stats.apply_damage(amount);
        if !unit.stats.is_depleted() {
            return dealt;
        }

        unit.state = UnitState::Die;
        unit.death_timer = death_frames.max(1);
        unit.target = None;
        unit.is_vanguard = false;
        let victim = unit.clone();

        let reward = kill_reward(victim.archetype);
        self.treasuries[killer].credit(reward);
        self.stats[killer].kills += 1;
        self.stats[victim.faction].losses += 1;
        hooks.on_unit_killed(&victim, killer);
        tracing::debug!(
            id = victim.id,
            archetype = victim.archetype.name(),
            faction = %victim.faction,
            reward,
            "Unit killed"
        );
        dealt
    }

    /// Damage a faction's base. Returns the damage dealt.
    pub fn damage_base(&mut self, hooks: &mut dyn EngineHooks, faction: Faction, amount: u32) -> u32 {
        let dealt = self.structures[faction].apply_damage(amount);
        if dealt == 0 {
            return 0;
        }
        self.stats[faction.opponent()].base_damage_dealt += u64::from(dealt);
        self.shake = (self.shake + fx(SHAKE_PER_HIT)).min(fx(MAX_SHAKE));
        hooks.on_base_hit(faction, dealt);
        tracing::trace!(%faction, dealt, hp = self.structures[faction].hp, "Base hit");
        dealt
    }

    /// Decay screen shake by 10%.
    pub fn decay_shake(&mut self) {
        self.shake *= ratio(9, 10);
        if self.shake < ratio(1, 100) {
            self.shake = Fixed::ZERO;
        }
    }

    /// Hash of the deterministic state.
    ///
    /// Two worlds fed the same seed and inputs hash equal on every frame.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.frame.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.registry.hash(&mut hasher);
        self.treasuries.hash(&mut hasher);
        self.upgrades.hash(&mut hasher);
        self.orders.hash(&mut hasher);
        self.structures.hash(&mut hasher);
        self.abilities.hash(&mut hasher);
        self.stats.hash(&mut hasher);
        self.shake.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}
