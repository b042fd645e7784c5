//! Opposing-side AI.
//!
//! [`OpposingAi`] looks at the world every decision interval and answers
//! with ordinary [`Command`]s. It never touches the world directly, so the
//! same AI can drive either faction (the headless runner pits two of them
//! against each other).
//!
//! Strength is a single elo value. Higher elo decides more often, keeps
//! more miners, attacks at smaller advantages and unlocks the hero.

use serde::{Deserialize, Serialize};

use crate::abilities::{is_visible, AbilityKind};
use crate::archetypes::Archetype;
use crate::command::Command;
use crate::defense::next_tower_cost;
use crate::factions::Faction;
use crate::math::{fx, lane_distance, Fixed};
use crate::orders::Strategy;
use crate::random::RandomSource;
use crate::world::World;

/// Slowest decision cadence in frames.
pub const MAX_DECISION_INTERVAL: u32 = 240;
/// Fastest decision cadence in frames.
pub const MIN_DECISION_INTERVAL: u32 = 60;
/// Own base HP share below which the AI may retreat.
pub const RETREAT_BASE_PERCENT: u32 = 35;
/// Enemy units this close to the base trigger a defense.
pub const DEFENSE_RADIUS: i32 = 700;
/// Army size that attacks regardless of relative strength.
pub const ATTACK_ARMY_SIZE: usize = 12;
/// Units that make a cluster worth an ability.
pub const CLUSTER_MIN_UNITS: usize = 3;
/// Radius of an ability cluster.
pub const CLUSTER_RADIUS: i32 = 100;
/// Gold kept spare when buying towers.
pub const TOWER_GOLD_RESERVE: u32 = 100;
/// Elo above which heroes are produced.
pub const HERO_ELO: u32 = 1400;
/// Most units the AI keeps waiting in its queue.
const MAX_QUEUED: usize = 3;
/// Chance in percent of picking a random affordable unit instead of the best.
const VARIETY_PERCENT: u32 = 25;

/// A computer opponent for one faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpposingAi {
    /// Faction driven by this AI.
    pub faction: Faction,
    /// Strength rating.
    pub elo: u32,
    /// Frame of the next decision.
    pub next_decision_frame: u64,
    /// Last posture commanded.
    pub posture: Strategy,
}

impl OpposingAi {
    /// Create an AI for `faction`.
    #[must_use]
    pub fn new(faction: Faction, elo: u32) -> Self {
        Self {
            faction,
            elo,
            next_decision_frame: 0,
            posture: Strategy::Attack,
        }
    }

    /// Frames between decisions: `clamp(240 - elo / 10, 60, 240)`.
    #[must_use]
    pub fn decision_interval(&self) -> u32 {
        MAX_DECISION_INTERVAL
            .saturating_sub(self.elo / 10)
            .clamp(MIN_DECISION_INTERVAL, MAX_DECISION_INTERVAL)
    }

    /// Miners the AI wants alive: `2 + elo / 600`, at most 5.
    #[must_use]
    pub fn miner_target(&self) -> usize {
        (2 + self.elo / 600).min(5) as usize
    }

    /// Army power ratio (percent) needed to attack; falls with elo.
    #[must_use]
    pub fn attack_threshold_percent(&self) -> u32 {
        150u32.saturating_sub(self.elo / 20).clamp(80, 150)
    }

    /// Archetypes the AI builds, cheapest first.
    #[must_use]
    pub fn unit_mix(&self) -> Vec<Archetype> {
        let mut mix = vec![Archetype::Swordsman, Archetype::Archer];
        if self.elo >= 800 {
            mix.push(Archetype::Paladin);
        }
        if self.elo > HERO_ELO {
            mix.push(Archetype::Hero);
        }
        mix
    }

    /// Decide what to do this frame. Returns no commands between decisions.
    pub fn think(&mut self, world: &World, random: &mut dyn RandomSource) -> Vec<Command> {
        if world.frame < self.next_decision_frame {
            return Vec::new();
        }
        self.next_decision_frame = world.frame + u64::from(self.decision_interval());

        let mut commands = Vec::new();
        let mut budget = world.treasuries[self.faction].gold();

        let posture = self.choose_posture(world);
        if posture != self.posture || world.orders[self.faction].strategy != posture {
            tracing::debug!(faction = %self.faction, ?posture, elo = self.elo, "AI posture change");
            self.posture = posture;
            commands.push(Command::SetStrategy(posture));
        }

        if let Some(command) = self.tower_purchase(world, budget) {
            budget = budget.saturating_sub(next_tower_cost(world, self.faction));
            commands.push(command);
        }

        if let Some((command, cost)) = self.production(world, budget, random) {
            budget = budget.saturating_sub(cost);
            commands.push(command);
        }
        tracing::trace!(faction = %self.faction, budget, "AI budget after purchases");

        if let Some(command) = self.ability(world) {
            commands.push(command);
        }
        commands
    }

    fn choose_posture(&self, world: &World) -> Strategy {
        let own = army_power(world, self.faction);
        let enemy = army_power(world, self.faction.opponent());
        let base = &world.structures[self.faction];
        let base_percent = base.hp * 100 / base.max_hp.max(1);

        if base_percent < RETREAT_BASE_PERCENT && enemy > own {
            return Strategy::Retreat;
        }
        if enemies_near_base(world, self.faction, DEFENSE_RADIUS) > 0 {
            return Strategy::Defend;
        }
        let army = combat_units(world, self.faction);
        let strong_enough =
            own.saturating_mul(100) >= enemy.saturating_mul(u64::from(self.attack_threshold_percent()));
        if army > 0 && (strong_enough || army >= ATTACK_ARMY_SIZE) {
            return Strategy::Attack;
        }
        Strategy::Mass
    }

    fn tower_purchase(&self, world: &World, budget: u32) -> Option<Command> {
        let structure = &world.structures[self.faction];
        if structure.tower_count() >= world.config.towers.max_towers {
            return None;
        }
        let threatened = enemies_near_base(world, self.faction, DEFENSE_RADIUS) > 0;
        let cost = next_tower_cost(world, self.faction);
        (threatened && budget > cost + TOWER_GOLD_RESERVE).then_some(Command::BuyTower)
    }

    fn production(
        &self,
        world: &World,
        budget: u32,
        random: &mut dyn RandomSource,
    ) -> Option<(Command, u32)> {
        let queue = world.registry.queue(self.faction);
        if queue.len() >= MAX_QUEUED {
            return None;
        }
        let room = world
            .population_cap(self.faction)
            .saturating_sub(world.registry.population_used(self.faction));

        let miners = world
            .registry
            .living_units(self.faction)
            .filter(|u| u.archetype.is_miner())
            .count()
            + queue.iter().filter(|i| i.archetype.is_miner()).count();
        if miners < self.miner_target() && budget >= Archetype::Miner.cost() && room >= 1 {
            return Some((Command::QueueUnit(Archetype::Miner), Archetype::Miner.cost()));
        }

        let affordable: Vec<Archetype> = self
            .unit_mix()
            .into_iter()
            .filter(|a| a.cost() <= budget && a.population() <= room)
            .collect();
        let choice = if affordable.len() > 1 && random.chance_percent(VARIETY_PERCENT) {
            let index = random.range_inclusive(0, affordable.len() as i32 - 1) as usize;
            affordable.get(index).copied()
        } else {
            affordable.iter().copied().max_by_key(|a| a.cost())
        }?;
        Some((Command::QueueUnit(choice), choice.cost()))
    }

    fn ability(&self, world: &World) -> Option<Command> {
        let timers = &world.abilities.timers[self.faction];
        let ready: Vec<AbilityKind> = [AbilityKind::Freeze, AbilityKind::Barrage, AbilityKind::ChainStrike]
            .into_iter()
            .filter(|kind| timers.get(*kind).cooldown == 0)
            .collect();
        let ability = *ready.first()?;
        let x = densest_cluster(world, self.faction)?;
        Some(Command::CastAbility { ability, x })
    }
}

/// Combat strength of a faction: unit cost weighted by remaining health.
#[must_use]
pub fn army_power(world: &World, faction: Faction) -> u64 {
    world
        .registry
        .living_units(faction)
        .filter(|u| !u.archetype.is_miner())
        .map(|u| u64::from(u.archetype.cost()) * u64::from(u.stats.hp) / u64::from(u.stats.max_hp.max(1)))
        .sum()
}

fn combat_units(world: &World, faction: Faction) -> usize {
    world
        .registry
        .living_units(faction)
        .filter(|u| !u.archetype.is_miner())
        .count()
}

/// Living enemy units within `radius` of a faction's base.
#[must_use]
pub fn enemies_near_base(world: &World, faction: Faction, radius: i32) -> usize {
    let base = world.base_x(faction);
    world
        .registry
        .living_units(faction.opponent())
        .filter(|u| lane_distance(u.x, base) <= fx(radius))
        .count()
}

/// Center of the visible enemy cluster with the most units, if it holds at
/// least [`CLUSTER_MIN_UNITS`]. Ties go to the lowest unit id.
#[must_use]
pub fn densest_cluster(world: &World, faction: Faction) -> Option<Fixed> {
    let enemies: Vec<Fixed> = world
        .registry
        .living_units(faction.opponent())
        .filter(|u| is_visible(world, faction, u.x))
        .map(|u| u.x)
        .collect();
    let radius = fx(CLUSTER_RADIUS);

    let mut best: Option<(usize, Fixed)> = None;
    for &center in &enemies {
        let count = enemies
            .iter()
            .filter(|x| lane_distance(**x, center) <= radius)
            .count();
        if count >= CLUSTER_MIN_UNITS && best.map_or(true, |(most, _)| count > most) {
            best = Some((count, center));
        }
    }
    best.map(|(_, x)| x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::random::SeededRandom;
    use crate::world::MatchPhase;

    fn running_world() -> World {
        let mut world = World::new(MatchConfig::default());
        world.phase = MatchPhase::Running;
        world
    }

    #[test]
    fn test_decision_interval_scales_with_elo() {
        assert_eq!(OpposingAi::new(Faction::Opponent, 0).decision_interval(), 240);
        assert_eq!(OpposingAi::new(Faction::Opponent, 1200).decision_interval(), 120);
        assert_eq!(OpposingAi::new(Faction::Opponent, 5000).decision_interval(), 60);
    }

    #[test]
    fn test_miner_target_and_hero_unlock() {
        assert_eq!(OpposingAi::new(Faction::Opponent, 0).miner_target(), 2);
        assert_eq!(OpposingAi::new(Faction::Opponent, 1300).miner_target(), 4);
        assert_eq!(OpposingAi::new(Faction::Opponent, 9000).miner_target(), 5);
        assert!(!OpposingAi::new(Faction::Opponent, 1400).unit_mix().contains(&Archetype::Hero));
        assert!(OpposingAi::new(Faction::Opponent, 1401).unit_mix().contains(&Archetype::Hero));
    }

    #[test]
    fn test_thinks_only_on_decision_frames() {
        let world = running_world();
        let mut ai = OpposingAi::new(Faction::Opponent, 1200);
        let mut random = SeededRandom::from_seed(5);
        let first = ai.think(&world, &mut random);
        assert!(!first.is_empty());
        assert!(ai.think(&world, &mut random).is_empty());
        assert_eq!(ai.next_decision_frame, 120);
    }

    #[test]
    fn test_opening_queues_miner() {
        let world = running_world();
        let mut ai = OpposingAi::new(Faction::Opponent, 1200);
        let commands = ai.think(&world, &mut SeededRandom::from_seed(5));
        assert!(commands.contains(&Command::QueueUnit(Archetype::Miner)));
    }

    #[test]
    fn test_defends_when_enemies_near_base() {
        let mut world = running_world();
        world.spawn_unit(Faction::Player, Archetype::Swordsman, fx(2500), 0);
        let ai = OpposingAi::new(Faction::Opponent, 1200);
        assert_eq!(ai.choose_posture(&world), Strategy::Defend);
    }

    #[test]
    fn test_retreats_when_base_low_and_outmatched() {
        let mut world = running_world();
        world.structures[Faction::Opponent].hp = 500;
        world.spawn_unit(Faction::Player, Archetype::Paladin, fx(1000), 0);
        let ai = OpposingAi::new(Faction::Opponent, 1200);
        assert_eq!(ai.choose_posture(&world), Strategy::Retreat);
    }

    #[test]
    fn test_attacks_with_stronger_army() {
        let mut world = running_world();
        world.spawn_unit(Faction::Opponent, Archetype::Paladin, fx(2600), 0);
        let ai = OpposingAi::new(Faction::Opponent, 1200);
        assert_eq!(ai.choose_posture(&world), Strategy::Attack);
    }

    #[test]
    fn test_masses_without_army() {
        let world = running_world();
        let ai = OpposingAi::new(Faction::Opponent, 1200);
        assert_eq!(ai.choose_posture(&world), Strategy::Mass);
    }

    #[test]
    fn test_casts_on_visible_cluster() {
        let mut world = running_world();
        for x in [2100, 2150, 2190] {
            world.spawn_unit(Faction::Player, Archetype::Swordsman, fx(x), 0);
        }
        let ai = OpposingAi::new(Faction::Opponent, 1200);
        assert_eq!(densest_cluster(&world, Faction::Opponent), Some(fx(2100)));
        assert_eq!(
            ai.ability(&world),
            Some(Command::CastAbility {
                ability: AbilityKind::Freeze,
                x: fx(2100)
            })
        );
    }

    #[test]
    fn test_buys_tower_when_threatened_and_rich() {
        let mut world = running_world();
        world.treasuries[Faction::Opponent].credit(500);
        world.spawn_unit(Faction::Player, Archetype::Swordsman, fx(2500), 0);
        let ai = OpposingAi::new(Faction::Opponent, 1200);
        assert_eq!(ai.tower_purchase(&world, 700), Some(Command::BuyTower));
        assert_eq!(ai.tower_purchase(&world, 350), None);
    }
}
