//! Read-only views of a match for hosts.
//!
//! A [`MatchSnapshot`] copies everything a UI needs out of the world. It
//! carries plain integers only, so it serializes to compact JSON for the
//! headless runner's output stream.

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityKind;
use crate::archetypes::Archetype;
use crate::components::{ParticleKind, ProjectileKind, UnitId, UnitState};
use crate::factions::Faction;
use crate::math::Fixed;
use crate::orders::Strategy;
use crate::world::{MatchPhase, World};

/// A queued order and its progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueView {
    /// Archetype in production.
    pub archetype: Archetype,
    /// Completion in percent.
    pub progress: u32,
}

/// Cooldown, active frames and effect length of one ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityView {
    /// Which ability.
    pub ability: AbilityKind,
    /// Frames until ready.
    pub cooldown: u32,
    /// Frames left in the current effect.
    pub active: u32,
    /// Length of the current effect.
    pub max_duration: u32,
}

/// Everything one faction's HUD shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionView {
    /// Faction described.
    pub faction: Faction,
    /// Current gold.
    pub gold: u32,
    /// Living units per archetype.
    pub population: Vec<(Archetype, u32)>,
    /// Population slots used.
    pub population_used: u32,
    /// Population cap.
    pub population_cap: u32,
    /// Production queue, head first.
    pub queue: Vec<QueueView>,
    /// Ability timers.
    pub abilities: Vec<AbilityView>,
    /// Army strategy.
    pub strategy: Strategy,
    /// Whether a rally point is set.
    pub has_rally_point: bool,
    /// Whether a patrol is set.
    pub has_patrol_point: bool,
    /// Whether a vanguard point is set.
    pub has_vanguard_point: bool,
    /// Vanguard share in percent.
    pub vanguard_percent: u32,
    /// Base hit points.
    pub base_hp: u32,
    /// Base maximum hit points.
    pub base_max_hp: u32,
    /// Towers built.
    pub towers: u32,
}

/// A unit as drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit id.
    pub id: UnitId,
    /// Owning faction.
    pub faction: Faction,
    /// Archetype.
    pub archetype: Archetype,
    /// Lane position, rounded.
    pub x: i32,
    /// Visual vertical offset.
    pub y_offset: i32,
    /// State machine state.
    pub state: UnitState,
    /// Hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Animation counter.
    pub anim_frame: u32,
    /// Whether the unit shows the chill tint.
    pub frozen: bool,
    /// Whether the unit is a vanguard.
    pub is_vanguard: bool,
}

/// A projectile as drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileView {
    /// Kind tag.
    pub kind: ProjectileKind,
    /// Firing faction.
    pub faction: Faction,
    /// Lane position, rounded.
    pub x: i32,
    /// Height, rounded.
    pub y: i32,
}

/// A hazard as drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardView {
    /// Owning faction.
    pub faction: Faction,
    /// Center, rounded.
    pub x: i32,
    /// Half-width, rounded.
    pub half_width: i32,
    /// Frames left.
    pub remaining: u32,
}

/// A particle as drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleView {
    /// Kind tag.
    pub kind: ParticleKind,
    /// Lane position, rounded.
    pub x: i32,
    /// Height, rounded.
    pub y: i32,
    /// Frames left.
    pub life: u32,
}

/// A full picture of the match at one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Frames simulated.
    pub frame: u64,
    /// Match clock in seconds.
    pub elapsed_seconds: u64,
    /// The match has left [`MatchPhase::NotStarted`].
    pub started: bool,
    /// The match is paused.
    pub paused: bool,
    /// The local side won.
    pub victory: bool,
    /// The local side lost.
    pub defeat: bool,
    /// Screen shake magnitude, rounded.
    pub shake: i32,
    /// Local side.
    pub player: FactionView,
    /// Opposing side.
    pub opponent: FactionView,
    /// Every unit still on the lane.
    pub units: Vec<UnitView>,
    /// Projectiles in flight.
    pub projectiles: Vec<ProjectileView>,
    /// Active hazards.
    pub hazards: Vec<HazardView>,
    /// Cosmetic particles.
    pub particles: Vec<ParticleView>,
}

fn round(x: Fixed) -> i32 {
    x.round().to_num()
}

impl MatchSnapshot {
    /// Capture the current state of `world`.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        let tick_rate = u64::from(world.config.tick_rate.max(1));
        Self {
            frame: world.frame,
            elapsed_seconds: world.frame / tick_rate,
            started: world.phase != MatchPhase::NotStarted,
            paused: world.phase == MatchPhase::Paused,
            victory: world.phase == MatchPhase::Victory,
            defeat: world.phase == MatchPhase::Defeat,
            shake: round(world.shake),
            player: faction_view(world, Faction::Player),
            opponent: faction_view(world, Faction::Opponent),
            units: world
                .registry
                .units()
                .iter()
                .map(|u| UnitView {
                    id: u.id,
                    faction: u.faction,
                    archetype: u.archetype,
                    x: round(u.x),
                    y_offset: u.y_offset,
                    state: u.state,
                    hp: u.stats.hp,
                    max_hp: u.stats.max_hp,
                    anim_frame: u.anim_frame,
                    frozen: u.freeze_timer > 0,
                    is_vanguard: u.is_vanguard,
                })
                .collect(),
            projectiles: world
                .registry
                .projectiles()
                .iter()
                .map(|p| ProjectileView {
                    kind: p.kind,
                    faction: p.faction,
                    x: round(p.x),
                    y: round(p.y),
                })
                .collect(),
            hazards: world
                .registry
                .hazards()
                .iter()
                .map(|h| HazardView {
                    faction: h.faction,
                    x: round(h.x),
                    half_width: round(h.half_width),
                    remaining: h.remaining,
                })
                .collect(),
            particles: world
                .registry
                .particles()
                .iter()
                .map(|p| ParticleView {
                    kind: p.kind,
                    x: round(p.x),
                    y: round(p.y),
                    life: p.life,
                })
                .collect(),
        }
    }

    /// View of one faction.
    #[must_use]
    pub const fn faction(&self, faction: Faction) -> &FactionView {
        match faction {
            Faction::Player => &self.player,
            Faction::Opponent => &self.opponent,
        }
    }
}

fn faction_view(world: &World, faction: Faction) -> FactionView {
    let orders = &world.orders[faction];
    let structure = &world.structures[faction];
    let timers = &world.abilities.timers[faction];
    FactionView {
        faction,
        gold: world.treasuries[faction].gold(),
        population: world.registry.population_counts(faction),
        population_used: world.registry.population_used(faction),
        population_cap: world.population_cap(faction),
        queue: world
            .registry
            .queue(faction)
            .iter()
            .map(|item| QueueView {
                archetype: item.archetype,
                progress: item.percentage(),
            })
            .collect(),
        abilities: AbilityKind::ALL
            .into_iter()
            .map(|ability| {
                let timer = timers.get(ability);
                AbilityView {
                    ability,
                    cooldown: timer.cooldown,
                    active: timer.active,
                    max_duration: timer.max_duration,
                }
            })
            .collect(),
        strategy: orders.strategy,
        has_rally_point: orders.rally_point.is_some(),
        has_patrol_point: orders.patrol_point.is_some(),
        has_vanguard_point: orders.vanguard_point.is_some(),
        vanguard_percent: orders.vanguard_percent(),
        base_hp: structure.hp,
        base_max_hp: structure.max_hp,
        towers: structure.tower_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::math::fx;
    use crate::production::queue_unit;

    #[test]
    fn test_capture_reflects_world() {
        let mut world = World::new(MatchConfig::default());
        world.phase = MatchPhase::Running;
        world.frame = 125;
        let _ = queue_unit(&mut world, Faction::Player, Archetype::Miner);
        world.spawn_unit(Faction::Opponent, Archetype::Archer, fx(2500), 0);
        world.orders[Faction::Player].set_rally_point(fx(600));

        let snapshot = MatchSnapshot::capture(&world);
        assert_eq!(snapshot.frame, 125);
        assert_eq!(snapshot.elapsed_seconds, 2);
        assert!(snapshot.started && !snapshot.paused);
        assert_eq!(snapshot.player.gold, 150);
        assert_eq!(snapshot.player.queue.len(), 1);
        assert_eq!(snapshot.player.queue[0].progress, 0);
        assert_eq!(snapshot.player.population_used, 1);
        assert!(snapshot.player.has_rally_point);
        assert_eq!(snapshot.player.strategy, Strategy::Defend);
        assert!(snapshot
            .faction(Faction::Opponent)
            .population
            .contains(&(Archetype::Archer, 1)));
        assert_eq!(snapshot.units.len(), 1);
        assert_eq!(snapshot.units[0].x, 2500);
        assert_eq!(snapshot.player.abilities.len(), 3);
        assert_eq!(snapshot.player.base_max_hp, 2000);
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let world = World::new(MatchConfig::default());
        let json = serde_json::to_string(&MatchSnapshot::capture(&world)).unwrap();
        let back: MatchSnapshot = serde_json::from_str(&json).unwrap();
        assert!(!back.started);
        assert_eq!(back.opponent.base_hp, 2000);
    }
}
