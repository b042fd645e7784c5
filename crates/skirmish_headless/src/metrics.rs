//! Match metrics collection for balance analysis.
//!
//! A [`MetricsRecorder`] rides along as the engine's hooks and tallies what
//! each side produced, lost and cast. The runner folds the world's own
//! running totals in at the end of the match.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use skirmish_core::prelude::*;

/// How a headless match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// The opposing base fell.
    PlayerWon,
    /// The player base fell.
    OpponentWon,
    /// Neither base fell before the frame limit.
    TimedOut,
}

impl MatchOutcome {
    /// Outcome for a finished engine phase. Anything but a terminal phase
    /// counts as a timeout.
    #[must_use]
    pub const fn from_phase(phase: MatchPhase) -> Self {
        match phase {
            MatchPhase::Victory => Self::PlayerWon,
            MatchPhase::Defeat => Self::OpponentWon,
            _ => Self::TimedOut,
        }
    }

    /// Winning faction, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Faction> {
        match self {
            Self::PlayerWon => Some(Faction::Player),
            Self::OpponentWon => Some(Faction::Opponent),
            Self::TimedOut => None,
        }
    }
}

/// Metrics for one side of a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionMetrics {
    /// AI rating that drove this side.
    pub elo: u32,
    /// Units produced by archetype name.
    pub units_produced: BTreeMap<String, u32>,
    /// Units lost by archetype name.
    pub units_lost: BTreeMap<String, u32>,
    /// Enemy units killed.
    pub kills: u32,
    /// Abilities cast by name.
    pub abilities_cast: BTreeMap<String, u32>,
    /// Tower shots fired.
    pub tower_shots: u32,
    /// Damage this side's base took.
    pub base_damage_taken: u64,
    /// Gold brought home by miners.
    pub gold_mined: u64,
    /// Gold left at the end.
    pub final_gold: u32,
    /// Base health left at the end.
    pub final_base_hp: u32,
    /// Towers standing at the end.
    pub towers: u32,
    /// Most living units at any sampled frame.
    pub peak_army_size: u32,
}

impl FactionMetrics {
    /// Total units produced.
    #[must_use]
    pub fn total_produced(&self) -> u32 {
        self.units_produced.values().sum()
    }

    /// Total units lost.
    #[must_use]
    pub fn total_lost(&self) -> u32 {
        self.units_lost.values().sum()
    }

    /// Kills per loss. A side that lost nothing reports its kill count.
    #[must_use]
    pub fn kd_ratio(&self) -> f64 {
        let lost = self.total_lost();
        if lost == 0 {
            f64::from(self.kills)
        } else {
            f64::from(self.kills) / f64::from(lost)
        }
    }
}

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMetrics {
    /// Player-side metrics.
    pub player: FactionMetrics,
    /// Opponent-side metrics.
    pub opponent: FactionMetrics,
}

impl MatchMetrics {
    /// Metrics for one faction.
    #[must_use]
    pub const fn faction(&self, faction: Faction) -> &FactionMetrics {
        match faction {
            Faction::Player => &self.player,
            Faction::Opponent => &self.opponent,
        }
    }

    /// Metrics for one faction, mutably.
    pub fn faction_mut(&mut self, faction: Faction) -> &mut FactionMetrics {
        match faction {
            Faction::Player => &mut self.player,
            Faction::Opponent => &mut self.opponent,
        }
    }

    /// Sample the world for peak army sizes.
    pub fn sample(&mut self, world: &World) {
        for faction in Faction::ALL {
            let army = world.registry.living_units(faction).count() as u32;
            let metrics = self.faction_mut(faction);
            metrics.peak_army_size = metrics.peak_army_size.max(army);
        }
    }

    /// Fold in the world's end-of-match totals.
    pub fn finalize(&mut self, world: &World) {
        self.sample(world);
        for faction in Faction::ALL {
            let stats = world.stats[faction];
            let structure = &world.structures[faction];
            let metrics = self.faction_mut(faction);
            metrics.kills = stats.kills;
            metrics.gold_mined = stats.gold_mined;
            metrics.final_gold = world.treasuries[faction].gold();
            metrics.final_base_hp = structure.hp;
            metrics.towers = structure.tower_count();
        }
    }
}

/// Engine hooks that tally events into shared [`MatchMetrics`].
///
/// Clone the recorder before handing it to the engine; all clones share
/// one tally.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder {
    inner: Arc<Mutex<MatchMetrics>>,
}

impl MetricsRecorder {
    /// Recorder with both sides' ratings filled in.
    #[must_use]
    pub fn new(player_elo: u32, opponent_elo: u32) -> Self {
        let mut metrics = MatchMetrics::default();
        metrics.player.elo = player_elo;
        metrics.opponent.elo = opponent_elo;
        Self {
            inner: Arc::new(Mutex::new(metrics)),
        }
    }

    /// Copy of the current tally.
    #[must_use]
    pub fn metrics(&self) -> MatchMetrics {
        self.inner.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub(crate) fn with(&self, f: impl FnOnce(&mut MatchMetrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            f(&mut metrics);
        }
    }
}

impl EngineHooks for MetricsRecorder {
    fn on_unit_spawned(&mut self, unit: &Unit) {
        self.with(|m| {
            *m.faction_mut(unit.faction)
                .units_produced
                .entry(unit.archetype.name().to_string())
                .or_default() += 1;
        });
    }

    fn on_unit_killed(&mut self, victim: &Unit, _killer: Faction) {
        self.with(|m| {
            *m.faction_mut(victim.faction)
                .units_lost
                .entry(victim.archetype.name().to_string())
                .or_default() += 1;
        });
    }

    fn on_ability_cast(&mut self, faction: Faction, ability: AbilityKind, _x: Fixed) {
        self.with(|m| {
            *m.faction_mut(faction)
                .abilities_cast
                .entry(ability.name().to_string())
                .or_default() += 1;
        });
    }

    fn on_tower_fired(&mut self, faction: Faction, _target: UnitId) {
        self.with(|m| m.faction_mut(faction).tower_shots += 1);
    }

    fn on_base_hit(&mut self, faction: Faction, damage: u32) {
        self.with(|m| m.faction_mut(faction).base_damage_taken += u64::from(damage));
    }
}

/// Summary statistics across a batch of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_games: u32,
    /// Matches won by each faction.
    pub wins_by_faction: BTreeMap<String, u32>,
    /// Win rates by faction (0.0 to 1.0).
    pub win_rates: BTreeMap<String, f64>,
    /// Matches that hit the frame limit.
    pub timeouts: u32,
    /// Average match length in frames.
    pub avg_duration_frames: f64,
    /// Shortest match.
    pub min_duration_frames: u64,
    /// Longest match.
    pub max_duration_frames: u64,
    /// Average units produced per match by faction.
    pub avg_units_produced: BTreeMap<String, f64>,
    /// Average kill/death ratio by faction.
    pub avg_kd_ratio: BTreeMap<String, f64>,
}

impl BatchSummary {
    /// Calculate the summary of a list of match results.
    #[must_use]
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = (MatchOutcome, u64, &'a MatchMetrics)>) -> Self {
        let mut summary = Self {
            min_duration_frames: u64::MAX,
            ..Self::default()
        };
        let mut duration_sum = 0u64;
        let mut produced: BTreeMap<String, u64> = BTreeMap::new();
        let mut kd: BTreeMap<String, f64> = BTreeMap::new();

        for (outcome, frames, metrics) in matches {
            summary.total_games += 1;
            duration_sum += frames;
            summary.min_duration_frames = summary.min_duration_frames.min(frames);
            summary.max_duration_frames = summary.max_duration_frames.max(frames);

            match outcome.winner() {
                Some(winner) => *summary.wins_by_faction.entry(winner.to_string()).or_default() += 1,
                None => summary.timeouts += 1,
            }
            for faction in Faction::ALL {
                let side = metrics.faction(faction);
                *produced.entry(faction.to_string()).or_default() += u64::from(side.total_produced());
                *kd.entry(faction.to_string()).or_default() += side.kd_ratio();
            }
        }

        if summary.total_games == 0 {
            return Self::default();
        }
        let games = f64::from(summary.total_games);
        summary.avg_duration_frames = duration_sum as f64 / games;
        for faction in Faction::ALL {
            let name = faction.to_string();
            let wins = summary.wins_by_faction.get(&name).copied().unwrap_or(0);
            summary.win_rates.insert(name.clone(), f64::from(wins) / games);
        }
        summary.avg_units_produced = produced.into_iter().map(|(k, v)| (k, v as f64 / games)).collect();
        summary.avg_kd_ratio = kd.into_iter().map(|(k, v)| (k, v / games)).collect();
        summary
    }

    /// Whether the two sides' win rates are within `tolerance` of each
    /// other.
    #[must_use]
    pub fn is_balanced(&self, tolerance: f64) -> bool {
        let rate = |f: Faction| self.win_rates.get(f.short_name()).copied().unwrap_or(0.0);
        (rate(Faction::Player) - rate(Faction::Opponent)).abs() <= tolerance
    }
}
