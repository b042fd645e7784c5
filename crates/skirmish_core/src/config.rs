//! Match configuration.
//!
//! Every tunable of a match lives in [`MatchConfig`]. Defaults are built in;
//! a RON file can override any subset of fields:
//!
//! ```
//! use skirmish_core::config::MatchConfig;
//!
//! let config = MatchConfig::from_ron_str("(starting_gold: 500, seed: 7)").unwrap();
//! assert_eq!(config.starting_gold, 500);
//! assert_eq!(config.base_hp, MatchConfig::default().base_hp);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Frames per second of the simulation clock.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// All tunables of a single match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Frames per simulated second.
    pub tick_rate: u32,
    /// Length of the lane in lane units.
    pub lane_length: i32,
    /// Player base coordinate.
    pub player_base_x: i32,
    /// Opponent base coordinate.
    pub opponent_base_x: i32,
    /// Distance from a base to its mine, toward the lane center.
    pub mine_offset: i32,
    /// Gold each faction starts with.
    pub starting_gold: u32,
    /// Base structure HP before upgrades.
    pub base_hp: u32,
    /// Population cap before upgrades.
    pub population_cap: u32,
    /// Extra population per population-cap level.
    pub population_per_level: u32,
    /// Frames between passive income payouts.
    pub passive_gold_interval: u32,
    /// Passive income per payout before upgrades.
    pub passive_gold_base: u32,
    /// Extra passive income per passive-gold level.
    pub passive_gold_per_level: u32,
    /// Frames spent gathering at the mine.
    pub mine_gather_frames: u32,
    /// Frames a dying unit lingers before removal.
    pub death_frames: u32,
    /// Tower settings.
    pub towers: TowerConfig,
    /// Ability settings.
    pub abilities: AbilityConfig,
    /// Fog-of-war settings.
    pub vision: VisionConfig,
    /// Frames between snapshot notifications to the host.
    pub snapshot_interval: u32,
    /// Seed for the random source.
    pub seed: u64,
    /// Strength of the opposing-side AI.
    pub opponent_elo: u32,
}

/// Tower tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerConfig {
    /// Maximum towers per faction.
    pub max_towers: u32,
    /// Price of the first tower.
    pub base_cost: u32,
    /// Price increase per tower already owned.
    pub cost_increment: u32,
    /// Reach of a tower measured from its base.
    pub range: i32,
    /// Damage per shot before upgrades.
    pub base_damage: u32,
    /// Frames between shots of one tower.
    pub cooldown_frames: u32,
}

/// Ability tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    /// Barrage cooldown in frames.
    pub barrage_cooldown: u32,
    /// Chain strike cooldown in frames.
    pub chain_cooldown: u32,
    /// Freeze cooldown in frames.
    pub freeze_cooldown: u32,
}

/// Fog-of-war tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// How far past its own base a faction always sees.
    pub base_vision: i32,
    /// How far past each living unit a faction sees.
    pub unit_vision: i32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            lane_length: 3000,
            player_base_x: 100,
            opponent_base_x: 2900,
            mine_offset: 250,
            starting_gold: 200,
            base_hp: 2000,
            population_cap: 20,
            population_per_level: 5,
            passive_gold_interval: 60,
            passive_gold_base: 2,
            passive_gold_per_level: 1,
            mine_gather_frames: 90,
            death_frames: 40,
            towers: TowerConfig::default(),
            abilities: AbilityConfig::default(),
            vision: VisionConfig::default(),
            snapshot_interval: 6,
            seed: 0x5EED,
            opponent_elo: 1200,
        }
    }
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            max_towers: 5,
            base_cost: 300,
            cost_increment: 150,
            range: 400,
            base_damage: 25,
            cooldown_frames: 45,
        }
    }
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            barrage_cooldown: 900,
            chain_cooldown: 1200,
            freeze_cooldown: 1080,
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_vision: 900,
            unit_vision: 300,
        }
    }
}

impl MatchConfig {
    /// Parse a RON document; unspecified fields keep their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: "<inline>".into(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| GameError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Self = ron::from_str(&source).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded match config");
        Ok(config)
    }

    /// Reject configurations the simulation cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(GameError::InvalidConfig("tick_rate must be positive".into()));
        }
        if self.lane_length <= 0 {
            return Err(GameError::InvalidConfig("lane_length must be positive".into()));
        }
        let on_lane = |x: i32| (0..=self.lane_length).contains(&x);
        if !on_lane(self.player_base_x) || !on_lane(self.opponent_base_x) {
            return Err(GameError::InvalidConfig("bases must lie on the lane".into()));
        }
        if self.player_base_x >= self.opponent_base_x {
            return Err(GameError::InvalidConfig(
                "player base must be below the opponent base".into(),
            ));
        }
        if self.snapshot_interval == 0 || self.passive_gold_interval == 0 {
            return Err(GameError::InvalidConfig("intervals must be positive".into()));
        }
        if self.base_hp == 0 {
            return Err(GameError::InvalidConfig("base_hp must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let config =
            MatchConfig::from_ron_str("(towers: (max_towers: 3), opponent_elo: 1800)").unwrap();
        assert_eq!(config.towers.max_towers, 3);
        assert_eq!(config.towers.base_cost, 300);
        assert_eq!(config.opponent_elo, 1800);
    }

    #[test]
    fn test_rejects_inverted_bases() {
        let err = MatchConfig::from_ron_str("(player_base_x: 2950, opponent_base_x: 50)");
        assert!(matches!(err, Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_error_reported() {
        let err = MatchConfig::from_ron_str("(starting_gold: \"lots\")");
        assert!(matches!(err, Err(GameError::DataParseError { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.ron");
        std::fs::write(&path, "(seed: 99)").unwrap();
        let config = MatchConfig::load(&path).unwrap();
        assert_eq!(config.seed, 99);

        let missing = MatchConfig::load(dir.path().join("missing.ron"));
        assert!(matches!(missing, Err(GameError::Io { .. })));
    }
}
