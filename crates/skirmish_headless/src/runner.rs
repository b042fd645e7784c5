//! Bot-vs-bot match runner.
//!
//! The engine's own [`OpposingAi`] drives the opponent. A second AI instance
//! drives the player through the ordinary command surface, drawing from its
//! own seeded random stream so the engine's stream stays untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::prelude::*;
use thiserror::Error;

use crate::metrics::{MatchMetrics, MatchOutcome, MetricsRecorder};

/// Default match length: 10 minutes of game time at 60 frames per second.
pub const DEFAULT_MAX_FRAMES: u64 = 36_000;

/// Peak army sizes are sampled this often.
const SAMPLE_INTERVAL: u64 = 30;

/// Mixed into the match seed for the player-side AI's random stream.
const PLAYER_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Error type for runner setup.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The match configuration could not be loaded or was rejected.
    #[error("Failed to set up match: {0}")]
    Setup(#[from] GameError),
}

/// Load a RON match configuration, or the built-in defaults when no path is
/// given.
pub fn load_match_config(path: Option<&Path>) -> Result<MatchConfig, RunnerError> {
    match path {
        Some(path) => Ok(MatchConfig::load(path)?),
        None => Ok(MatchConfig::default()),
    }
}

/// Settings for one headless match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Engine configuration. Its `opponent_elo` rates the opposing AI.
    pub match_config: MatchConfig,
    /// Rating of the AI driving the player side.
    pub player_elo: u32,
    /// Stop after this many frames even if no base fell.
    pub max_frames: u64,
    /// Emit a snapshot every this many frames (0 = never).
    pub snapshot_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        let match_config = MatchConfig::default();
        Self {
            player_elo: match_config.opponent_elo,
            match_config,
            max_frames: DEFAULT_MAX_FRAMES,
            snapshot_every: 0,
        }
    }
}

impl RunConfig {
    /// Run settings around an engine configuration.
    #[must_use]
    pub fn new(match_config: MatchConfig) -> Self {
        Self {
            player_elo: match_config.opponent_elo,
            match_config,
            ..Self::default()
        }
    }

    /// Set the match seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.match_config.seed = seed;
        self
    }

    /// Set both sides' AI ratings.
    pub fn with_elos(mut self, player: u32, opponent: u32) -> Self {
        self.player_elo = player;
        self.match_config.opponent_elo = opponent;
        self
    }

    /// Set the frame limit.
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Set the snapshot interval.
    pub fn with_snapshots_every(mut self, frames: u64) -> Self {
        self.snapshot_every = frames;
        self
    }
}

/// Final result of a headless match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Seed the match ran with.
    pub seed: u64,
    /// Frames simulated.
    pub frames: u64,
    /// How it ended.
    pub outcome: MatchOutcome,
    /// Engine state hash at the end.
    pub final_state_hash: u64,
    /// Per-side metrics.
    pub metrics: MatchMetrics,
}

/// One line of `run` output.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent<'a> {
    /// Periodic state snapshot.
    Snapshot(&'a MatchSnapshot),
    /// The match is over.
    Result(&'a MatchResult),
}

/// A running bot-vs-bot match.
pub struct MatchRunner {
    engine: GameEngine,
    player_ai: OpposingAi,
    player_random: SeededRandom,
    recorder: MetricsRecorder,
    config: RunConfig,
}

impl MatchRunner {
    /// Create and start a match.
    pub fn new(config: RunConfig) -> Result<Self, RunnerError> {
        let recorder = MetricsRecorder::new(config.player_elo, config.match_config.opponent_elo);
        let mut engine = GameEngine::new(
            config.match_config.clone(),
            MatchMode::SinglePlayer,
            Box::new(recorder.clone()),
        )?;
        let _ = engine.start();
        let seed = config.match_config.seed;
        tracing::debug!(
            seed,
            player_elo = config.player_elo,
            opponent_elo = config.match_config.opponent_elo,
            max_frames = config.max_frames,
            "Headless match ready"
        );
        Ok(Self {
            engine,
            player_ai: OpposingAi::new(Faction::Player, config.player_elo),
            player_random: SeededRandom::from_seed(seed ^ PLAYER_SEED_SALT),
            recorder,
            config,
        })
    }

    /// The engine being driven.
    #[must_use]
    pub const fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// Whether a base fell or the frame limit was reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.engine.phase().is_terminal() || self.engine.frame() >= self.config.max_frames
    }

    /// Let the player AI act, then advance one frame.
    pub fn step(&mut self) {
        for command in self.player_ai.think(self.engine.world(), &mut self.player_random) {
            let _ = self.engine.apply_command(Faction::Player, command);
        }
        self.engine.update();
    }

    /// Run to completion, handing every periodic snapshot to `on_snapshot`.
    pub fn run_with(mut self, mut on_snapshot: impl FnMut(&MatchSnapshot)) -> MatchResult {
        let every = self.config.snapshot_every;
        while !self.is_finished() {
            self.step();
            let frame = self.engine.frame();
            if every > 0 && frame % every == 0 {
                on_snapshot(&self.engine.snapshot());
            }
            if frame % SAMPLE_INTERVAL == 0 {
                self.recorder.with(|m| m.sample(self.engine.world()));
            }
        }
        self.finish()
    }

    /// Run to completion without snapshots.
    pub fn run(self) -> MatchResult {
        self.run_with(|_| {})
    }

    fn finish(self) -> MatchResult {
        let mut metrics = self.recorder.metrics();
        metrics.finalize(self.engine.world());
        let result = MatchResult {
            seed: self.config.match_config.seed,
            frames: self.engine.frame(),
            outcome: MatchOutcome::from_phase(self.engine.phase()),
            final_state_hash: self.engine.state_hash(),
            metrics,
        };
        tracing::info!(
            seed = result.seed,
            frames = result.frames,
            outcome = ?result.outcome,
            hash = result.final_state_hash,
            "Headless match finished"
        );
        result
    }
}

/// Play one match to completion.
pub fn run_match(config: RunConfig) -> Result<MatchResult, RunnerError> {
    Ok(MatchRunner::new(config)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config(seed: u64) -> RunConfig {
        RunConfig::default().with_seed(seed).with_max_frames(1_200)
    }

    #[test]
    fn test_run_config_builder() {
        let config = RunConfig::default()
            .with_seed(7)
            .with_elos(1500, 800)
            .with_max_frames(100)
            .with_snapshots_every(10);
        assert_eq!(config.match_config.seed, 7);
        assert_eq!(config.player_elo, 1500);
        assert_eq!(config.match_config.opponent_elo, 800);
        assert_eq!(config.max_frames, 100);
        assert_eq!(config.snapshot_every, 10);
    }

    #[test]
    fn test_match_stops_at_frame_limit() {
        let result = run_match(short_config(1)).unwrap();
        assert!(result.frames <= 1_200);
        if result.outcome == MatchOutcome::TimedOut {
            assert_eq!(result.frames, 1_200);
        }
    }

    #[test]
    fn test_both_sides_produce_units() {
        let result = run_match(short_config(2)).unwrap();
        assert!(result.metrics.player.total_produced() > 0);
        assert!(result.metrics.opponent.total_produced() > 0);
        assert!(result.metrics.player.peak_army_size > 0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let a = run_match(short_config(3)).unwrap();
        let b = run_match(short_config(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshots_follow_interval() {
        let runner = MatchRunner::new(short_config(4).with_max_frames(300).with_snapshots_every(60)).unwrap();
        let mut frames = Vec::new();
        let result = runner.run_with(|snapshot| frames.push(snapshot.frame));
        assert_eq!(result.frames, 300);
        assert_eq!(frames, vec![60, 120, 180, 240, 300]);
    }

    #[test]
    fn test_run_event_tags() {
        let result = run_match(short_config(5).with_max_frames(10)).unwrap();
        let line = serde_json::to_string(&RunEvent::Result(&result)).unwrap();
        assert!(line.starts_with("{\"type\":\"result\""));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut config = RunConfig::default();
        config.match_config.lane_length = 0;
        assert!(matches!(MatchRunner::new(config), Err(RunnerError::Setup(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.ron");
        std::fs::write(&path, "(seed: 99, starting_gold: 500)").unwrap();
        let config = load_match_config(Some(&path)).unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.starting_gold, 500);
        assert!(load_match_config(Some(&dir.path().join("missing.ron"))).is_err());
    }
}
