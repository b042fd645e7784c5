//! Batch match runner for balance testing.
//!
//! Runs many seeds in parallel using rayon. Every match owns its own
//! engine, so nothing is shared between threads except progress counters.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, MatchOutcome};
use crate::runner::{run_match, MatchResult, RunConfig};

/// Error type for batch result files.
#[derive(Error, Debug)]
pub enum BatchFileError {
    /// Failed to read or write the file.
    #[error("Failed to access batch results: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to encode or decode JSON.
    #[error("Failed to encode batch results: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches to run.
    pub game_count: u32,
    /// Maximum parallel matches (0 = rayon default).
    pub parallel_games: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Settings shared by every match. Its seed is replaced per match.
    pub run: RunConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            run: RunConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Batch of `game_count` matches with the given settings.
    pub fn new(run: RunConfig, game_count: u32) -> Self {
        Self {
            game_count,
            run,
            ..Default::default()
        }
    }

    /// Set seed start.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set parallelism.
    pub fn with_parallel(mut self, parallel: u32) -> Self {
        self.parallel_games = parallel;
        self
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual match results, in seed order.
    pub games: Vec<MatchResult>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Matches that could not be run.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), BatchFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> Result<Self, BatchFileError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// A match that failed to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index.
    pub game_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Live counters of a running batch, shared by the worker threads.
#[derive(Debug)]
pub struct BatchProgress {
    total: u32,
    started: Instant,
    player_wins: AtomicU32,
    opponent_wins: AtomicU32,
    timeouts: AtomicU32,
}

impl BatchProgress {
    /// Tracker for `total` matches.
    pub fn new(total: u32) -> Self {
        Self {
            total,
            started: Instant::now(),
            player_wins: AtomicU32::new(0),
            opponent_wins: AtomicU32::new(0),
            timeouts: AtomicU32::new(0),
        }
    }

    /// Count a finished match. Returns how many have finished, this one
    /// included.
    pub fn record(&self, outcome: MatchOutcome) -> u32 {
        let counter = match outcome {
            MatchOutcome::PlayerWon => &self.player_wins,
            MatchOutcome::OpponentWon => &self.opponent_wins,
            MatchOutcome::TimedOut => &self.timeouts,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.finished()
    }

    /// Matches finished so far.
    pub fn finished(&self) -> u32 {
        self.player_wins.load(Ordering::Relaxed)
            + self.opponent_wins.load(Ordering::Relaxed)
            + self.timeouts.load(Ordering::Relaxed)
    }

    /// Share of the batch finished, in percent.
    pub fn percentage(&self) -> f64 {
        f64::from(self.finished()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Share of finished matches the player side won.
    pub fn player_win_rate(&self) -> f64 {
        let finished = self.finished();
        if finished == 0 {
            return 0.0;
        }
        f64::from(self.player_wins.load(Ordering::Relaxed)) / f64::from(finished)
    }

    /// Log progress.
    pub fn report(&self) {
        info!(
            finished = self.finished(),
            total = self.total,
            percent = format!("{:.1}", self.percentage()),
            player_win_rate = format!("{:.3}", self.player_win_rate()),
            timeouts = self.timeouts.load(Ordering::Relaxed),
            elapsed_secs = self.started.elapsed().as_secs(),
            "Batch progress"
        );
    }
}

/// Run a batch of matches.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let progress = BatchProgress::new(config.game_count);

    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        player_elo = config.run.player_elo,
        opponent_elo = config.run.match_config.opponent_elo,
        "Starting batch run"
    );

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // already initialised by an earlier batch
    }

    let results: Vec<Result<MatchResult, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            match run_match(config.run.clone().with_seed(seed)) {
                Ok(result) => {
                    let finished = progress.record(result.outcome);
                    debug!(game = i, seed, outcome = ?result.outcome, frames = result.frames, "Match finished");
                    if finished % 100 == 0 {
                        progress.report();
                    }
                    Ok(result)
                }
                Err(e) => {
                    warn!(game = i, seed, error = %e, "Match failed");
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let mut games = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(game) => games.push(game),
            Err(error) => errors.push(error),
        }
    }

    let summary = BatchSummary::from_matches(games.iter().map(|g| (g.outcome, g.frames, &g.metrics)));
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(f64::EPSILON)
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_run() -> RunConfig {
        RunConfig::default().with_max_frames(600)
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(quick_run(), 500).with_seed(12345).with_parallel(2);
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.parallel_games, 2);
    }

    #[test]
    fn test_progress_counts_outcomes() {
        let progress = BatchProgress::new(8);
        assert_eq!(progress.finished(), 0);
        assert!(progress.player_win_rate().abs() < f64::EPSILON);

        progress.record(MatchOutcome::PlayerWon);
        progress.record(MatchOutcome::OpponentWon);
        progress.record(MatchOutcome::PlayerWon);
        assert_eq!(progress.record(MatchOutcome::TimedOut), 4);

        assert!((progress.player_win_rate() - 0.5).abs() < 0.001);
        assert!((progress.percentage() - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(BatchConfig::new(quick_run(), 6).with_seed(40));

        assert_eq!(results.games.len(), 6);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 6);
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, (40..46).collect::<Vec<_>>());
    }

    #[test]
    fn test_batch_matches_single_runs() {
        let results = run_batch(BatchConfig::new(quick_run(), 3).with_seed(7));
        for game in &results.games {
            let single = run_match(quick_run().with_seed(game.seed)).unwrap();
            assert_eq!(&single, game);
        }
    }

    #[test]
    fn test_invalid_config_is_reported_per_match() {
        let mut run = quick_run();
        run.match_config.tick_rate = 0;
        let results = run_batch(BatchConfig::new(run, 2));
        assert!(results.games.is_empty());
        assert_eq!(results.errors.len(), 2);
        assert_eq!(results.summary.total_games, 0);
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(BatchConfig::new(quick_run(), 2));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config.game_count, 2);
    }
}
