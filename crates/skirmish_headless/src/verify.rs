//! Determinism verification for headless matches.

use serde::{Deserialize, Serialize};

use crate::runner::{run_match, RunConfig, RunnerError};

/// Outcome of running one seed several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Seed under test.
    pub seed: u64,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// Frames simulated by each run.
    pub frames: Vec<u64>,
    /// Whether every run ended identically.
    pub is_deterministic: bool,
}

/// Run the match described by `config` `runs` times and compare results.
pub fn verify_seed(config: &RunConfig, runs: u32) -> Result<VerifyReport, RunnerError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    let mut frames = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let result = run_match(config.clone())?;
        tracing::debug!(run, hash = result.final_state_hash, frames = result.frames, "Verification run");
        hashes.push(result.final_state_hash);
        frames.push(result.frames);
    }
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]) && frames.windows(2).all(|w| w[0] == w[1]);
    if !is_deterministic {
        tracing::warn!(seed = config.match_config.seed, ?hashes, "Runs diverged");
    }
    Ok(VerifyReport {
        seed: config.match_config.seed,
        hashes,
        frames,
        is_deterministic,
    })
}
