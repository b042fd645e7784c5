//! Headless match runner for balance testing and CI verification.
//!
//! Runs lane skirmish matches without graphics:
//!
//! - **Bot-vs-bot runs**: both sides driven by the opposing AI, with
//!   JSON-lines snapshots on stdout
//! - **Balance batches**: many seeds in parallel, summarised as win rates
//! - **Determinism checks**: one seed run repeatedly, final hashes compared
//! - **Action log replay**: a recorded peer action stream fed through the
//!   remote bridge
//!
//! # Example
//!
//! ```bash
//! # One match, a snapshot every second of game time
//! cargo run -p skirmish_headless -- run --seed 7 --every 60
//!
//! # 200 seeds in parallel
//! cargo run -p skirmish_headless -- batch --count 200 --output results/
//!
//! # Determinism
//! cargo run -p skirmish_headless -- verify --seed 12345 --runs 5
//! ```

pub mod batch;
pub mod metrics;
pub mod replay_log;
pub mod runner;
pub mod verify;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, MatchMetrics, MatchOutcome, MetricsRecorder};
pub use replay_log::{replay_actions, replay_file, ReplayReport};
pub use runner::{run_match, MatchResult, MatchRunner, RunConfig};
pub use verify::{verify_seed, VerifyReport};
