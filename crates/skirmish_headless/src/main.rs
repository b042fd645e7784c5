//! Headless lane skirmish runner.
//!
//! # Usage
//!
//! ```bash
//! # One bot-vs-bot match, JSON lines on stdout
//! cargo run -p skirmish_headless -- run --seed 42 --player-elo 1200 --opponent-elo 900
//!
//! # Balance batch
//! cargo run -p skirmish_headless -- batch --count 1000 --output results/
//!
//! # Determinism check
//! cargo run -p skirmish_headless -- verify --seed 12345 --runs 5
//!
//! # Replay a recorded peer action log
//! cargo run -p skirmish_headless -- replay-log --file actions.jsonl --local-id alice
//! ```
//!
//! Output (stdout): JSON lines
//! Logs (stderr): human-readable, filtered by `RUST_LOG`

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_headless::{
    batch::{run_batch, BatchConfig},
    replay_log::replay_file,
    runner::{load_match_config, MatchRunner, RunConfig, RunEvent, DEFAULT_MAX_FRAMES},
    verify::verify_seed,
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless lane skirmish runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every subcommand that plays matches.
#[derive(Args)]
struct MatchArgs {
    /// RON match configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rating of the AI driving the player side (defaults to the opponent's)
    #[arg(long)]
    player_elo: Option<u32>,

    /// Rating of the opposing AI (overrides the config file)
    #[arg(long)]
    opponent_elo: Option<u32>,

    /// Stop a match after this many frames
    #[arg(long, default_value_t = DEFAULT_MAX_FRAMES)]
    max_frames: u64,
}

impl MatchArgs {
    fn run_config(&self, seed: Option<u64>) -> Result<RunConfig, skirmish_headless::runner::RunnerError> {
        let mut match_config = load_match_config(self.config.as_deref())?;
        if let Some(seed) = seed {
            match_config.seed = seed;
        }
        if let Some(elo) = self.opponent_elo {
            match_config.opponent_elo = elo;
        }
        let mut config = RunConfig::new(match_config).with_max_frames(self.max_frames);
        if let Some(elo) = self.player_elo {
            config.player_elo = elo;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one bot-vs-bot match
    Run {
        #[command(flatten)]
        args: MatchArgs,

        /// Random seed (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,

        /// Emit a snapshot every N frames (0 = result only)
        #[arg(long, default_value = "60")]
        every: u64,
    },

    /// Run a batch of matches over consecutive seeds
    Batch {
        #[command(flatten)]
        args: MatchArgs,

        /// Number of matches to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        #[command(flatten)]
        args: MatchArgs,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Replay a JSON-lines log of remote actions
    ReplayLog {
        /// Action log path
        #[arg(short, long)]
        file: PathBuf,

        /// RON match configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Id of the local peer; actions from it are echoes
        #[arg(long, default_value = "local")]
        local_id: String,

        /// Never advance past this frame
        #[arg(long, default_value_t = DEFAULT_MAX_FRAMES)]
        max_frames: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON lines
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run { args, seed, every } => cmd_run(&args, seed, every),
        Commands::Batch {
            args,
            count,
            parallel,
            seed,
            output,
        } => cmd_batch(&args, count, parallel, seed, &output),
        Commands::Verify { args, seed, runs } => cmd_verify(&args, seed, runs),
        Commands::ReplayLog {
            file,
            config,
            local_id,
            max_frames,
        } => cmd_replay_log(&file, config, &local_id, max_frames),
    };

    if let Err(message) = result {
        tracing::error!("{message}");
        std::process::exit(1);
    }
}

/// Run a single match, streaming snapshots
fn cmd_run(args: &MatchArgs, seed: Option<u64>, every: u64) -> Result<(), String> {
    let config = args
        .run_config(seed)
        .map_err(|e| e.to_string())?
        .with_snapshots_every(every);
    let runner = MatchRunner::new(config).map_err(|e| e.to_string())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;
    let result = runner.run_with(|snapshot| {
        if write_error.is_none() {
            if let Err(e) = write_line(&mut out, &RunEvent::Snapshot(snapshot)) {
                write_error = Some(e);
            }
        }
    });
    if let Some(e) = write_error {
        return Err(format!("Failed to write snapshot: {e}"));
    }
    write_line(&mut out, &RunEvent::Result(&result)).map_err(|e| format!("Failed to write result: {e}"))
}

/// Run a batch and save the results
fn cmd_batch(args: &MatchArgs, count: u32, parallel: u32, seed: u64, output: &Path) -> Result<(), String> {
    let run = args.run_config(None).map_err(|e| e.to_string())?;
    std::fs::create_dir_all(output)
        .map_err(|e| format!("Cannot create output directory '{}': {e}", output.display()))?;

    let results = run_batch(BatchConfig::new(run, count).with_seed(seed).with_parallel(parallel));

    let results_path = output.join("batch_results.json");
    results
        .save(&results_path)
        .map_err(|e| format!("Failed to save results: {e}"))?;

    let summary = &results.summary;
    let rate = |name: &str| summary.win_rates.get(name).copied().unwrap_or(0.0) * 100.0;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", summary.total_games);
    if !results.errors.is_empty() {
        eprintln!("Matches failed: {}", results.errors.len());
    }
    eprintln!("Player wins:    {:>5.1}%", rate("player"));
    eprintln!("Opponent wins:  {:>5.1}%", rate("opponent"));
    eprintln!("Timeouts:       {}", summary.timeouts);
    eprintln!("Avg length:     {:.0} frames", summary.avg_duration_frames);
    eprintln!("Results saved:  {}", results_path.display());

    if results.errors.is_empty() {
        Ok(())
    } else {
        Err(format!("{} matches failed", results.errors.len()))
    }
}

/// Verify a seed replays identically
fn cmd_verify(args: &MatchArgs, seed: u64, runs: u32) -> Result<(), String> {
    let config = args.run_config(Some(seed)).map_err(|e| e.to_string())?;
    let report = verify_seed(&config, runs).map_err(|e| e.to_string())?;

    let stdout = std::io::stdout();
    write_line(&mut stdout.lock(), &report).map_err(|e| format!("Failed to write report: {e}"))?;

    if report.is_deterministic {
        tracing::info!(seed, runs, "Determinism verified");
        Ok(())
    } else {
        Err(format!("Seed {seed} is non-deterministic: {:?}", report.hashes))
    }
}

/// Replay a remote action log
fn cmd_replay_log(file: &Path, config: Option<PathBuf>, local_id: &str, max_frames: u64) -> Result<(), String> {
    let match_config = load_match_config(config.as_deref()).map_err(|e| e.to_string())?;
    let report = replay_file(match_config, local_id, file, max_frames).map_err(|e| e.to_string())?;

    let stdout = std::io::stdout();
    write_line(&mut stdout.lock(), &report).map_err(|e| format!("Failed to write report: {e}"))
}

fn write_line<W: Write>(out: &mut W, value: &impl serde::Serialize) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)
}
