//! Replaying a recorded log of remote actions.
//!
//! The log is JSON lines of [`RemoteAction`]s as a peer would send them.
//! Actions are applied to a fresh peer-synchronized engine in file order;
//! the engine is advanced to each action's timestamp first.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_core::bridge::parse_json_lines;
use skirmish_core::prelude::*;
use thiserror::Error;

/// Error type for action log replays.
#[derive(Error, Debug)]
pub enum ReplayLogError {
    /// The log file could not be read.
    #[error("Failed to read action log '{path}': {source}")]
    Read {
        /// Log path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The engine could not be created.
    #[error("Failed to set up match: {0}")]
    Setup(#[from] GameError),
}

/// Tally of a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Non-blank lines read.
    pub lines: u32,
    /// Actions that took effect.
    pub applied: u32,
    /// Actions the command surface refused.
    pub rejected: u32,
    /// Actions that came from the local peer.
    pub dropped_echo: u32,
    /// Actions older than one already accepted from their origin.
    pub dropped_stale: u32,
    /// Actions whose payload did not fit their kind.
    pub dropped_invalid: u32,
    /// Lines that were not valid actions.
    pub malformed: u32,
    /// Frame the engine reached.
    pub frames: u64,
    /// Engine state hash at the end.
    pub final_state_hash: u64,
}

impl ReplayReport {
    /// Actions dropped by the bridge.
    #[must_use]
    pub const fn dropped(&self) -> u32 {
        self.dropped_echo + self.dropped_stale + self.dropped_invalid
    }

    fn record(&mut self, outcome: &BridgeOutcome) {
        match outcome {
            BridgeOutcome::Applied => self.applied += 1,
            BridgeOutcome::Rejected(_) => self.rejected += 1,
            BridgeOutcome::DroppedEcho => self.dropped_echo += 1,
            BridgeOutcome::DroppedStale => self.dropped_stale += 1,
            BridgeOutcome::DroppedInvalid(_) => self.dropped_invalid += 1,
        }
    }
}

/// Replay a JSON-lines action log as the peer `local_id`.
///
/// The engine never advances past `max_frames`, whatever the timestamps
/// say.
pub fn replay_actions(
    config: MatchConfig,
    local_id: &str,
    source: &str,
    max_frames: u64,
) -> Result<ReplayReport, ReplayLogError> {
    let mode = MatchMode::PeerSynced {
        local_id: local_id.to_string(),
    };
    let mut engine = GameEngine::new(config, mode, Box::new(NoopHooks))?;
    let _ = engine.start();

    let mut report = ReplayReport::default();
    for (line, parsed) in parse_json_lines(source) {
        report.lines += 1;
        let action = match parsed {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!(line, error = %e, "Skipping malformed action line");
                report.malformed += 1;
                continue;
            }
        };
        let until = action.timestamp.min(max_frames);
        while engine.frame() < until && !engine.phase().is_terminal() {
            engine.update();
        }
        let outcome = engine.apply_remote_action(&action);
        tracing::debug!(line, kind = ?action.kind, ?outcome, "Replayed action");
        report.record(&outcome);
    }

    report.frames = engine.frame();
    report.final_state_hash = engine.state_hash();
    tracing::info!(
        lines = report.lines,
        applied = report.applied,
        rejected = report.rejected,
        dropped = report.dropped(),
        malformed = report.malformed,
        "Replay finished"
    );
    Ok(report)
}

/// Replay an action log file.
pub fn replay_file(
    config: MatchConfig,
    local_id: &str,
    path: &Path,
    max_frames: u64,
) -> Result<ReplayReport, ReplayLogError> {
    let source = std::fs::read_to_string(path).map_err(|source| ReplayLogError::Read {
        path: path.display().to_string(),
        source,
    })?;
    replay_actions(config, local_id, &source, max_frames)
}
