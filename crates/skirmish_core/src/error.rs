//! Error types for the skirmish simulation.
//!
//! Only genuinely exceptional paths surface as [`GameError`]: loading
//! configuration, (de)serializing state and decoding remote payloads.
//! Ordinary gameplay rejections (not enough gold, ability on cooldown, tower
//! cap reached) are reported through [`Rejection`] instead and never abort a
//! tick.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the simulation core.
#[derive(Debug, Error)]
pub enum GameError {
    /// Failed to read a configuration or replay file.
    #[error("Failed to read '{path}': {message}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying error message.
        message: String,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or `<inline>`) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Configuration values are inconsistent.
    #[error("Invalid match configuration: {0}")]
    InvalidConfig(String),

    /// State (de)serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A remote action could not be decoded.
    #[error("Invalid remote action: {0}")]
    InvalidRemoteAction(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

/// Why a command had no effect.
///
/// These are expected input races (clicking an ability a frame before its
/// cooldown clears) and are silent from the simulation's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rejection {
    /// The match is not running (not started, paused or finished).
    NotRunning,
    /// Not enough gold for the purchase.
    InsufficientGold,
    /// The population cap would be exceeded.
    PopulationCap,
    /// The ability is still cooling down.
    OnCooldown,
    /// The target position is beyond the caster's fog-of-war boundary.
    OutOfSight,
    /// The target position lies outside the lane.
    OutOfBounds,
    /// The tower cap has been reached.
    TowerCap,
    /// Nothing matched the request (e.g. dismissing an empty queue).
    NothingToDo,
    /// The command is unavailable in this match mode.
    Unavailable,
    /// A directive needs a rally point first.
    NoRallyPoint,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRunning => write!(f, "match is not running"),
            Self::InsufficientGold => write!(f, "insufficient gold"),
            Self::PopulationCap => write!(f, "population cap reached"),
            Self::OnCooldown => write!(f, "ability on cooldown"),
            Self::OutOfSight => write!(f, "target beyond fog of war"),
            Self::OutOfBounds => write!(f, "target outside the lane"),
            Self::TowerCap => write!(f, "tower cap reached"),
            Self::NothingToDo => write!(f, "nothing to do"),
            Self::Unavailable => write!(f, "unavailable in this match mode"),
            Self::NoRallyPoint => write!(f, "no rally point set"),
        }
    }
}

/// Outcome of a command issued through the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "ignoring an outcome is fine, but be explicit with `let _ =`"]
pub enum CommandOutcome {
    /// The command changed the simulation.
    Applied,
    /// The command was a no-op.
    Rejected(Rejection),
}

impl CommandOutcome {
    /// Whether the command took effect.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }

    /// The rejection reason, if any.
    #[must_use]
    pub const fn rejection(self) -> Option<Rejection> {
        match self {
            Self::Applied => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

impl From<Rejection> for CommandOutcome {
    fn from(reason: Rejection) -> Self {
        Self::Rejected(reason)
    }
}
