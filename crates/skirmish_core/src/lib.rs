//! # Skirmish Core
//!
//! Deterministic simulation core for a two-faction lane skirmish.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No audio
//! - No system randomness (a seeded [`random::RandomSource`] is injected)
//! - No floating-point gameplay math (lane positions are fixed-point)
//!
//! This separation enables:
//! - Headless bot-vs-bot balance runs
//! - Peer-synchronized matches driven by replicated actions
//! - Save/resume and determinism testing
//!
//! ## Crate Structure
//!
//! - [`engine`] - Match lifecycle, tick order and command surface
//! - [`world`] - The complete state of one match
//! - [`units`] - Unit state machines, targeting and movement
//! - [`abilities`] - Barrage, chain strike and freeze
//! - [`production`] - Per-faction build queues
//! - [`defense`] - Bases and towers
//! - [`ai`] - Opposing-side AI
//! - [`bridge`] - Remote action replication
//! - [`math`] - Fixed-point helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod ai;
pub mod archetypes;
pub mod bridge;
pub mod combat;
pub mod command;
pub mod components;
pub mod config;
pub mod defense;
pub mod economy;
pub mod engine;
pub mod error;
pub mod factions;
pub mod hazards;
pub mod hooks;
pub mod math;
pub mod orders;
pub mod production;
pub mod projectiles;
pub mod random;
pub mod registry;
pub mod snapshot;
pub mod units;
pub mod upgrades;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::abilities::AbilityKind;
    pub use crate::ai::OpposingAi;
    pub use crate::archetypes::Archetype;
    pub use crate::bridge::{ActionKind, BridgeOutcome, RemoteAction};
    pub use crate::command::Command;
    pub use crate::components::{ProjectileKind, TargetRef, Unit, UnitId, UnitState};
    pub use crate::config::MatchConfig;
    pub use crate::engine::{GameEngine, MatchMode};
    pub use crate::error::{CommandOutcome, GameError, Rejection};
    pub use crate::factions::{Faction, PerFaction};
    pub use crate::hooks::{EngineHooks, HookEvent, NoopHooks, RecordingHooks};
    pub use crate::math::{fx, Fixed};
    pub use crate::orders::Strategy;
    pub use crate::random::{RandomSource, SeededRandom};
    pub use crate::snapshot::MatchSnapshot;
    pub use crate::upgrades::{PermanentUpgrades, UpgradeKind};
    pub use crate::world::{MatchPhase, World};
}
