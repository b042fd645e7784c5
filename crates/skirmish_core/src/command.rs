//! Commands accepted by the engine.
//!
//! Local input, the opposing-side AI and the remote bridge all speak this
//! one vocabulary and go through [`crate::engine::GameEngine::apply_command`].

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityKind;
use crate::archetypes::Archetype;
use crate::math::{fixed_serde, Fixed};
use crate::orders::Strategy;

/// A single player intention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Add a unit to the production queue.
    QueueUnit(Archetype),
    /// Remove the latest queued unit of an archetype and refund it.
    DismissUnit(Archetype),
    /// Buy a tower for the base.
    BuyTower,
    /// Cast an ability at a lane position.
    CastAbility {
        /// Which ability.
        ability: AbilityKind,
        /// Target lane position.
        #[serde(with = "fixed_serde")]
        x: Fixed,
    },
    /// Set the rally point.
    SetRallyPoint(#[serde(with = "fixed_serde")] Fixed),
    /// Set the patrol point.
    SetPatrolPoint(#[serde(with = "fixed_serde")] Fixed),
    /// Clear the rally point.
    ClearRallyPoint,
    /// Stop patrolling.
    CancelPatrol,
    /// Set the vanguard's forward point.
    SetVanguardPoint(#[serde(with = "fixed_serde")] Fixed),
    /// Set the vanguard share in percent.
    SetVanguardPercentage(i32),
    /// Change army strategy.
    SetStrategy(Strategy),
}

impl Command {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::QueueUnit(_) => "queue_unit",
            Self::DismissUnit(_) => "dismiss_unit",
            Self::BuyTower => "buy_tower",
            Self::CastAbility { .. } => "cast_ability",
            Self::SetRallyPoint(_) => "set_rally_point",
            Self::SetPatrolPoint(_) => "set_patrol_point",
            Self::ClearRallyPoint => "clear_rally_point",
            Self::CancelPatrol => "cancel_patrol",
            Self::SetVanguardPoint(_) => "set_vanguard_point",
            Self::SetVanguardPercentage(_) => "set_vanguard_percentage",
            Self::SetStrategy(_) => "set_strategy",
        }
    }
}
