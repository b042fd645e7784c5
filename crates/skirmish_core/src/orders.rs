//! Army-wide directives: strategy, rally, patrol and vanguard.

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::math::{fx, option_fixed_serde, Fixed};

/// Largest share of the army that can be sent forward as vanguard.
pub const MAX_VANGUARD_PERCENT: u32 = 50;
/// Vanguard share granularity.
pub const VANGUARD_STEP: u32 = 10;
/// Where an army musters without a rally point, measured from its base.
pub const DEFAULT_MUSTER_OFFSET: i32 = 300;

/// What a faction's combat units are told to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Push toward the enemy base.
    #[default]
    Attack,
    /// Hold at the rally point.
    Defend,
    /// Gather at the rally point before a push.
    Mass,
    /// Fall back to the home base.
    Retreat,
}

impl Strategy {
    /// Whether units hold a position instead of advancing.
    #[must_use]
    pub const fn holds_position(self) -> bool {
        matches!(self, Self::Defend | Self::Mass)
    }
}

/// Directives for one faction's army.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ArmyOrders {
    /// Current strategy.
    pub strategy: Strategy,
    /// Rally point.
    #[serde(with = "option_fixed_serde")]
    pub rally_point: Option<Fixed>,
    /// Second end of a patrol (heading B).
    #[serde(with = "option_fixed_serde")]
    pub patrol_point: Option<Fixed>,
    /// Forward point the vanguard pushes to.
    #[serde(with = "option_fixed_serde")]
    pub vanguard_point: Option<Fixed>,
    vanguard_percent: u32,
}

impl ArmyOrders {
    /// Set the rally point. Advancing armies switch to holding there.
    pub fn set_rally_point(&mut self, x: Fixed) {
        self.rally_point = Some(x);
        if self.strategy == Strategy::Attack {
            self.strategy = Strategy::Defend;
        }
    }

    /// Clear the rally point (and any patrol built on it); the army advances.
    pub fn clear_rally_point(&mut self) {
        self.rally_point = None;
        self.patrol_point = None;
        self.strategy = Strategy::Attack;
    }

    /// Set the patrol point. Returns `false` if there is no rally point to
    /// patrol from.
    pub fn set_patrol_point(&mut self, x: Fixed) -> bool {
        if self.rally_point.is_none() {
            return false;
        }
        self.patrol_point = Some(x);
        true
    }

    /// Stop patrolling. Returns `false` if no patrol was set.
    pub fn cancel_patrol(&mut self) -> bool {
        self.patrol_point.take().is_some()
    }

    /// Whether units oscillate between rally and patrol points.
    #[must_use]
    pub const fn is_patrolling(&self) -> bool {
        self.rally_point.is_some() && self.patrol_point.is_some()
    }

    /// Set the vanguard share, rounded to the nearest 10 and clamped to
    /// `0..=50`. Returns the stored value.
    pub fn set_vanguard_percent(&mut self, percent: i32) -> u32 {
        self.vanguard_percent = normalize_vanguard_percent(percent);
        self.vanguard_percent
    }

    /// Current vanguard share in percent.
    #[must_use]
    pub const fn vanguard_percent(&self) -> u32 {
        self.vanguard_percent
    }

    /// How many of `combat_units` belong to the vanguard.
    #[must_use]
    pub const fn vanguard_count(&self, combat_units: usize) -> usize {
        combat_units * self.vanguard_percent as usize / 100
    }

    /// Where a holding army stands: the rally point, or a muster point in
    /// front of its own base.
    #[must_use]
    pub fn hold_point(&self, faction: Faction, base_x: Fixed) -> Fixed {
        self.rally_point
            .unwrap_or_else(|| base_x + fx(DEFAULT_MUSTER_OFFSET * faction.direction()))
    }
}

/// Round a requested vanguard share to a legal value.
#[must_use]
pub fn normalize_vanguard_percent(percent: i32) -> u32 {
    let clamped = percent.clamp(0, MAX_VANGUARD_PERCENT as i32) as u32;
    ((clamped + VANGUARD_STEP / 2) / VANGUARD_STEP * VANGUARD_STEP).min(MAX_VANGUARD_PERCENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanguard_percent_rounds_and_clamps() {
        assert_eq!(normalize_vanguard_percent(-20), 0);
        assert_eq!(normalize_vanguard_percent(4), 0);
        assert_eq!(normalize_vanguard_percent(15), 20);
        assert_eq!(normalize_vanguard_percent(30), 30);
        assert_eq!(normalize_vanguard_percent(49), 50);
        assert_eq!(normalize_vanguard_percent(90), 50);
    }

    #[test]
    fn test_vanguard_count_floors() {
        let mut orders = ArmyOrders::default();
        orders.set_vanguard_percent(30);
        assert_eq!(orders.vanguard_count(7), 2);
        assert_eq!(orders.vanguard_count(10), 3);
        assert_eq!(orders.vanguard_count(0), 0);
    }

    #[test]
    fn test_patrol_requires_rally() {
        let mut orders = ArmyOrders::default();
        assert!(!orders.set_patrol_point(fx(800)));

        orders.set_rally_point(fx(500));
        assert_eq!(orders.strategy, Strategy::Defend);
        assert!(orders.set_patrol_point(fx(800)));
        assert!(orders.is_patrolling());

        assert!(orders.cancel_patrol());
        assert!(!orders.cancel_patrol());
    }

    #[test]
    fn test_clear_rally_resumes_attack() {
        let mut orders = ArmyOrders::default();
        orders.set_rally_point(fx(500));
        orders.set_patrol_point(fx(700));
        orders.clear_rally_point();
        assert_eq!(orders.strategy, Strategy::Attack);
        assert!(orders.patrol_point.is_none());
    }

    #[test]
    fn test_hold_point_defaults_in_front_of_base() {
        let orders = ArmyOrders::default();
        assert_eq!(orders.hold_point(Faction::Player, fx(100)), fx(400));
        assert_eq!(orders.hold_point(Faction::Opponent, fx(2900)), fx(2600));
    }
}
