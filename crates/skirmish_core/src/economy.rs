//! Gold and income.
//!
//! Each faction has a [`Treasury`]. Gold comes from miners, kill rewards
//! and a passive trickle; it is spent on units, towers and session
//! upgrades. All amounts are whole gold pieces.

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::upgrades::UpgradeKind;

/// A faction's gold balance and lifetime totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Treasury {
    gold: u32,
    earned: u64,
    spent: u64,
}

impl Treasury {
    /// Create a treasury holding `gold`.
    #[must_use]
    pub const fn new(gold: u32) -> Self {
        Self {
            gold,
            earned: 0,
            spent: 0,
        }
    }

    /// Current balance.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Total gold ever credited (excluding the starting balance and refunds).
    #[must_use]
    pub const fn earned(&self) -> u64 {
        self.earned
    }

    /// Total gold ever spent, net of refunds.
    #[must_use]
    pub const fn spent(&self) -> u64 {
        self.spent
    }

    /// Whether the balance covers `amount`.
    #[must_use]
    pub const fn can_afford(&self, amount: u32) -> bool {
        self.gold >= amount
    }

    /// Add income.
    pub fn credit(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
        self.earned += u64::from(amount);
    }

    /// Spend `amount` if affordable. Returns whether the debit happened.
    pub fn try_spend(&mut self, amount: u32) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        self.gold -= amount;
        self.spent += u64::from(amount);
        true
    }

    /// Spend `amount` without a balance check, flooring at zero.
    ///
    /// Used for a faction whose authoritative balance lives elsewhere.
    pub fn spend_saturating(&mut self, amount: u32) {
        self.gold = self.gold.saturating_sub(amount);
        self.spent += u64::from(amount);
    }

    /// Give back a previous spend in full.
    pub fn refund(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
        self.spent = self.spent.saturating_sub(u64::from(amount));
    }
}

/// Gold paid every passive-income interval.
#[must_use]
pub fn passive_income(config: &MatchConfig, passive_gold_level: u32) -> u32 {
    config
        .passive_gold_base
        .saturating_add(config.passive_gold_per_level.saturating_mul(passive_gold_level))
}

/// Price of the next level of a session-only upgrade.
///
/// Returns `None` for kinds that cannot be bought mid-match.
#[must_use]
pub fn session_upgrade_cost(kind: UpgradeKind, current_level: u32) -> Option<u32> {
    let (base, step) = match kind {
        UpgradeKind::PopulationCap => (150u32, 100u32),
        UpgradeKind::PassiveGold => (200, 150),
        _ => return None,
    };
    Some(base.saturating_add(step.saturating_mul(current_level)))
}

/// Population cap given the population-cap level.
#[must_use]
pub fn population_cap(config: &MatchConfig, level: u32) -> u32 {
    config
        .population_cap
        .saturating_add(config.population_per_level.saturating_mul(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_and_refund_restore_balance() {
        let mut treasury = Treasury::new(200);
        assert!(treasury.try_spend(100));
        assert_eq!(treasury.gold(), 100);
        assert!(!treasury.try_spend(200));
        assert_eq!(treasury.gold(), 100);

        treasury.refund(100);
        assert_eq!(treasury.gold(), 200);
        assert_eq!(treasury.spent(), 0);
    }

    #[test]
    fn test_saturating_spend_floors_at_zero() {
        let mut treasury = Treasury::new(30);
        treasury.spend_saturating(50);
        assert_eq!(treasury.gold(), 0);
        assert_eq!(treasury.spent(), 50);
    }

    #[test]
    fn test_credit_tracks_earnings() {
        let mut treasury = Treasury::new(0);
        treasury.credit(12);
        treasury.credit(20);
        assert_eq!(treasury.gold(), 32);
        assert_eq!(treasury.earned(), 32);
    }

    #[test]
    fn test_passive_income_and_cap() {
        let config = MatchConfig::default();
        assert_eq!(passive_income(&config, 0), 2);
        assert_eq!(passive_income(&config, 3), 5);
        assert_eq!(population_cap(&config, 0), 20);
        assert_eq!(population_cap(&config, 2), 30);
    }

    #[test]
    fn test_session_upgrade_costs() {
        assert_eq!(session_upgrade_cost(UpgradeKind::PopulationCap, 0), Some(150));
        assert_eq!(session_upgrade_cost(UpgradeKind::PopulationCap, 2), Some(350));
        assert_eq!(session_upgrade_cost(UpgradeKind::PassiveGold, 1), Some(350));
        assert_eq!(session_upgrade_cost(UpgradeKind::BaseHp, 0), None);
    }
}
