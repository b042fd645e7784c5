//! Upgrade levels per faction.
//!
//! Levels are a sparse table keyed by [`UpgradeKind`]. Two kinds,
//! population cap and passive gold, only live for the current match and
//! must never reach long-term storage; [`UpgradeState::permanent`] is the
//! only form meant to be persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::archetypes::Archetype;

/// Something that can be upgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// Base structure hit points.
    BaseHp,
    /// Damage and hit points of one archetype.
    UnitDamage(Archetype),
    /// Tower damage.
    TowerPower,
    /// Faster production.
    SpawnSpeed,
    /// Barrage damage and duration.
    BarragePower,
    /// Chain strike damage.
    ChainPower,
    /// Freeze zone width and duration.
    FreezePower,
    /// Miner movement speed and gold per trip.
    MinerSpeed,
    /// Extra population slots (session only).
    PopulationCap,
    /// Extra passive income (session only).
    PassiveGold,
}

impl UpgradeKind {
    /// Whether this level only lasts for the current match.
    #[must_use]
    pub const fn is_session_only(self) -> bool {
        matches!(self, Self::PopulationCap | Self::PassiveGold)
    }
}

/// Upgrade levels that survive across matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermanentUpgrades {
    levels: BTreeMap<UpgradeKind, u32>,
}

impl PermanentUpgrades {
    /// Level for a kind (0 if never bought).
    #[must_use]
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.levels.get(&kind).copied().unwrap_or(0)
    }

    /// Set a permanent level. Session-only kinds are ignored.
    pub fn set(&mut self, kind: UpgradeKind, level: u32) {
        if kind.is_session_only() {
            tracing::warn!(?kind, "Refusing to store a session-only upgrade permanently");
            return;
        }
        if level == 0 {
            self.levels.remove(&kind);
        } else {
            self.levels.insert(kind, level);
        }
    }

    /// Iterate stored levels in key order.
    pub fn iter(&self) -> impl Iterator<Item = (UpgradeKind, u32)> + '_ {
        self.levels.iter().map(|(k, v)| (*k, *v))
    }

    /// Serialize to RON for a profile store.
    pub fn to_ron(&self) -> crate::error::Result<String> {
        ron::to_string(self).map_err(|e| crate::error::GameError::Serialization(e.to_string()))
    }

    /// Parse from RON, dropping any session-only entries that slipped in.
    pub fn from_ron(source: &str) -> crate::error::Result<Self> {
        let mut parsed: Self =
            ron::from_str(source).map_err(|e| crate::error::GameError::DataParseError {
                path: "<inline>".into(),
                message: e.to_string(),
            })?;
        parsed.levels.retain(|kind, _| !kind.is_session_only());
        Ok(parsed)
    }
}

/// All upgrade levels of one faction for the current match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpgradeState {
    levels: BTreeMap<UpgradeKind, u32>,
}

impl UpgradeState {
    /// Start a match from a faction's permanent levels.
    #[must_use]
    pub fn from_permanent(permanent: &PermanentUpgrades) -> Self {
        Self {
            levels: permanent.levels.clone(),
        }
    }

    /// Level for a kind (0 if never bought).
    #[must_use]
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.levels.get(&kind).copied().unwrap_or(0)
    }

    /// Set a level; returns the previous one.
    pub fn set(&mut self, kind: UpgradeKind, level: u32) -> u32 {
        let previous = self.level(kind);
        if level == 0 {
            self.levels.remove(&kind);
        } else {
            self.levels.insert(kind, level);
        }
        previous
    }

    /// The level that feeds `calculate_stats` for an archetype.
    ///
    /// Miners never fight, so their stat level is the miner-speed upgrade.
    #[must_use]
    pub fn unit_level(&self, archetype: Archetype) -> u32 {
        if archetype.is_miner() {
            self.level(UpgradeKind::MinerSpeed)
        } else {
            self.level(UpgradeKind::UnitDamage(archetype))
        }
    }

    /// The persistable subset of these levels.
    #[must_use]
    pub fn permanent(&self) -> PermanentUpgrades {
        PermanentUpgrades {
            levels: self
                .levels
                .iter()
                .filter(|(kind, _)| !kind.is_session_only())
                .map(|(k, v)| (*k, *v))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_levels_default_to_zero() {
        let state = UpgradeState::default();
        assert_eq!(state.level(UpgradeKind::TowerPower), 0);
        assert_eq!(state.unit_level(Archetype::Archer), 0);
    }

    #[test]
    fn test_session_levels_never_persist() {
        let mut state = UpgradeState::default();
        state.set(UpgradeKind::BaseHp, 4);
        state.set(UpgradeKind::PopulationCap, 3);
        state.set(UpgradeKind::PassiveGold, 2);

        let permanent = state.permanent();
        assert_eq!(permanent.level(UpgradeKind::BaseHp), 4);
        assert_eq!(permanent.level(UpgradeKind::PopulationCap), 0);
        assert_eq!(permanent.level(UpgradeKind::PassiveGold), 0);

        let ron = permanent.to_ron().unwrap();
        assert!(!ron.contains("PopulationCap"));
        assert!(!ron.contains("PassiveGold"));
    }

    #[test]
    fn test_permanent_set_ignores_session_kinds() {
        let mut permanent = PermanentUpgrades::default();
        permanent.set(UpgradeKind::PassiveGold, 5);
        assert_eq!(permanent.iter().count(), 0);
    }

    #[test]
    fn test_from_ron_strips_session_kinds() {
        let source = "(levels: {BaseHp: 2, PassiveGold: 9, UnitDamage(Archer): 3})";
        let permanent = PermanentUpgrades::from_ron(source).unwrap();
        assert_eq!(permanent.level(UpgradeKind::BaseHp), 2);
        assert_eq!(permanent.level(UpgradeKind::UnitDamage(Archetype::Archer)), 3);
        assert_eq!(permanent.level(UpgradeKind::PassiveGold), 0);
    }

    #[test]
    fn test_miner_stat_level_is_miner_speed() {
        let mut state = UpgradeState::default();
        state.set(UpgradeKind::MinerSpeed, 7);
        state.set(UpgradeKind::UnitDamage(Archetype::Swordsman), 2);
        assert_eq!(state.unit_level(Archetype::Miner), 7);
        assert_eq!(state.unit_level(Archetype::Swordsman), 2);
    }
}
