//! Pure combat math: stat scaling, damage multipliers and payouts.
//!
//! Nothing in here holds state. The same functions feed stat previews in the
//! UI and the stats of spawned units, so the two can never diverge.
//!
//! All scaling is integer percentage math:
//! - HP and damage: `100 + 5L` percent
//! - Archer cooldown: `max(20, 100 - 2L)` percent
//! - Miner speed: `+0.1 * L` flat
//! - Hero speed: `100 + 5L` percent

use serde::{Deserialize, Serialize};

use crate::archetypes::Archetype;
use crate::math::{fixed_serde, level_percent, ratio, scale_fixed_percent, scale_percent, Fixed};

/// Per-level HP/damage bonus in percent.
pub const STAT_PERCENT_PER_LEVEL: u32 = 5;
/// Per-level archer cooldown reduction in percent.
pub const ARCHER_COOLDOWN_PERCENT_PER_LEVEL: u32 = 2;
/// Archer cooldown never drops below this share of base.
pub const ARCHER_COOLDOWN_FLOOR_PERCENT: u32 = 20;
/// Damage share dealt by a slowed attacker.
pub const SLOWED_ATTACKER_PERCENT: u32 = 75;
/// Damage share dealt to a slowed ("shattering") target.
pub const SHATTER_PERCENT: u32 = 125;
/// Damage share dealt to a target inside the attacker's min range.
pub const POINT_BLANK_PERCENT: u32 = 50;

/// Effective combat stats of a unit after upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Current hit points, always within `0..=max_hp`.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Damage per attack.
    pub damage: u32,
    /// Weapon range.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Point-blank threshold.
    #[serde(with = "fixed_serde")]
    pub min_range: Fixed,
    /// Lane units per frame.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Frames between attacks.
    pub attack_cooldown: u32,
}

impl UnitStats {
    /// Apply damage, flooring HP at zero. Returns the damage actually dealt.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        dealt
    }

    /// Whether HP has run out.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.hp == 0
    }

    /// HP as a percentage of max (0-100).
    #[must_use]
    pub fn hp_percent(&self) -> u32 {
        if self.max_hp == 0 {
            0
        } else {
            self.hp * 100 / self.max_hp
        }
    }
}

/// Compute the stats of an archetype at an upgrade level.
#[must_use]
pub fn calculate_stats(archetype: Archetype, level: u32) -> UnitStats {
    let profile = archetype.profile();
    let multiplier = level_percent(level, STAT_PERCENT_PER_LEVEL);

    let max_hp = scale_percent(profile.hp, multiplier);
    let damage = scale_percent(profile.damage, multiplier);

    let attack_cooldown = if archetype == Archetype::Archer {
        let percent = 100u32
            .saturating_sub(ARCHER_COOLDOWN_PERCENT_PER_LEVEL.saturating_mul(level))
            .max(ARCHER_COOLDOWN_FLOOR_PERCENT);
        scale_percent(profile.attack_cooldown, percent)
    } else {
        profile.attack_cooldown
    };

    let base_speed = ratio(profile.speed_centi as i32, 100);
    let speed = if archetype.is_miner() {
        base_speed + ratio(level.min(i32::MAX as u32) as i32, 10)
    } else if archetype.is_elite() {
        scale_fixed_percent(base_speed, multiplier)
    } else {
        base_speed
    };

    UnitStats {
        hp: max_hp,
        max_hp,
        damage,
        range: Fixed::from_num(profile.range),
        min_range: Fixed::from_num(profile.min_range),
        speed,
        attack_cooldown,
    }
}

/// Gold credited to the faction that kills a unit of this archetype.
#[must_use]
pub const fn kill_reward(archetype: Archetype) -> u32 {
    archetype.profile().kill_reward
}

/// Slow/freeze damage modifier in percent.
///
/// A slowed attacker hits for 75%; a slowed target shatters for 125%.
/// Both apply multiplicatively.
#[must_use]
pub const fn shatter_percent(attacker_slowed: bool, target_slowed: bool) -> u32 {
    let attacker = if attacker_slowed {
        SLOWED_ATTACKER_PERCENT
    } else {
        100
    };
    let target = if target_slowed { SHATTER_PERCENT } else { 100 };
    attacker * target / 100
}

/// Point-blank modifier in percent for a target at `distance`.
#[must_use]
pub fn point_blank_percent(distance: Fixed, min_range: Fixed) -> u32 {
    if distance < min_range {
        POINT_BLANK_PERCENT
    } else {
        100
    }
}

/// Final damage of one attack.
#[must_use]
pub fn attack_damage(base: u32, attacker_slowed: bool, target_slowed: bool, point_blank: u32) -> u32 {
    let shattered = scale_percent(base, shatter_percent(attacker_slowed, target_slowed));
    scale_percent(shattered, point_blank)
}

/// Production time after spawn-speed upgrades: `base * max(30, 100 - 10L) / 100`.
#[must_use]
pub fn production_frames(base_frames: u32, spawn_speed_level: u32) -> u32 {
    let percent = 100u32
        .saturating_sub(10u32.saturating_mul(spawn_speed_level))
        .max(30);
    scale_percent(base_frames, percent).max(1)
}

/// Base structure max HP: `base * (100 + 5L) / 100`.
#[must_use]
pub fn max_base_hp(base_hp: u32, level: u32) -> u32 {
    scale_percent(base_hp, level_percent(level, 5))
}

/// Tower shot damage: `base * (100 + 10L) / 100`.
#[must_use]
pub fn tower_damage(base_damage: u32, level: u32) -> u32 {
    scale_percent(base_damage, level_percent(level, 10))
}

/// Price of the next tower given how many are owned.
#[must_use]
pub fn tower_cost(base_cost: u32, increment: u32, owned: u32) -> u32 {
    base_cost.saturating_add(increment.saturating_mul(owned))
}

/// Base barrage shell damage.
pub const BARRAGE_BASE_DAMAGE: u32 = 40;
/// Base barrage duration in frames.
pub const BARRAGE_BASE_DURATION: u32 = 180;
/// Base chain strike damage of the first hit.
pub const CHAIN_BASE_DAMAGE: u32 = 45;
/// Damage kept per chain jump in percent.
pub const CHAIN_DECAY_PERCENT: u32 = 80;
/// Base freeze zone width.
pub const FREEZE_BASE_WIDTH: u32 = 160;
/// Base freeze duration in frames.
pub const FREEZE_BASE_DURATION: u32 = 300;
/// Gold a miner brings back per trip before upgrades.
pub const MINER_BASE_YIELD: u32 = 12;

/// Barrage shell damage: `40 * (100 + 20L) / 100`.
#[must_use]
pub fn barrage_damage(level: u32) -> u32 {
    scale_percent(BARRAGE_BASE_DAMAGE, level_percent(level, 20))
}

/// Barrage duration: `180 * (100 + 10L) / 100` frames.
#[must_use]
pub fn barrage_duration(level: u32) -> u32 {
    scale_percent(BARRAGE_BASE_DURATION, level_percent(level, 10))
}

/// First chain strike hit: `45 * (100 + 20L) / 100`.
#[must_use]
pub fn chain_damage(level: u32) -> u32 {
    scale_percent(CHAIN_BASE_DAMAGE, level_percent(level, 20))
}

/// Damage of the next chain jump.
#[must_use]
pub fn chain_jump_damage(previous: u32) -> u32 {
    scale_percent(previous, CHAIN_DECAY_PERCENT)
}

/// Freeze zone width: `160 * (100 + 10L) / 100`.
#[must_use]
pub fn freeze_width(level: u32) -> u32 {
    scale_percent(FREEZE_BASE_WIDTH, level_percent(level, 10))
}

/// Freeze duration: `300 * (100 + 10L) / 100` frames.
#[must_use]
pub fn freeze_duration(level: u32) -> u32 {
    scale_percent(FREEZE_BASE_DURATION, level_percent(level, 10))
}

/// Gold per mining trip: `12 * (100 + 10L) / 100`.
#[must_use]
pub fn miner_yield(level: u32) -> u32 {
    scale_percent(MINER_BASE_YIELD, level_percent(level, 10))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::fx;

    #[test]
    fn test_level_zero_matches_profile() {
        for archetype in Archetype::ALL {
            let stats = calculate_stats(archetype, 0);
            let profile = archetype.profile();
            assert_eq!(stats.max_hp, profile.hp);
            assert_eq!(stats.hp, stats.max_hp);
            assert_eq!(stats.damage, profile.damage);
            assert_eq!(stats.attack_cooldown, profile.attack_cooldown);
        }
    }

    #[test]
    fn test_hp_scales_five_percent_per_level() {
        let stats = calculate_stats(Archetype::Swordsman, 10);
        assert_eq!(stats.max_hp, 330);
        assert_eq!(stats.damage, 27);
    }

    #[test]
    fn test_archer_cooldown_floor() {
        let base = calculate_stats(Archetype::Archer, 0).attack_cooldown;
        assert_eq!(calculate_stats(Archetype::Archer, 10).attack_cooldown, 56);
        assert_eq!(calculate_stats(Archetype::Archer, 50).attack_cooldown, base / 5);
        assert_eq!(calculate_stats(Archetype::Archer, 1000).attack_cooldown, base / 5);
    }

    #[test]
    fn test_miner_speed_flat_bonus() {
        let base = calculate_stats(Archetype::Miner, 0).speed;
        let upgraded = calculate_stats(Archetype::Miner, 5).speed;
        assert_eq!(upgraded - base, ratio(5, 10));
    }

    #[test]
    fn test_only_elite_speed_scales_with_multiplier() {
        assert!(calculate_stats(Archetype::Hero, 20).speed > calculate_stats(Archetype::Hero, 0).speed);
        assert_eq!(
            calculate_stats(Archetype::Paladin, 20).speed,
            calculate_stats(Archetype::Paladin, 0).speed
        );
    }

    #[test]
    fn test_kill_rewards() {
        assert_eq!(kill_reward(Archetype::Swordsman), 20);
        assert_eq!(kill_reward(Archetype::Archer), 35);
        assert_eq!(kill_reward(Archetype::Hero), 100);
    }

    #[test]
    fn test_shatter_percent() {
        assert_eq!(shatter_percent(false, false), 100);
        assert_eq!(shatter_percent(false, true), 125);
        assert_eq!(shatter_percent(true, false), 75);
        assert_eq!(shatter_percent(true, true), 93);
    }

    #[test]
    fn test_attack_damage_combines_modifiers() {
        assert_eq!(attack_damage(40, false, true, 100), 50);
        assert_eq!(attack_damage(40, false, false, POINT_BLANK_PERCENT), 20);
        assert_eq!(point_blank_percent(fx(30), fx(60)), POINT_BLANK_PERCENT);
        assert_eq!(point_blank_percent(fx(60), fx(60)), 100);
    }

    #[test]
    fn test_production_frames_floor_at_thirty_percent() {
        assert_eq!(production_frames(150, 0), 150);
        assert_eq!(production_frames(150, 3), 105);
        assert_eq!(production_frames(150, 7), 45);
        assert_eq!(production_frames(150, 100), 45);
    }

    #[test]
    fn test_base_hp_upgrade() {
        assert_eq!(max_base_hp(2000, 0), 2000);
        assert_eq!(max_base_hp(2000, 10), 3000);
    }

    #[test]
    fn test_ability_scaling() {
        assert_eq!(barrage_damage(0), 40);
        assert_eq!(barrage_damage(5), 80);
        assert_eq!(barrage_duration(10), 360);
        assert_eq!(chain_jump_damage(chain_damage(0)), 36);
        assert_eq!(freeze_width(5), 240);
        assert_eq!(tower_damage(25, 4), 35);
        assert_eq!(tower_cost(300, 150, 2), 600);
        assert_eq!(miner_yield(10), 24);
    }

    #[test]
    fn test_apply_damage_floors_at_zero() {
        let mut stats = calculate_stats(Archetype::Miner, 0);
        assert_eq!(stats.apply_damage(30), 30);
        assert_eq!(stats.apply_damage(500), 50);
        assert!(stats.is_depleted());
        assert_eq!(stats.apply_damage(10), 0);
    }
}
