//! Fixed-point and percentage math for deterministic simulation.
//!
//! Lane positions and speeds use fixed-point arithmetic so the simulation
//! behaves identically on every platform. Stat scaling uses integer
//! percentages (`base * (100 + 5 * level) / 100`) so formulas are exact.

use fixed::types::I32F32;

/// Fixed-point number type for all lane math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for `Option<Fixed>`.
pub mod option_fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize an optional fixed-point number.
    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_bits()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<i64>::deserialize(deserializer)?;
        Ok(opt.map(Fixed::from_bits))
    }
}

/// Shorthand for an integer lane coordinate.
#[must_use]
pub fn fx(value: i32) -> Fixed {
    Fixed::from_num(value)
}

/// A fixed-point value expressed as `numerator / denominator`.
#[must_use]
pub fn ratio(numerator: i32, denominator: i32) -> Fixed {
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}

/// Scale an integer by a percentage, flooring the result.
///
/// Intermediate math is done in 64 bits so large levels cannot overflow.
#[must_use]
pub fn scale_percent(value: u32, percent: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(percent) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Scale a fixed-point value by a percentage.
#[must_use]
pub fn scale_fixed_percent(value: Fixed, percent: u32) -> Fixed {
    value * Fixed::from_num(percent) / Fixed::from_num(100)
}

/// Percentage multiplier for a linear per-level bonus: `100 + per_level * level`.
#[must_use]
pub fn level_percent(level: u32, per_level: u32) -> u32 {
    100u32.saturating_add(per_level.saturating_mul(level))
}

/// Distance between two lane coordinates.
#[must_use]
pub fn lane_distance(a: Fixed, b: Fixed) -> Fixed {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Move `from` toward `to` by at most `step`, never overshooting.
#[must_use]
pub fn step_toward(from: Fixed, to: Fixed, step: Fixed) -> Fixed {
    if lane_distance(from, to) <= step {
        to
    } else if to > from {
        from + step
    } else {
        from - step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_percent_floors() {
        assert_eq!(scale_percent(2000, 200), 4000);
        assert_eq!(scale_percent(220, 105), 231);
        assert_eq!(scale_percent(14, 105), 14);
        assert_eq!(scale_percent(u32::MAX, 200), u32::MAX);
    }

    #[test]
    fn test_level_percent() {
        assert_eq!(level_percent(0, 5), 100);
        assert_eq!(level_percent(10, 10), 200);
        assert_eq!(level_percent(u32::MAX, 5), u32::MAX);
    }

    #[test]
    fn test_step_toward_never_overshoots() {
        assert_eq!(step_toward(fx(0), fx(10), fx(3)), fx(3));
        assert_eq!(step_toward(fx(9), fx(10), fx(3)), fx(10));
        assert_eq!(step_toward(fx(10), fx(0), fx(4)), fx(6));
    }

    #[test]
    fn test_lane_distance_symmetric() {
        assert_eq!(lane_distance(fx(3), fx(10)), fx(7));
        assert_eq!(lane_distance(fx(10), fx(3)), fx(7));
    }

    #[test]
    fn test_fixed_serde_roundtrip_is_exact() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "fixed_serde")]
            value: Fixed,
        }

        let value = ratio(1, 3);
        let bytes = bincode::serialize(&Wrapper { value }).unwrap();
        let back: Wrapper = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.value, value);
    }
}
