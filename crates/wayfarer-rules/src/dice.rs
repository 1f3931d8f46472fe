//! The d20 roller.
//!
//! A single d20 drives every random outcome of a turn. Its value is
//! classified into three bands whose boundaries are load-bearing for combat,
//! flee and reward logic.

use serde::{Deserialize, Serialize};
use wayfarer_core::rng::DeterministicRng;

/// Sides on the die.
pub const D20_SIDES: u32 = 20;

/// Highest roll in the critical-failure band.
pub const CRITICAL_FAILURE_MAX: u32 = 4;

/// Lowest roll in the critical-success band.
pub const CRITICAL_SUCCESS_MIN: u32 = 16;

/// Band a d20 roll falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollClass {
    /// 1–4.
    CriticalFailure,
    /// 5–15.
    Regular,
    /// 16–20.
    CriticalSuccess,
}

/// Rolls 1d20.
///
/// Values from the RNG are clamped into `[1, 20]` so a scripted RNG can never
/// produce an impossible roll.
pub fn roll(rng: &mut dyn DeterministicRng) -> u32 {
    rng.next_u32_range(1, D20_SIDES).clamp(1, D20_SIDES)
}

/// Classifies a roll into its band.
#[must_use]
pub fn classify(roll: u32) -> RollClass {
    if roll <= CRITICAL_FAILURE_MAX {
        RollClass::CriticalFailure
    } else if roll >= CRITICAL_SUCCESS_MIN {
        RollClass::CriticalSuccess
    } else {
        RollClass::Regular
    }
}

/// Signed offset of a roll from the die's midpoint (`roll - 10`).
#[must_use]
pub fn modifier(roll: u32) -> i32 {
    i32::try_from(roll).unwrap_or(i32::MAX).saturating_sub(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u32);

    impl DeterministicRng for Fixed {
        fn next_u32_range(&mut self, _min: u32, _max: u32) -> u32 {
            self.0
        }

        fn next_f64(&mut self) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_classify_partitions_one_to_twenty() {
        let mut counts = [0; 3];
        for r in 1..=20 {
            match classify(r) {
                RollClass::CriticalFailure => {
                    assert!(r <= 4);
                    counts[0] += 1;
                }
                RollClass::Regular => {
                    assert!((5..=15).contains(&r));
                    counts[1] += 1;
                }
                RollClass::CriticalSuccess => {
                    assert!(r >= 16);
                    counts[2] += 1;
                }
            }
        }
        assert_eq!(counts, [4, 11, 5]);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(classify(4), RollClass::CriticalFailure);
        assert_eq!(classify(5), RollClass::Regular);
        assert_eq!(classify(15), RollClass::Regular);
        assert_eq!(classify(16), RollClass::CriticalSuccess);
    }

    #[test]
    fn test_roll_clamps_scripted_values() {
        assert_eq!(roll(&mut Fixed(0)), 1);
        assert_eq!(roll(&mut Fixed(25)), 20);
        assert_eq!(roll(&mut Fixed(13)), 13);
    }

    #[test]
    fn test_modifier_is_centered_on_ten() {
        assert_eq!(modifier(10), 0);
        assert_eq!(modifier(20), 10);
        assert_eq!(modifier(1), -9);
    }

    #[test]
    fn test_roll_class_serializes_snake_case() {
        let json = serde_yaml::to_string(&RollClass::CriticalSuccess).unwrap();
        assert_eq!(json.trim(), "critical_success");
    }
}
