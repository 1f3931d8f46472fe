//! Stat-boost calculation for environmental events.
//!
//! The narrator proposes a base value; the final value applied to the
//! character depends on the band of the accompanying d20 roll. The rule is
//! behind [`StatCalculator`] so balance experiments can swap it out.

use std::fmt::Debug;

use crate::dice::{self, RollClass};

/// Turns a proposed base value and a roll into the applied delta.
pub trait StatCalculator: Send + Sync + Debug {
    /// Returns the final delta for `base` under `roll`.
    fn final_value(&self, base: i32, roll: u32) -> i32;
}

/// Default rule.
///
/// - critical success: doubled, plus one per pip above 15 for boosts
/// - regular: unchanged
/// - critical failure: a boost collapses to minus half of it (possibly zero);
///   a setback doubles
#[derive(Debug, Clone, Copy, Default)]
pub struct RollScaledStatCalculator;

impl StatCalculator for RollScaledStatCalculator {
    fn final_value(&self, base: i32, roll: u32) -> i32 {
        match dice::classify(roll) {
            RollClass::CriticalSuccess => {
                let doubled = base.saturating_mul(2);
                if base > 0 {
                    let pips = i32::try_from(roll.saturating_sub(15)).unwrap_or(0);
                    doubled.saturating_add(pips)
                } else {
                    // A lucky roll turns a setback into a small boon.
                    -base
                }
            }
            RollClass::Regular => base,
            RollClass::CriticalFailure => {
                if base > 0 {
                    -(base / 2)
                } else {
                    base.saturating_mul(2)
                }
            }
        }
    }
}
