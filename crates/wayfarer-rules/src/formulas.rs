//! Loot and difficulty formulas.
//!
//! Pure functions from `(event number, roll)` to catalog targets, plus the
//! range helpers used to query the catalog around a target. The only random
//! branch is the late-game special encounter, which takes the RNG explicitly.

use serde::{Deserialize, Serialize};
use tracing::debug;
use wayfarer_core::rng::DeterministicRng;

use crate::config::BalanceConfig;

fn event_as_i32(event_number: i64) -> i32 {
    i32::try_from(event_number.max(0)).unwrap_or(i32::MAX)
}

fn roll_as_i32(roll: u32) -> i32 {
    i32::try_from(roll).unwrap_or(i32::MAX)
}

/// Target rarity for loot found on `event_number` with `roll`.
///
/// Rolls at or below the cursed ceiling produce a negative rarity that grows
/// more negative with later events and lower rolls, floored at
/// `cursed_rarity_floor`. Other rolls produce
/// `event_number * item_event_weight + roll * item_roll_weight`.
#[must_use]
pub fn item_rarity(config: &BalanceConfig, event_number: i64, roll: u32) -> i32 {
    let event = event_as_i32(event_number);
    if roll <= config.cursed_roll_ceiling {
        let pips_below = roll_as_i32(config.cursed_roll_ceiling + 1 - roll);
        let penalty = event
            .saturating_mul(config.cursed_event_weight)
            .saturating_add(pips_below.saturating_mul(config.cursed_roll_weight));
        return (-penalty).max(config.cursed_rarity_floor);
    }
    event
        .saturating_mul(config.item_event_weight)
        .saturating_add(roll_as_i32(roll).saturating_mul(config.item_roll_weight))
}

/// Difficulty on the normal curve: `event * w + (roll - 10) * w`, floored at 0.
#[must_use]
pub fn base_enemy_difficulty(config: &BalanceConfig, event_number: i64, roll: u32) -> i32 {
    let event = event_as_i32(event_number);
    let offset = roll_as_i32(roll) - 10;
    event
        .saturating_mul(config.enemy_event_weight)
        .saturating_add(offset.saturating_mul(config.enemy_roll_weight))
        .max(0)
}

/// Rolls for a special encounter. Returns the special tier if one fires.
///
/// The RNG is only consulted inside the configured window.
pub fn special_encounter_roll(
    config: &BalanceConfig,
    event_number: i64,
    rng: &mut dyn DeterministicRng,
) -> Option<i32> {
    let special = &config.special_encounter;
    if !special.in_window(event_number) {
        return None;
    }
    if rng.next_f64() >= special.probability {
        return None;
    }
    let index = rng.next_u32_range(0, 2).min(2) as usize;
    let tier = special.tiers[index];
    debug!(event_number, tier, "special encounter triggered");
    Some(tier)
}

/// Enemy difficulty for a combat on `event_number` with `roll`, including the
/// special-encounter override.
pub fn enemy_difficulty(
    config: &BalanceConfig,
    event_number: i64,
    roll: u32,
    rng: &mut dyn DeterministicRng,
) -> i32 {
    special_encounter_roll(config, event_number, rng)
        .unwrap_or_else(|| base_enemy_difficulty(config, event_number, roll))
}

/// Reward rarity for defeating an enemy of `difficulty` with `roll`.
///
/// `round(difficulty * 0.5 + roll * 2)`, except special tiers map to
/// themselves.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn combat_reward_rarity(config: &BalanceConfig, difficulty: i32, roll: u32) -> i32 {
    if config.special_encounter.is_special_tier(difficulty) {
        return difficulty;
    }
    (f64::from(difficulty) * 0.5 + f64::from(roll) * 2.0).round() as i32
}

/// Inclusive numeric window used for nearest-match catalog queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound (inclusive).
    pub min: i32,
    /// Upper bound (inclusive).
    pub max: i32,
    /// The value the window is centered on.
    pub target: i32,
}

impl ValueRange {
    /// Whether `value` lies in the window.
    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Distance from `value` to the target, for closest-match fallback.
    #[must_use]
    pub fn distance(&self, value: i32) -> u32 {
        self.target.abs_diff(value)
    }
}

/// `[target - variance, target + variance]` clamped at 0.
#[must_use]
pub fn difficulty_range(target: i32, variance: i32) -> ValueRange {
    ValueRange {
        min: target.saturating_sub(variance).max(0),
        max: target.saturating_add(variance).max(0),
        target,
    }
}

/// Window around a target rarity.
///
/// Non-negative targets are clamped at 0 like difficulties. Cursed
/// (negative) targets keep a negative window so they can still reach cursed
/// catalog entries.
#[must_use]
pub fn rarity_range(target: i32, variance: i32) -> ValueRange {
    if target >= 0 {
        return difficulty_range(target, variance);
    }
    ValueRange {
        min: target.saturating_sub(variance),
        max: target.saturating_add(variance).min(-1),
        target,
    }
}
