//! Combat damage model.
//!
//! One d20 roll per exchange affects both sides: the roll's offset from 10 is
//! added to the damage the character deals and subtracted from the damage
//! the character receives. Each side always deals at least 1.

use serde::{Deserialize, Serialize};

use crate::config::BalanceConfig;
use crate::dice;

/// Damage the character deals with `effective_attack` against `enemy_defense`.
///
/// `max(1, max(1, attack - defense) + (roll - 10))`.
#[must_use]
pub fn damage_dealt(effective_attack: i32, enemy_defense: i32, roll: u32) -> i32 {
    let base = effective_attack.saturating_sub(enemy_defense).max(1);
    base.saturating_add(dice::modifier(roll)).max(1)
}

/// Damage the character receives from `enemy_attack` through `effective_defense`.
///
/// `max(1, max(1, attack - defense) - (roll - 10))`.
#[must_use]
pub fn damage_received(enemy_attack: i32, effective_defense: i32, roll: u32) -> i32 {
    let base = enemy_attack.saturating_sub(effective_defense).max(1);
    base.saturating_sub(dice::modifier(roll)).max(1)
}

/// Both sides of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageExchange {
    /// Damage dealt to the enemy.
    pub dealt: i32,
    /// Damage dealt to the character (if the enemy survives to strike back).
    pub received: i32,
}

/// Computes one full exchange for a single roll.
#[must_use]
pub fn exchange(
    effective_attack: i32,
    effective_defense: i32,
    enemy_attack: i32,
    enemy_defense: i32,
    roll: u32,
) -> DamageExchange {
    DamageExchange {
        dealt: damage_dealt(effective_attack, enemy_defense, roll),
        received: damage_received(enemy_attack, effective_defense, roll),
    }
}

/// Whether a flee attempt against an ordinary enemy succeeds.
#[must_use]
pub fn flee_succeeds(config: &BalanceConfig, roll: u32) -> bool {
    roll > config.flee_threshold
}
