//! Wayfarer RPG: Rules & Resolution.
//!
//! Pure balancing rules: the d20 roller and its roll bands, the loot and
//! enemy-difficulty formulas, the stat-boost calculation and the combat
//! damage model. Every tunable constant lives in [`config::BalanceConfig`].

pub mod combat;
pub mod config;
pub mod dice;
pub mod formulas;
pub mod stats;
