//! Balance configuration.
//!
//! Every tunable number the engine uses lives in [`BalanceConfig`]. The
//! defaults are the shipped balance; a deployment can override any subset of
//! keys from a YAML file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wayfarer_core::error::DomainError;

/// Late-game special encounters that override the normal difficulty curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialEncounterConfig {
    /// First event number (inclusive) at which a special encounter may occur.
    pub window_start: i64,
    /// Last event number (inclusive) at which a special encounter may occur.
    pub window_end: i64,
    /// Chance in `[0, 1]` that a combat inside the window is special.
    pub probability: f64,
    /// The three fixed special difficulty tiers.
    pub tiers: [i32; 3],
}

impl Default for SpecialEncounterConfig {
    fn default() -> Self {
        Self {
            window_start: 30,
            window_end: 45,
            probability: 0.05,
            tiers: [250, 350, 450],
        }
    }
}

impl SpecialEncounterConfig {
    /// Whether `event_number` falls inside the special-encounter window.
    #[must_use]
    pub fn in_window(&self, event_number: i64) -> bool {
        (self.window_start..=self.window_end).contains(&event_number)
    }

    /// Whether `difficulty` is one of the fixed special tiers.
    #[must_use]
    pub fn is_special_tier(&self, difficulty: i32) -> bool {
        self.tiers.contains(&difficulty)
    }
}

/// The single named block of balancing constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Item rarity gained per event number on a normal roll.
    pub item_event_weight: i32,
    /// Item rarity gained per pip on a normal roll.
    pub item_roll_weight: i32,
    /// Highest roll that produces cursed (negative-rarity) loot.
    pub cursed_roll_ceiling: u32,
    /// Cursed rarity lost per event number.
    pub cursed_event_weight: i32,
    /// Cursed rarity lost per pip below the cursed ceiling.
    pub cursed_roll_weight: i32,
    /// Most negative rarity a cursed item can have.
    pub cursed_rarity_floor: i32,
    /// Enemy difficulty gained per event number.
    pub enemy_event_weight: i32,
    /// Enemy difficulty gained per pip above 10.
    pub enemy_roll_weight: i32,
    /// Half-width of the catalog search window around a target rarity.
    pub rarity_variance: i32,
    /// Half-width of the catalog search window around a target difficulty.
    pub difficulty_variance: i32,
    /// Special encounter window, odds and tiers.
    pub special_encounter: SpecialEncounterConfig,
    /// Event number from which `continue` always forces the boss.
    pub boss_forced_event_start: i64,
    /// Target difficulty used to look up the final boss.
    pub boss_difficulty: i32,
    /// Difficulty at or above which an enemy is boss-tier.
    pub boss_tier_threshold: i32,
    /// Hard cap on the number of logged events per campaign.
    pub max_event_count: i64,
    /// Lifetime cap on Descriptive events per campaign.
    pub max_descriptive_events: i64,
    /// Number of most recent events inspected for repeats.
    pub repeat_window: usize,
    /// A category seen this many times in the window is rejected.
    pub max_repeats_in_window: usize,
    /// How many proposals the selector asks for before falling back.
    pub selector_attempts: u32,
    /// Chance that an item drop is equipment rather than a consumable.
    pub equipment_drop_chance: f64,
    /// Chance that a combat reward is equipment rather than a consumable.
    pub reward_equipment_chance: f64,
    /// Maximum number of inventory rows a character may hold.
    pub inventory_capacity: usize,
    /// Stat boost substituted when the narrator proposes zero.
    pub default_stat_boost: i32,
    /// Largest absolute stat boost accepted from the narrator.
    pub max_stat_boost: i32,
    /// Rolls strictly above this escape from ordinary enemies.
    pub flee_threshold: u32,
    /// Number of events returned with the game state and fed to narration.
    pub recent_event_limit: i64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            item_event_weight: 2,
            item_roll_weight: 3,
            cursed_roll_ceiling: 5,
            cursed_event_weight: 1,
            cursed_roll_weight: 4,
            cursed_rarity_floor: -60,
            enemy_event_weight: 4,
            enemy_roll_weight: 2,
            rarity_variance: 5,
            difficulty_variance: 10,
            special_encounter: SpecialEncounterConfig::default(),
            boss_forced_event_start: 48,
            boss_difficulty: 1000,
            boss_tier_threshold: 1000,
            max_event_count: 50,
            max_descriptive_events: 10,
            repeat_window: 5,
            max_repeats_in_window: 2,
            selector_attempts: 3,
            equipment_drop_chance: 0.2,
            reward_equipment_chance: 0.7,
            inventory_capacity: 10,
            default_stat_boost: 2,
            max_stat_boost: 10,
            flee_threshold: 10,
            recent_event_limit: 10,
        }
    }
}

impl BalanceConfig {
    /// Parses a YAML document. Keys that are absent keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` if the document is malformed or the
    /// resulting block fails [`BalanceConfig::validate`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DomainError> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::Configuration(format!("invalid balance config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` if the file cannot be read or parsed.
    pub fn load_yaml(path: &Path) -> Result<Self, DomainError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Whether `difficulty` denotes a boss-tier enemy.
    #[must_use]
    pub fn is_boss_tier(&self, difficulty: i32) -> bool {
        difficulty >= self.boss_tier_threshold
    }

    /// Checks that the block is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` naming the first violated rule.
    pub fn validate(&self) -> Result<(), DomainError> {
        let fail = |msg: &str| Err(DomainError::Configuration(msg.to_owned()));

        if self.boss_forced_event_start < 2 {
            return fail("boss_forced_event_start must leave room for the introduction");
        }
        if self.boss_forced_event_start > self.max_event_count {
            return fail("boss_forced_event_start must not exceed max_event_count");
        }
        let special = &self.special_encounter;
        if special.window_start > special.window_end {
            return fail("special_encounter window_start must not exceed window_end");
        }
        if special.window_end >= self.boss_forced_event_start {
            return fail("special_encounter window must end before the boss threshold");
        }
        if !(0.0..=1.0).contains(&special.probability) {
            return fail("special_encounter probability must be within [0, 1]");
        }
        if special
            .tiers
            .iter()
            .any(|tier| *tier <= 0 || self.is_boss_tier(*tier))
        {
            return fail("special_encounter tiers must be positive and below boss tier");
        }
        if !self.is_boss_tier(self.boss_difficulty) {
            return fail("boss_difficulty must be boss-tier");
        }
        if !(0.0..=1.0).contains(&self.equipment_drop_chance)
            || !(0.0..=1.0).contains(&self.reward_equipment_chance)
        {
            return fail("drop chances must be within [0, 1]");
        }
        if self.cursed_rarity_floor >= 0 {
            return fail("cursed_rarity_floor must be negative");
        }
        if self.rarity_variance < 0 || self.difficulty_variance < 0 {
            return fail("variances must not be negative");
        }
        if self.inventory_capacity == 0 {
            return fail("inventory_capacity must be at least 1");
        }
        if self.repeat_window == 0 || self.max_repeats_in_window == 0 {
            return fail("repeat_window and max_repeats_in_window must be at least 1");
        }
        if self.default_stat_boost == 0 || self.max_stat_boost <= 0 {
            return fail("stat boost defaults must be nonzero");
        }
        if self.default_stat_boost.abs() > self.max_stat_boost {
            return fail("default_stat_boost must be within max_stat_boost");
        }
        if self.recent_event_limit < 1 {
            return fail("recent_event_limit must be at least 1");
        }
        Ok(())
    }
}
