//! Catalog entries: consumable items, equipment, enemies, races and classes.
//!
//! Catalog rows are read-only reference data. Loot and encounters pick from
//! them by rarity or difficulty.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfarer_core::vocabulary::{EquipmentSlot, StatType};
use wayfarer_narrative::context::{EnemySummary, FeaturedItem};

/// A consumable item. Negative rarity marks cursed loot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Catalog identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Balancing score.
    pub rarity: i32,
    /// Stat the item modifies when used.
    pub stat: StatType,
    /// Amount applied to the stat.
    pub value: i32,
}

impl Item {
    /// Narrative view of the item.
    #[must_use]
    pub fn featured(&self) -> FeaturedItem {
        FeaturedItem {
            name: self.name.clone(),
            rarity: self.rarity,
            stat: self.stat,
            value: self.value,
        }
    }
}

/// A weapon, armor or shield.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Catalog identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Balancing score.
    pub rarity: i32,
    /// Slot the piece occupies.
    pub slot: EquipmentSlot,
    /// Fixed bonus to the slot's stat.
    pub bonus: i32,
}

impl Equipment {
    /// Narrative view of the piece.
    #[must_use]
    pub fn featured(&self) -> FeaturedItem {
        FeaturedItem {
            name: self.name.clone(),
            rarity: self.rarity,
            stat: self.slot.stat(),
            value: self.bonus,
        }
    }
}

/// An enemy template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    /// Catalog identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Starting hit points.
    pub health: i32,
    /// Attack stat.
    pub attack: i32,
    /// Defense stat.
    pub defense: i32,
    /// Difficulty score; boss tier starts at the configured threshold.
    pub difficulty: i32,
}

impl Enemy {
    /// Narrative view of the enemy with its current hit points.
    #[must_use]
    pub fn summary(&self, current_health: i32) -> EnemySummary {
        EnemySummary {
            name: self.name.clone(),
            health: current_health,
            attack: self.attack,
            defense: self.defense,
            difficulty: self.difficulty,
        }
    }
}

/// Base stats contributed by a race or class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Contribution to maximum health.
    pub vitality: i32,
    /// Contribution to attack.
    pub attack: i32,
    /// Contribution to defense.
    pub defense: i32,
}

impl std::ops::Add for BaseStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            vitality: self.vitality.saturating_add(rhs.vitality),
            attack: self.attack.saturating_add(rhs.attack),
            defense: self.defense.saturating_add(rhs.defense),
        }
    }
}

/// A playable race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    /// Catalog identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Stat contribution.
    pub stats: BaseStats,
}

/// A playable class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterClass {
    /// Catalog identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Stat contribution.
    pub stats: BaseStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_stats_sum_componentwise() {
        let race = BaseStats {
            vitality: 20,
            attack: 3,
            defense: 2,
        };
        let class = BaseStats {
            vitality: 5,
            attack: 4,
            defense: 1,
        };
        assert_eq!(
            race + class,
            BaseStats {
                vitality: 25,
                attack: 7,
                defense: 3
            }
        );
    }

    #[test]
    fn test_equipment_featured_uses_slot_stat() {
        let shield = Equipment {
            id: Uuid::nil(),
            name: "Buckler".to_owned(),
            rarity: 12,
            slot: EquipmentSlot::Shield,
            bonus: 3,
        };
        let featured = shield.featured();
        assert_eq!(featured.stat, StatType::Defense);
        assert_eq!(featured.value, 3);
    }
}
