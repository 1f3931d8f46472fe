//! Catalog fixtures with stable identifiers.

use uuid::Uuid;
use wayfarer_core::vocabulary::{EquipmentSlot, StatType};
use wayfarer_game::domain::catalog::{BaseStats, CharacterClass, Enemy, Equipment, Item, Race};

/// Deterministic id derived from a small integer.
#[must_use]
pub fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// Human: 12 vitality, 2 attack, 1 defense.
#[must_use]
pub fn human() -> Race {
    Race {
        id: id(0x100),
        name: "Human".to_owned(),
        stats: BaseStats {
            vitality: 12,
            attack: 2,
            defense: 1,
        },
    }
}

/// Fighter: 8 vitality, 3 attack, 4 defense.
#[must_use]
pub fn fighter() -> CharacterClass {
    CharacterClass {
        id: id(0x200),
        name: "Fighter".to_owned(),
        stats: BaseStats {
            vitality: 8,
            attack: 3,
            defense: 4,
        },
    }
}

/// A consumable.
#[must_use]
pub fn item(n: u128, name: &str, rarity: i32, stat: StatType, value: i32) -> Item {
    Item {
        id: id(n),
        name: name.to_owned(),
        rarity,
        stat,
        value,
    }
}

/// Heals 10, rarity 20.
#[must_use]
pub fn health_potion() -> Item {
    item(0x300, "Health Potion", 20, StatType::Health, 10)
}

/// +3 attack for one fight, rarity 40.
#[must_use]
pub fn strength_tonic() -> Item {
    item(0x301, "Strength Tonic", 40, StatType::Attack, 3)
}

/// A cursed draught, rarity -30.
#[must_use]
pub fn bitter_draught() -> Item {
    item(0x302, "Bitter Draught", -30, StatType::Health, -4)
}

/// A piece of equipment.
#[must_use]
pub fn equipment(n: u128, name: &str, rarity: i32, slot: EquipmentSlot, bonus: i32) -> Equipment {
    Equipment {
        id: id(n),
        name: name.to_owned(),
        rarity,
        slot,
        bonus,
    }
}

/// One piece per slot at rarity 30.
#[must_use]
pub fn starter_equipment() -> Vec<Equipment> {
    vec![
        equipment(0x400, "Iron Sword", 30, EquipmentSlot::Weapon, 4),
        equipment(0x401, "Leather Armor", 30, EquipmentSlot::Armor, 5),
        equipment(0x402, "Wooden Shield", 30, EquipmentSlot::Shield, 2),
    ]
}

/// An enemy.
#[must_use]
pub fn enemy(n: u128, name: &str, difficulty: i32, health: i32, attack: i32, defense: i32) -> Enemy {
    Enemy {
        id: id(n),
        name: name.to_owned(),
        health,
        attack,
        defense,
        difficulty,
    }
}

/// A weak early enemy.
#[must_use]
pub fn wolf() -> Enemy {
    enemy(0x500, "Grey Wolf", 20, 12, 10, 5)
}

/// The final boss, boss-tier.
#[must_use]
pub fn lich_king() -> Enemy {
    enemy(0x5FF, "Lich King", 1000, 60, 14, 6)
}
