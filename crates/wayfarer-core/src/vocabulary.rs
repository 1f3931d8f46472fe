//! Vocabulary types shared by every bounded context.
//!
//! These are the small closed sets the game speaks in: narrative event
//! categories, character stats, campaign lifecycle states and equipment
//! slots. Each has a stable string form used in the database and on the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a vocabulary string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    /// The vocabulary being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Narrative category governing a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Pure narration, no mechanical effect.
    Descriptive,
    /// A stat boost or setback from the surroundings.
    Environmental,
    /// An enemy encounter.
    Combat,
    /// Loot found on the road.
    #[serde(rename = "Item_Drop")]
    ItemDrop,
}

impl EventType {
    /// All categories, in selector preference order.
    pub const ALL: [EventType; 4] = [
        EventType::Descriptive,
        EventType::Environmental,
        EventType::Combat,
        EventType::ItemDrop,
    ];

    /// The stored string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Descriptive => "Descriptive",
            EventType::Environmental => "Environmental",
            EventType::Combat => "Combat",
            EventType::ItemDrop => "Item_Drop",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "descriptive" => Ok(EventType::Descriptive),
            "environmental" => Ok(EventType::Environmental),
            "combat" => Ok(EventType::Combat),
            "itemdrop" => Ok(EventType::ItemDrop),
            _ => Err(UnknownVariant {
                kind: "event type",
                value: s.to_owned(),
            }),
        }
    }
}

/// A character stat that items, equipment and the environment can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatType {
    /// Current/maximum health.
    Health,
    /// Outgoing damage.
    Attack,
    /// Incoming damage reduction.
    Defense,
}

impl StatType {
    /// The stored string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatType::Health => "health",
            StatType::Attack => "attack",
            StatType::Defense => "defense",
        }
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "health" | "hp" | "vitality" => Ok(StatType::Health),
            "attack" | "atk" | "strength" => Ok(StatType::Attack),
            "defense" | "defence" | "def" => Ok(StatType::Defense),
            _ => Err(UnknownVariant {
                kind: "stat type",
                value: s.to_owned(),
            }),
        }
    }
}

/// Lifecycle state of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    /// Accepting actions.
    Active,
    /// The boss was defeated. Terminal.
    Completed,
    /// The character died. Terminal.
    GameOver,
}

impl CampaignState {
    /// The stored string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CampaignState::Active => "active",
            CampaignState::Completed => "completed",
            CampaignState::GameOver => "game_over",
        }
    }

    /// Whether no further actions may be taken.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, CampaignState::Active)
    }
}

impl fmt::Display for CampaignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "active" => Ok(CampaignState::Active),
            "completed" => Ok(CampaignState::Completed),
            "gameover" => Ok(CampaignState::GameOver),
            _ => Err(UnknownVariant {
                kind: "campaign state",
                value: s.to_owned(),
            }),
        }
    }
}

/// Equipment slot. Each slot boosts exactly one stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlot {
    /// Boosts attack.
    Weapon,
    /// Boosts maximum health.
    Armor,
    /// Boosts defense.
    Shield,
}

impl EquipmentSlot {
    /// All slots.
    pub const ALL: [EquipmentSlot; 3] = [
        EquipmentSlot::Weapon,
        EquipmentSlot::Armor,
        EquipmentSlot::Shield,
    ];

    /// The stat this slot's bonus applies to.
    #[must_use]
    pub fn stat(self) -> StatType {
        match self {
            EquipmentSlot::Weapon => StatType::Attack,
            EquipmentSlot::Armor => StatType::Health,
            EquipmentSlot::Shield => StatType::Defense,
        }
    }

    /// The stored string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentSlot::Weapon => "weapon",
            EquipmentSlot::Armor => "armor",
            EquipmentSlot::Shield => "shield",
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentSlot {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "weapon" => Ok(EquipmentSlot::Weapon),
            "armor" | "armour" => Ok(EquipmentSlot::Armor),
            "shield" => Ok(EquipmentSlot::Shield),
            _ => Err(UnknownVariant {
                kind: "equipment slot",
                value: s.to_owned(),
            }),
        }
    }
}
