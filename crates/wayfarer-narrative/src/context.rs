//! Context handed to the narrative generator.
//!
//! A compact, serializable view of the character, recent history and (for
//! combat) the opposing enemy. Generators may embed it in a prompt verbatim.

use serde::{Deserialize, Serialize};
use wayfarer_core::vocabulary::{EventType, StatType};

/// Character stats as the narrator sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSummary {
    /// Character name.
    pub name: String,
    /// Race name.
    pub race: String,
    /// Class name.
    pub class: String,
    /// Current health.
    pub current_health: i32,
    /// Maximum health including armor.
    pub max_health: i32,
    /// Attack including weapon and combat buffs.
    pub attack: i32,
    /// Defense including shield and combat buffs.
    pub defense: i32,
}

/// One line of recent history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Position in the campaign log.
    pub event_number: i64,
    /// Category of the event.
    pub event_type: EventType,
    /// Narrative text of the event.
    pub message: String,
}

/// Enemy stats as the narrator sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySummary {
    /// Enemy name.
    pub name: String,
    /// Remaining health.
    pub health: i32,
    /// Attack.
    pub attack: i32,
    /// Defense.
    pub defense: i32,
    /// Catalog difficulty.
    pub difficulty: i32,
}

/// Everything a generator call may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeContext {
    /// Campaign name.
    pub campaign_name: String,
    /// Event number being generated.
    pub event_number: i64,
    /// The character.
    pub character: CharacterSummary,
    /// Most recent events, newest first.
    pub recent_events: Vec<EventSummary>,
    /// The opposing enemy, during combat.
    pub enemy: Option<EnemySummary>,
}

/// An item or piece of equipment the description should feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedItem {
    /// Item name.
    pub name: String,
    /// Balancing rarity (negative for cursed items).
    pub rarity: i32,
    /// Stat the item modifies.
    pub stat: StatType,
    /// Amount it modifies the stat by.
    pub value: i32,
}

/// How a combat ended, for conclusion narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatEnding {
    /// The enemy fell.
    EnemyDefeated,
    /// The character fell.
    CharacterDefeated,
    /// The character escaped.
    Fled,
}

/// What a description is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scene", rename_all = "snake_case")]
pub enum Scene {
    /// One-time campaign opening.
    Introduction,
    /// Plain narration.
    Descriptive,
    /// Short "you sense something" hook for a pending event.
    InvestigationHook {
        /// The event awaiting confirmation.
        event_type: EventType,
    },
    /// The player chose to move on.
    Declined {
        /// The event that was passed up.
        event_type: EventType,
    },
    /// Surroundings changed a stat.
    Environmental {
        /// The stat affected.
        stat: StatType,
        /// The applied delta.
        delta: i32,
    },
    /// An enemy appears.
    CombatEncounter {
        /// Whether it is the final boss.
        boss: bool,
    },
    /// A combat ended.
    CombatConclusion {
        /// How it ended.
        ending: CombatEnding,
    },
    /// Loot was found.
    ItemDrop {
        /// Whether it was left behind for lack of space.
        left_behind: bool,
    },
}
