//! The append-only game event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfarer_core::vocabulary::{EquipmentSlot, EventType, StatType};
use wayfarer_narrative::context::{CombatEnding, EventSummary};

/// Which part of a combat encounter a `Combat` event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhaseTag {
    /// The enemy appeared.
    Encounter,
    /// The fight ended.
    Conclusion,
}

/// Structured payload attached to a logged event.
///
/// Every field is optional; each event kind fills the fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventData {
    /// The campaign introduction.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub introduction: bool,
    /// The d20 roll that resolved the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dice_roll: Option<u32>,
    /// Player passed on an investigation prompt.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub declined: bool,
    /// Stat changed by an environmental event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat_type: Option<StatType>,
    /// Change actually applied to `stat_type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat_delta: Option<i32>,
    /// Combat encounter stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<CombatPhaseTag>,
    /// How a combat ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CombatEnding>,
    /// Enemy fought.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enemy_id: Option<Uuid>,
    /// Enemy display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enemy_name: Option<String>,
    /// Enemy difficulty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enemy_difficulty: Option<i32>,
    /// Enemy was boss-tier.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub boss: bool,
    /// Item or equipment found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
    /// Display name of the found entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    /// Rarity of the found entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_rarity: Option<i32>,
    /// Slot, when the found entry was equipment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_slot: Option<EquipmentSlot>,
    /// Found equipment was equipped immediately.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub auto_equipped: bool,
    /// Equipment that the new piece replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_item: Option<Uuid>,
    /// Found item was left behind because the pack was full.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub left_behind: bool,
}

/// One entry of a campaign's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Event identifier.
    pub id: Uuid,
    /// Owning campaign.
    pub campaign_id: Uuid,
    /// Narrative text.
    pub message: String,
    /// 1-based, unique and increasing within the campaign.
    pub event_number: i64,
    /// Event category.
    pub event_type: EventType,
    /// Structured payload.
    pub event_data: Option<EventData>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl GameEvent {
    /// Narrative view of the event.
    #[must_use]
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            event_number: self.event_number,
            event_type: self.event_type,
            message: self.message.clone(),
        }
    }

    /// Whether the event was a declined investigation.
    #[must_use]
    pub fn is_declined(&self) -> bool {
        self.event_data.as_ref().is_some_and(|data| data.declined)
    }
}
