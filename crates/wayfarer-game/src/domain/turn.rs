//! Buffered durable writes of one turn.
//!
//! Resolvers never write to the repository directly. They record what
//! changed here, and the engine commits the whole buffer in one
//! transaction once the turn has been fully resolved. A turn that fails
//! part-way therefore commits nothing.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use wayfarer_core::clock::Clock;
use wayfarer_core::vocabulary::{CampaignState, EventType};

use super::campaign::{Character, InventoryEntry};
use super::catalog::Item;
use super::event::{EventData, GameEvent};

/// Pending writes for one campaign turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnChanges {
    /// Campaign the turn belongs to.
    pub campaign_id: Uuid,
    /// The campaign's character.
    pub character_id: Uuid,
    /// Highest event number already persisted when the turn started.
    pub last_event_number: i64,
    /// Events to append, in order.
    pub events: Vec<GameEvent>,
    /// Replacement character row, if any stat or equipment changed.
    pub character: Option<Character>,
    /// New campaign state, if it changed.
    pub campaign_state: Option<CampaignState>,
    /// Inventory rows to insert.
    pub inventory_added: Vec<InventoryEntry>,
    /// Item ids to remove, one row per entry.
    pub inventory_removed: Vec<Uuid>,
    /// Timestamp applied to every write.
    pub committed_at: DateTime<Utc>,
}

impl TurnChanges {
    /// Starts an empty buffer on top of `last_event_number`.
    #[must_use]
    pub fn new(
        campaign_id: Uuid,
        character_id: Uuid,
        last_event_number: i64,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            campaign_id,
            character_id,
            last_event_number,
            events: Vec::new(),
            character: None,
            campaign_state: None,
            inventory_added: Vec::new(),
            inventory_removed: Vec::new(),
            committed_at: clock.now(),
        }
    }

    /// Number the next recorded event will receive.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn next_event_number(&self) -> i64 {
        self.last_event_number + self.events.len() as i64 + 1
    }

    /// Appends an event and returns its number.
    pub fn record(&mut self, event_type: EventType, message: String, data: EventData) -> i64 {
        let event_number = self.next_event_number();
        self.events.push(GameEvent {
            id: Uuid::new_v4(),
            campaign_id: self.campaign_id,
            message,
            event_number,
            event_type,
            event_data: Some(data),
            created_at: self.committed_at,
        });
        event_number
    }

    /// Stages the character row.
    pub fn update_character(&mut self, character: &Character) {
        self.character = Some(character.clone());
    }

    /// Stages a campaign state transition.
    pub fn set_campaign_state(&mut self, state: CampaignState) {
        self.campaign_state = Some(state);
    }

    /// Stages one new inventory row for `item`.
    pub fn add_item(&mut self, item: &Item) -> InventoryEntry {
        let entry = InventoryEntry {
            id: Uuid::new_v4(),
            item: item.clone(),
        };
        self.inventory_added.push(entry.clone());
        entry
    }

    /// Stages removal of one row holding `item_id`.
    pub fn remove_item(&mut self, item_id: Uuid) {
        self.inventory_removed.push(item_id);
    }

    /// Whether nothing was staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.character.is_none()
            && self.campaign_state.is_none()
            && self.inventory_added.is_empty()
            && self.inventory_removed.is_empty()
    }
}
