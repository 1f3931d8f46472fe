//! Persistence traits consumed by the engine.
//!
//! [`GameRepository`] owns campaign state and the event log;
//! [`CatalogRepository`] serves read-only reference data. Both are
//! implemented by the Postgres store and by in-memory test doubles.

use async_trait::async_trait;
use uuid::Uuid;
use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::{EquipmentSlot, EventType};
use wayfarer_rules::formulas::ValueRange;

use super::campaign::{Campaign, Character, InventoryEntry, Loadout};
use super::catalog::{CharacterClass, Enemy, Equipment, Item, Race};
use super::event::GameEvent;
use super::turn::TurnChanges;

/// Campaign state and event log storage.
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Loads a campaign.
    ///
    /// # Errors
    ///
    /// `DomainError::NotFound` if absent; `Infrastructure` on storage failure.
    async fn load_campaign(&self, campaign_id: Uuid) -> Result<Campaign, DomainError>;

    /// Loads the campaign's character.
    ///
    /// # Errors
    ///
    /// `DomainError::NotFound` if absent; `Infrastructure` on storage failure.
    async fn load_character(&self, campaign_id: Uuid) -> Result<Character, DomainError>;

    /// Loads the character's equipped pieces.
    ///
    /// # Errors
    ///
    /// `DomainError::NotFound` if an equipped id has no catalog row.
    async fn load_loadout(&self, character: &Character) -> Result<Loadout, DomainError>;

    /// Loads every inventory row of the character.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    async fn load_inventory(&self, character_id: Uuid) -> Result<Vec<InventoryEntry>, DomainError>;

    /// The `limit` most recent events, newest first.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    async fn recent_events(
        &self,
        campaign_id: Uuid,
        limit: i64,
    ) -> Result<Vec<GameEvent>, DomainError>;

    /// How many events of `event_type` the campaign has logged.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    async fn count_events_of_type(
        &self,
        campaign_id: Uuid,
        event_type: EventType,
    ) -> Result<i64, DomainError>;

    /// Persists a new campaign and its character atomically.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure; nothing is written.
    async fn create_campaign(
        &self,
        campaign: &Campaign,
        character: &Character,
    ) -> Result<(), DomainError>;

    /// Applies every staged write of a turn in one transaction.
    ///
    /// # Errors
    ///
    /// `ConcurrencyConflict` if an event number is already taken;
    /// `Infrastructure` on storage failure. Nothing is written on error.
    async fn commit_turn(&self, turn: &TurnChanges) -> Result<(), DomainError>;

    /// Deletes a campaign with its character, inventory and events.
    ///
    /// # Errors
    ///
    /// `DomainError::NotFound` if absent.
    async fn delete_campaign(&self, campaign_id: Uuid) -> Result<(), DomainError>;
}

/// Read-only reference data.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Loads a race.
    ///
    /// # Errors
    ///
    /// `DomainError::NotFound` if absent.
    async fn load_race(&self, race_id: Uuid) -> Result<Race, DomainError>;

    /// Loads a class.
    ///
    /// # Errors
    ///
    /// `DomainError::NotFound` if absent.
    async fn load_class(&self, class_id: Uuid) -> Result<CharacterClass, DomainError>;

    /// Consumable items whose rarity lies in `range`.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    async fn items_in_range(&self, range: ValueRange) -> Result<Vec<Item>, DomainError>;

    /// The consumable item whose rarity is closest to `target`.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure. An empty catalog yields `None`.
    async fn closest_item(&self, target: i32) -> Result<Option<Item>, DomainError>;

    /// Equipment for `slot` whose rarity lies in `range`.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    async fn equipment_in_range(
        &self,
        slot: EquipmentSlot,
        range: ValueRange,
    ) -> Result<Vec<Equipment>, DomainError>;

    /// The equipment for `slot` whose rarity is closest to `target`.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure. An empty catalog yields `None`.
    async fn closest_equipment(
        &self,
        slot: EquipmentSlot,
        target: i32,
    ) -> Result<Option<Equipment>, DomainError>;

    /// Enemies whose difficulty lies in `range`.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure.
    async fn enemies_in_range(&self, range: ValueRange) -> Result<Vec<Enemy>, DomainError>;

    /// The enemy whose difficulty is closest to `target`.
    ///
    /// # Errors
    ///
    /// `Infrastructure` on storage failure. An empty catalog yields `None`.
    async fn closest_enemy(&self, target: i32) -> Result<Option<Enemy>, DomainError>;
}
