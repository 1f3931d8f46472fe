//! Test repositories: in-memory and failing implementations of the
//! persistence traits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;
use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::{EquipmentSlot, EventType};
use wayfarer_game::domain::campaign::{Campaign, Character, InventoryEntry, Loadout};
use wayfarer_game::domain::catalog::{CharacterClass, Enemy, Equipment, Item, Race};
use wayfarer_game::domain::event::GameEvent;
use wayfarer_game::domain::repository::{CatalogRepository, GameRepository};
use wayfarer_game::domain::turn::TurnChanges;
use wayfarer_rules::formulas::ValueRange;

#[derive(Debug, Default)]
struct Store {
    campaigns: HashMap<Uuid, Campaign>,
    /// Keyed by campaign id.
    characters: HashMap<Uuid, Character>,
    /// `(character_id, row)` in insertion order.
    inventory: Vec<(Uuid, InventoryEntry)>,
    events: Vec<GameEvent>,
    commits: usize,
    fail_next_commit: bool,
}

#[derive(Debug, Default)]
struct Catalog {
    races: Vec<Race>,
    classes: Vec<CharacterClass>,
    items: Vec<Item>,
    equipment: Vec<Equipment>,
    enemies: Vec<Enemy>,
}

/// A repository that keeps campaigns, the event log and the catalog in
/// memory, with the same all-or-nothing commit contract as the database.
#[derive(Debug, Default)]
pub struct InMemoryGameRepository {
    store: Mutex<Store>,
    catalog: Mutex<Catalog>,
}

fn closest<T>(entries: &[T], target: i32, value: impl Fn(&T) -> i32) -> Option<T>
where
    T: Clone,
{
    entries
        .iter()
        .min_by_key(|entry| (value(entry).abs_diff(target), value(entry)))
        .cloned()
}

fn in_range<T>(entries: &[T], range: ValueRange, value: impl Fn(&T) -> i32) -> Vec<T>
where
    T: Clone,
{
    let mut found: Vec<T> = entries
        .iter()
        .filter(|entry| range.contains(value(entry)))
        .cloned()
        .collect();
    found.sort_by_key(|entry| value(entry));
    found
}

impl InMemoryGameRepository {
    /// An empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a race to the catalog.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_race(self, race: Race) -> Self {
        self.catalog.lock().unwrap().races.push(race);
        self
    }

    /// Adds a class to the catalog.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_class(self, class: CharacterClass) -> Self {
        self.catalog.lock().unwrap().classes.push(class);
        self
    }

    /// Adds consumables to the catalog.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_items(self, items: impl IntoIterator<Item = Item>) -> Self {
        self.catalog.lock().unwrap().items.extend(items);
        self
    }

    /// Adds equipment to the catalog.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_equipment(self, equipment: impl IntoIterator<Item = Equipment>) -> Self {
        self.catalog.lock().unwrap().equipment.extend(equipment);
        self
    }

    /// Adds enemies to the catalog.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_enemies(self, enemies: impl IntoIterator<Item = Enemy>) -> Self {
        self.catalog.lock().unwrap().enemies.extend(enemies);
        self
    }

    /// Gives the character `count` rows of `item`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn give_items(&self, character_id: Uuid, item: &Item, count: usize) {
        let mut store = self.store.lock().unwrap();
        for _ in 0..count {
            store.inventory.push((
                character_id,
                InventoryEntry {
                    id: Uuid::new_v4(),
                    item: item.clone(),
                },
            ));
        }
    }

    /// Appends events directly, bypassing the engine.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_events(&self, events: impl IntoIterator<Item = GameEvent>) {
        self.store.lock().unwrap().events.extend(events);
    }

    /// Replaces the stored character row.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn put_character(&self, character: Character) {
        self.store
            .lock()
            .unwrap()
            .characters
            .insert(character.campaign_id, character);
    }

    /// Makes the next `commit_turn` fail with an infrastructure error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_next_commit(&self) {
        self.store.lock().unwrap().fail_next_commit = true;
    }

    /// The stored campaign row.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn campaign(&self, campaign_id: Uuid) -> Option<Campaign> {
        self.store.lock().unwrap().campaigns.get(&campaign_id).cloned()
    }

    /// The stored character row.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn character(&self, campaign_id: Uuid) -> Option<Character> {
        self.store
            .lock()
            .unwrap()
            .characters
            .get(&campaign_id)
            .cloned()
    }

    /// The stored inventory rows of a character.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn inventory(&self, character_id: Uuid) -> Vec<InventoryEntry> {
        self.store
            .lock()
            .unwrap()
            .inventory
            .iter()
            .filter(|(owner, _)| *owner == character_id)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    /// The whole event log of a campaign, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self, campaign_id: Uuid) -> Vec<GameEvent> {
        let mut events: Vec<GameEvent> = self
            .store
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|event| event.campaign_id == campaign_id)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.event_number);
        events
    }

    /// Number of successful commits.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn commit_count(&self) -> usize {
        self.store.lock().unwrap().commits
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Store>, DomainError> {
        self.store
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("store poisoned: {e}")))
    }

    fn catalog(&self) -> Result<std::sync::MutexGuard<'_, Catalog>, DomainError> {
        self.catalog
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("catalog poisoned: {e}")))
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn load_campaign(&self, campaign_id: Uuid) -> Result<Campaign, DomainError> {
        self.guard()?
            .campaigns
            .get(&campaign_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("campaign", campaign_id))
    }

    async fn load_character(&self, campaign_id: Uuid) -> Result<Character, DomainError> {
        self.guard()?
            .characters
            .get(&campaign_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("character", campaign_id))
    }

    async fn load_loadout(&self, character: &Character) -> Result<Loadout, DomainError> {
        let catalog = self.catalog()?;
        let mut loadout = Loadout::default();
        for slot in EquipmentSlot::ALL {
            if let Some(piece_id) = character.equipped(slot) {
                let piece = catalog
                    .equipment
                    .iter()
                    .find(|piece| piece.id == piece_id)
                    .cloned()
                    .ok_or_else(|| DomainError::not_found("equipment", piece_id))?;
                loadout.set(piece);
            }
        }
        Ok(loadout)
    }

    async fn load_inventory(&self, character_id: Uuid) -> Result<Vec<InventoryEntry>, DomainError> {
        Ok(self
            .guard()?
            .inventory
            .iter()
            .filter(|(owner, _)| *owner == character_id)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn recent_events(
        &self,
        campaign_id: Uuid,
        limit: i64,
    ) -> Result<Vec<GameEvent>, DomainError> {
        let mut events: Vec<GameEvent> = self
            .guard()?
            .events
            .iter()
            .filter(|event| event.campaign_id == campaign_id)
            .cloned()
            .collect();
        events.sort_by_key(|event| std::cmp::Reverse(event.event_number));
        events.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(events)
    }

    async fn count_events_of_type(
        &self,
        campaign_id: Uuid,
        event_type: EventType,
    ) -> Result<i64, DomainError> {
        let count = self
            .guard()?
            .events
            .iter()
            .filter(|event| event.campaign_id == campaign_id && event.event_type == event_type)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn create_campaign(
        &self,
        campaign: &Campaign,
        character: &Character,
    ) -> Result<(), DomainError> {
        let mut store = self.guard()?;
        store.campaigns.insert(campaign.id, campaign.clone());
        store.characters.insert(campaign.id, character.clone());
        Ok(())
    }

    async fn commit_turn(&self, turn: &TurnChanges) -> Result<(), DomainError> {
        let mut store = self.guard()?;
        if std::mem::take(&mut store.fail_next_commit) {
            return Err(DomainError::Infrastructure("connection reset".into()));
        }
        if !store.campaigns.contains_key(&turn.campaign_id) {
            return Err(DomainError::not_found("campaign", turn.campaign_id));
        }
        for event in &turn.events {
            let taken = store.events.iter().any(|existing| {
                existing.campaign_id == event.campaign_id
                    && existing.event_number == event.event_number
            });
            if taken {
                return Err(DomainError::ConcurrencyConflict {
                    campaign_id: turn.campaign_id,
                    event_number: event.event_number,
                });
            }
        }

        // Resolve removals before touching anything.
        let mut inventory = store.inventory.clone();
        for item_id in &turn.inventory_removed {
            let position = inventory
                .iter()
                .position(|(owner, entry)| {
                    *owner == turn.character_id && entry.item.id == *item_id
                })
                .ok_or_else(|| DomainError::not_found("inventory item", *item_id))?;
            inventory.remove(position);
        }
        inventory.extend(
            turn.inventory_added
                .iter()
                .map(|entry| (turn.character_id, entry.clone())),
        );

        store.inventory = inventory;
        store.events.extend(turn.events.iter().cloned());
        if let Some(character) = &turn.character {
            store
                .characters
                .insert(turn.campaign_id, character.clone());
        }
        if let Some(campaign) = store.campaigns.get_mut(&turn.campaign_id) {
            if let Some(state) = turn.campaign_state {
                campaign.state = state;
            }
            campaign.updated_at = turn.committed_at;
        }
        store.commits += 1;
        Ok(())
    }

    async fn delete_campaign(&self, campaign_id: Uuid) -> Result<(), DomainError> {
        let mut store = self.guard()?;
        if store.campaigns.remove(&campaign_id).is_none() {
            return Err(DomainError::not_found("campaign", campaign_id));
        }
        if let Some(character) = store.characters.remove(&campaign_id) {
            store.inventory.retain(|(owner, _)| *owner != character.id);
        }
        store.events.retain(|event| event.campaign_id != campaign_id);
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryGameRepository {
    async fn load_race(&self, race_id: Uuid) -> Result<Race, DomainError> {
        self.catalog()?
            .races
            .iter()
            .find(|race| race.id == race_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("race", race_id))
    }

    async fn load_class(&self, class_id: Uuid) -> Result<CharacterClass, DomainError> {
        self.catalog()?
            .classes
            .iter()
            .find(|class| class.id == class_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("class", class_id))
    }

    async fn items_in_range(&self, range: ValueRange) -> Result<Vec<Item>, DomainError> {
        Ok(in_range(&self.catalog()?.items, range, |item| item.rarity))
    }

    async fn closest_item(&self, target: i32) -> Result<Option<Item>, DomainError> {
        Ok(closest(&self.catalog()?.items, target, |item| item.rarity))
    }

    async fn equipment_in_range(
        &self,
        slot: EquipmentSlot,
        range: ValueRange,
    ) -> Result<Vec<Equipment>, DomainError> {
        let catalog = self.catalog()?;
        let slotted: Vec<Equipment> = catalog
            .equipment
            .iter()
            .filter(|piece| piece.slot == slot)
            .cloned()
            .collect();
        Ok(in_range(&slotted, range, |piece| piece.rarity))
    }

    async fn closest_equipment(
        &self,
        slot: EquipmentSlot,
        target: i32,
    ) -> Result<Option<Equipment>, DomainError> {
        let catalog = self.catalog()?;
        let slotted: Vec<Equipment> = catalog
            .equipment
            .iter()
            .filter(|piece| piece.slot == slot)
            .cloned()
            .collect();
        Ok(closest(&slotted, target, |piece| piece.rarity))
    }

    async fn enemies_in_range(&self, range: ValueRange) -> Result<Vec<Enemy>, DomainError> {
        Ok(in_range(&self.catalog()?.enemies, range, |enemy| {
            enemy.difficulty
        }))
    }

    async fn closest_enemy(&self, target: i32) -> Result<Option<Enemy>, DomainError> {
        Ok(closest(&self.catalog()?.enemies, target, |enemy| {
            enemy.difficulty
        }))
    }
}

/// A repository whose every call fails with an infrastructure error. Useful
/// for testing error-handling paths.
#[derive(Debug)]
pub struct FailingGameRepository;

fn refused() -> DomainError {
    DomainError::Infrastructure("connection refused".into())
}

#[async_trait]
impl GameRepository for FailingGameRepository {
    async fn load_campaign(&self, _campaign_id: Uuid) -> Result<Campaign, DomainError> {
        Err(refused())
    }

    async fn load_character(&self, _campaign_id: Uuid) -> Result<Character, DomainError> {
        Err(refused())
    }

    async fn load_loadout(&self, _character: &Character) -> Result<Loadout, DomainError> {
        Err(refused())
    }

    async fn load_inventory(
        &self,
        _character_id: Uuid,
    ) -> Result<Vec<InventoryEntry>, DomainError> {
        Err(refused())
    }

    async fn recent_events(
        &self,
        _campaign_id: Uuid,
        _limit: i64,
    ) -> Result<Vec<GameEvent>, DomainError> {
        Err(refused())
    }

    async fn count_events_of_type(
        &self,
        _campaign_id: Uuid,
        _event_type: EventType,
    ) -> Result<i64, DomainError> {
        Err(refused())
    }

    async fn create_campaign(
        &self,
        _campaign: &Campaign,
        _character: &Character,
    ) -> Result<(), DomainError> {
        Err(refused())
    }

    async fn commit_turn(&self, _turn: &TurnChanges) -> Result<(), DomainError> {
        Err(refused())
    }

    async fn delete_campaign(&self, _campaign_id: Uuid) -> Result<(), DomainError> {
        Err(refused())
    }
}
