//! Combat snapshots.
//!
//! A snapshot is the per-campaign working copy of everything a fight can
//! change: enemy and character hit points, combat-only buffs and the
//! inventory carried into the fight. Combat turns mutate only the snapshot.
//! When the fight ends, [`CombatSnapshot::reconcile`] yields the single set
//! of durable writes, and the snapshot is cleared. Snapshots live in memory
//! and do not survive a restart.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::StatType;

use crate::domain::campaign::{Character, InventoryEntry};
use crate::domain::catalog::Enemy;

/// Working state of one encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    /// Campaign in combat.
    pub campaign_id: Uuid,
    /// Enemy being fought.
    pub enemy: Enemy,
    /// Enemy's remaining hit points.
    pub enemy_current_hp: i32,
    /// Whether the enemy is boss-tier.
    pub boss: bool,
    /// Character as it was when the fight began.
    pub character: Character,
    /// Armor bonus at the start of the fight.
    pub armor_bonus: i32,
    /// Character's live hit points.
    pub character_hp: i32,
    /// Item ids held when the fight began, one per row.
    pub original_inventory: Vec<Uuid>,
    /// Rows still held.
    pub inventory: Vec<InventoryEntry>,
    /// Combat-only attack bonus.
    pub attack_buff: i32,
    /// Combat-only defense bonus.
    pub defense_buff: i32,
    /// Lines narrated during the fight.
    pub combat_log: Vec<String>,
    /// Event number of the encounter event.
    pub encounter_event_number: i64,
}

/// Durable writes produced when an encounter ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Character hit points to persist.
    pub character_hp: i32,
    /// Item ids to remove from durable inventory, one row each.
    pub consumed_items: Vec<Uuid>,
}

impl CombatSnapshot {
    /// Opens a snapshot from the character's current durable state.
    #[must_use]
    pub fn open(
        enemy: Enemy,
        boss: bool,
        character: &Character,
        armor_bonus: i32,
        inventory: Vec<InventoryEntry>,
        encounter_event_number: i64,
    ) -> Self {
        Self {
            campaign_id: character.campaign_id,
            enemy_current_hp: enemy.health,
            enemy,
            boss,
            character: character.clone(),
            armor_bonus,
            character_hp: character.current_health,
            original_inventory: inventory.iter().map(|entry| entry.item.id).collect(),
            inventory,
            attack_buff: 0,
            defense_buff: 0,
            combat_log: Vec::new(),
            encounter_event_number,
        }
    }

    /// Attack including combat buffs.
    #[must_use]
    pub fn effective_attack(&self) -> i32 {
        self.character.attack.saturating_add(self.attack_buff)
    }

    /// Defense including combat buffs.
    #[must_use]
    pub fn effective_defense(&self) -> i32 {
        self.character.defense.saturating_add(self.defense_buff)
    }

    /// Health ceiling including armor.
    #[must_use]
    pub fn true_max_health(&self) -> i32 {
        self.character.true_max_health(self.armor_bonus)
    }

    /// Whether the enemy has fallen.
    #[must_use]
    pub fn enemy_defeated(&self) -> bool {
        self.enemy_current_hp <= 0
    }

    /// Whether the character has fallen.
    #[must_use]
    pub fn character_defeated(&self) -> bool {
        self.character_hp <= 0
    }

    /// Multiset difference between the inventory carried in and the
    /// inventory still held, in original order.
    #[must_use]
    pub fn consumed_items(&self) -> Vec<Uuid> {
        let mut remaining: HashMap<Uuid, usize> = HashMap::new();
        for entry in &self.inventory {
            *remaining.entry(entry.item.id).or_default() += 1;
        }
        let mut consumed = Vec::new();
        for item_id in &self.original_inventory {
            match remaining.get_mut(item_id) {
                Some(count) if *count > 0 => *count -= 1,
                _ => consumed.push(*item_id),
            }
        }
        consumed
    }

    /// Removes one row holding `item_id` from the in-combat inventory.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the item is not held.
    pub fn take_item(&mut self, item_id: Uuid) -> Result<InventoryEntry, DomainError> {
        let position = self
            .inventory
            .iter()
            .position(|entry| entry.item.id == item_id)
            .ok_or_else(|| DomainError::not_found("inventory item", item_id))?;
        Ok(self.inventory.remove(position))
    }

    /// Adds a combat-only buff. Health is not a buffable stat.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `stat` is health.
    pub fn add_buff(&mut self, stat: StatType, delta: i32) -> Result<(), DomainError> {
        match stat {
            StatType::Attack => self.attack_buff = self.attack_buff.saturating_add(delta),
            StatType::Defense => self.defense_buff = self.defense_buff.saturating_add(delta),
            StatType::Health => {
                return Err(DomainError::Validation(
                    "health cannot be buffed temporarily".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Shifts the character's hit points, clamped to `0..=true max`.
    pub fn shift_character_hp(&mut self, delta: i32) {
        self.character_hp = self
            .character_hp
            .saturating_add(delta)
            .clamp(0, self.true_max_health());
    }

    /// Durable writes for the end of this encounter. Buffs are dropped.
    #[must_use]
    pub fn reconcile(&self) -> Reconciliation {
        Reconciliation {
            character_hp: self.character_hp.clamp(0, self.true_max_health()),
            consumed_items: self.consumed_items(),
        }
    }
}

fn no_combat(campaign_id: Uuid) -> DomainError {
    DomainError::Validation(format!("no active combat for campaign {campaign_id}"))
}

/// Keyed store of active snapshots, at most one per campaign.
#[derive(Debug, Default)]
pub struct CombatSnapshotStore {
    snapshots: Mutex<HashMap<Uuid, CombatSnapshot>>,
}

impl CombatSnapshotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, CombatSnapshot>>, DomainError> {
        self.snapshots
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("snapshot store poisoned: {e}")))
    }

    fn with_snapshot<R>(
        &self,
        campaign_id: Uuid,
        f: impl FnOnce(&mut CombatSnapshot) -> Result<R, DomainError>,
    ) -> Result<R, DomainError> {
        let mut snapshots = self.guard()?;
        let snapshot = snapshots
            .get_mut(&campaign_id)
            .ok_or_else(|| no_combat(campaign_id))?;
        f(snapshot)
    }

    /// Stores a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the campaign already has one.
    pub fn create(&self, snapshot: CombatSnapshot) -> Result<(), DomainError> {
        let mut snapshots = self.guard()?;
        if snapshots.contains_key(&snapshot.campaign_id) {
            return Err(DomainError::Validation(format!(
                "campaign {} is already in combat",
                snapshot.campaign_id
            )));
        }
        debug!(
            campaign_id = %snapshot.campaign_id,
            enemy = %snapshot.enemy.name,
            "combat snapshot opened"
        );
        snapshots.insert(snapshot.campaign_id, snapshot);
        Ok(())
    }

    /// A copy of the campaign's snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is poisoned.
    pub fn get(&self, campaign_id: Uuid) -> Result<Option<CombatSnapshot>, DomainError> {
        Ok(self.guard()?.get(&campaign_id).cloned())
    }

    /// Whether the campaign has a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is poisoned.
    pub fn contains(&self, campaign_id: Uuid) -> Result<bool, DomainError> {
        Ok(self.guard()?.contains_key(&campaign_id))
    }

    /// Sets the enemy's hit points.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there is no snapshot.
    pub fn update_enemy_hp(&self, campaign_id: Uuid, hp: i32) -> Result<(), DomainError> {
        self.with_snapshot(campaign_id, |snapshot| {
            snapshot.enemy_current_hp = hp;
            Ok(())
        })
    }

    /// Sets the character's hit points, clamped to `0..=true max`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there is no snapshot.
    pub fn update_character_hp(&self, campaign_id: Uuid, hp: i32) -> Result<(), DomainError> {
        self.with_snapshot(campaign_id, |snapshot| {
            snapshot.character_hp = hp.clamp(0, snapshot.true_max_health());
            Ok(())
        })
    }

    /// Adds a combat-only buff. Health is not a buffable stat.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there is no snapshot or `stat`
    /// is health.
    pub fn apply_temporary_buff(
        &self,
        campaign_id: Uuid,
        stat: StatType,
        delta: i32,
    ) -> Result<(), DomainError> {
        self.with_snapshot(campaign_id, |snapshot| snapshot.add_buff(stat, delta))
    }

    /// Removes one row holding `item_id` from the in-combat inventory.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there is no snapshot, or
    /// `DomainError::NotFound` if the item is not held.
    pub fn remove_item(
        &self,
        campaign_id: Uuid,
        item_id: Uuid,
    ) -> Result<InventoryEntry, DomainError> {
        self.with_snapshot(campaign_id, |snapshot| snapshot.take_item(item_id))
    }

    /// Appends a narrated line.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there is no snapshot.
    pub fn append_combat_log(&self, campaign_id: Uuid, line: String) -> Result<(), DomainError> {
        self.with_snapshot(campaign_id, |snapshot| {
            snapshot.combat_log.push(line);
            Ok(())
        })
    }

    /// Discards the campaign's snapshot, returning it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is poisoned.
    pub fn clear(&self, campaign_id: Uuid) -> Result<Option<CombatSnapshot>, DomainError> {
        let removed = self.guard()?.remove(&campaign_id);
        if removed.is_some() {
            debug!(%campaign_id, "combat snapshot cleared");
        }
        Ok(removed)
    }
}
