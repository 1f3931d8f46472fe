//! `PostgreSQL` implementation of the `CatalogRepository` trait.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::EquipmentSlot;
use wayfarer_game::domain::catalog::{CharacterClass, Enemy, Equipment, Item, Race};
use wayfarer_game::domain::repository::CatalogRepository;
use wayfarer_rules::formulas::ValueRange;

use crate::rows::{self, db_error};

const ITEM_COLUMNS: &str = "SELECT id, name, rarity, stat_modified, stat_value FROM items";
const EQUIPMENT_COLUMNS: &str = "SELECT id, name, rarity, slot, bonus FROM equipment";
const ENEMY_COLUMNS: &str = "SELECT id, name, health, attack, defense, difficulty FROM enemies";

/// PostgreSQL-backed reference data: races, classes, items, equipment and
/// enemies.
///
/// Range queries return rows ordered by the ranked value. Closest-match
/// queries break distance ties toward the lower value.
#[derive(Debug, Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    /// Creates a new `PgCatalogRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn load_race(&self, race_id: Uuid) -> Result<Race, DomainError> {
        let row = sqlx::query("SELECT id, name, vitality, attack, defense FROM races WHERE id = $1")
            .bind(race_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or_else(|| DomainError::not_found("race", race_id))?;
        Ok(Race {
            id: race_id,
            name: row.try_get("name").map_err(db_error)?,
            stats: rows::base_stats(&row)?,
        })
    }

    async fn load_class(&self, class_id: Uuid) -> Result<CharacterClass, DomainError> {
        let row =
            sqlx::query("SELECT id, name, vitality, attack, defense FROM classes WHERE id = $1")
                .bind(class_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?
                .ok_or_else(|| DomainError::not_found("class", class_id))?;
        Ok(CharacterClass {
            id: class_id,
            name: row.try_get("name").map_err(db_error)?,
            stats: rows::base_stats(&row)?,
        })
    }

    async fn items_in_range(&self, range: ValueRange) -> Result<Vec<Item>, DomainError> {
        sqlx::query(&format!(
            "{ITEM_COLUMNS} WHERE rarity BETWEEN $1 AND $2 ORDER BY rarity, id"
        ))
        .bind(range.min)
        .bind(range.max)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(rows::item)
        .collect()
    }

    async fn closest_item(&self, target: i32) -> Result<Option<Item>, DomainError> {
        sqlx::query(&format!(
            "{ITEM_COLUMNS} ORDER BY ABS(rarity - $1), rarity, id LIMIT 1"
        ))
        .bind(target)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(rows::item)
        .transpose()
    }

    async fn equipment_in_range(
        &self,
        slot: EquipmentSlot,
        range: ValueRange,
    ) -> Result<Vec<Equipment>, DomainError> {
        sqlx::query(&format!(
            "{EQUIPMENT_COLUMNS} WHERE slot = $1 AND rarity BETWEEN $2 AND $3 ORDER BY rarity, id"
        ))
        .bind(slot.as_str())
        .bind(range.min)
        .bind(range.max)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(rows::equipment)
        .collect()
    }

    async fn closest_equipment(
        &self,
        slot: EquipmentSlot,
        target: i32,
    ) -> Result<Option<Equipment>, DomainError> {
        sqlx::query(&format!(
            "{EQUIPMENT_COLUMNS} WHERE slot = $1 ORDER BY ABS(rarity - $2), rarity, id LIMIT 1"
        ))
        .bind(slot.as_str())
        .bind(target)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(rows::equipment)
        .transpose()
    }

    async fn enemies_in_range(&self, range: ValueRange) -> Result<Vec<Enemy>, DomainError> {
        sqlx::query(&format!(
            "{ENEMY_COLUMNS} WHERE difficulty BETWEEN $1 AND $2 ORDER BY difficulty, id"
        ))
        .bind(range.min)
        .bind(range.max)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(rows::enemy)
        .collect()
    }

    async fn closest_enemy(&self, target: i32) -> Result<Option<Enemy>, DomainError> {
        sqlx::query(&format!(
            "{ENEMY_COLUMNS} ORDER BY ABS(difficulty - $1), difficulty, id LIMIT 1"
        ))
        .bind(target)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(rows::enemy)
        .transpose()
    }
}
