//! `PostgreSQL` implementation of the `GameRepository` trait.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::{EquipmentSlot, EventType};
use wayfarer_game::domain::campaign::{Campaign, Character, InventoryEntry, Loadout};
use wayfarer_game::domain::event::GameEvent;
use wayfarer_game::domain::repository::GameRepository;
use wayfarer_game::domain::turn::TurnChanges;

use crate::rows::{self, db_error};

const CHARACTER_COLUMNS: &str = r"
SELECT c.id, c.campaign_id, c.name, c.race_id, r.name AS race_name,
       c.class_id, k.name AS class_name, c.current_health, c.max_health,
       c.attack, c.defense, c.weapon_id, c.armor_id, c.shield_id, c.sprite_path
FROM characters c
JOIN races r ON r.id = c.race_id
JOIN classes k ON k.id = c.class_id
";

const EVENT_COLUMNS: &str =
    "SELECT id, campaign_id, message, event_number, event_type, event_data, created_at FROM game_events";

/// PostgreSQL-backed campaign and event-log repository.
#[derive(Debug, Clone)]
pub struct PgGameRepository {
    pool: PgPool,
}

impl PgGameRepository {
    /// Creates a new `PgGameRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a failed event insert, turning a taken event number into a
/// concurrency conflict.
fn event_insert_error(err: sqlx::Error, campaign_id: Uuid, event_number: i64) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return DomainError::ConcurrencyConflict {
                campaign_id,
                event_number,
            };
        }
    }
    db_error(err)
}

async fn insert_event(
    tx: &mut Transaction<'_, Postgres>,
    event: &GameEvent,
) -> Result<(), DomainError> {
    sqlx::query(
        r"INSERT INTO game_events
              (id, campaign_id, message, event_number, event_type, event_data, created_at)
          VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(event.id)
    .bind(event.campaign_id)
    .bind(&event.message)
    .bind(event.event_number)
    .bind(event.event_type.as_str())
    .bind(event.event_data.as_ref().map(Json))
    .bind(event.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| event_insert_error(e, event.campaign_id, event.event_number))?;
    Ok(())
}

async fn update_character(
    tx: &mut Transaction<'_, Postgres>,
    character: &Character,
) -> Result<(), DomainError> {
    let result = sqlx::query(
        r"UPDATE characters
          SET current_health = $2, max_health = $3, attack = $4, defense = $5,
              weapon_id = $6, armor_id = $7, shield_id = $8
          WHERE id = $1",
    )
    .bind(character.id)
    .bind(character.current_health)
    .bind(character.max_health)
    .bind(character.attack)
    .bind(character.defense)
    .bind(character.weapon_id)
    .bind(character.armor_id)
    .bind(character.shield_id)
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;
    if result.rows_affected() == 0 {
        return Err(DomainError::not_found("character", character.id));
    }
    Ok(())
}

/// Deletes exactly one inventory row holding `item_id`, oldest first.
async fn remove_one_item(
    tx: &mut Transaction<'_, Postgres>,
    character_id: Uuid,
    item_id: Uuid,
) -> Result<(), DomainError> {
    let result = sqlx::query(
        r"DELETE FROM inventory
          WHERE id = (
              SELECT id FROM inventory
              WHERE character_id = $1 AND item_id = $2
              ORDER BY seq
              LIMIT 1
          )",
    )
    .bind(character_id)
    .bind(item_id)
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;
    if result.rows_affected() == 0 {
        return Err(DomainError::not_found("inventory item", item_id));
    }
    Ok(())
}

async fn insert_item(
    tx: &mut Transaction<'_, Postgres>,
    turn: &TurnChanges,
    entry: &InventoryEntry,
) -> Result<(), DomainError> {
    sqlx::query(
        r"INSERT INTO inventory (id, character_id, item_id, acquired_at)
          VALUES ($1, $2, $3, $4)",
    )
    .bind(entry.id)
    .bind(turn.character_id)
    .bind(entry.item.id)
    .bind(turn.committed_at)
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;
    Ok(())
}

#[async_trait]
impl GameRepository for PgGameRepository {
    async fn load_campaign(&self, campaign_id: Uuid) -> Result<Campaign, DomainError> {
        let row = sqlx::query(
            r"SELECT id, account_id, name, description, state, created_at, updated_at
              FROM campaigns WHERE id = $1",
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| DomainError::not_found("campaign", campaign_id))?;
        rows::campaign(&row)
    }

    async fn load_character(&self, campaign_id: Uuid) -> Result<Character, DomainError> {
        let row = sqlx::query(&format!("{CHARACTER_COLUMNS} WHERE c.campaign_id = $1"))
            .bind(campaign_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or_else(|| DomainError::not_found("character", campaign_id))?;
        rows::character(&row)
    }

    async fn load_loadout(&self, character: &Character) -> Result<Loadout, DomainError> {
        let equipped: Vec<Uuid> = EquipmentSlot::ALL
            .into_iter()
            .filter_map(|slot| character.equipped(slot))
            .collect();
        if equipped.is_empty() {
            return Ok(Loadout::default());
        }

        let found = sqlx::query(
            "SELECT id, name, rarity, slot, bonus FROM equipment WHERE id = ANY($1)",
        )
        .bind(&equipped)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(rows::equipment)
        .collect::<Result<Vec<_>, _>>()?;

        let mut loadout = Loadout::default();
        for piece_id in equipped {
            let piece = found
                .iter()
                .find(|piece| piece.id == piece_id)
                .cloned()
                .ok_or_else(|| DomainError::not_found("equipment", piece_id))?;
            loadout.set(piece);
        }
        Ok(loadout)
    }

    async fn load_inventory(&self, character_id: Uuid) -> Result<Vec<InventoryEntry>, DomainError> {
        sqlx::query(
            r"SELECT inv.id AS entry_id, i.id, i.name, i.rarity, i.stat_modified, i.stat_value
              FROM inventory inv
              JOIN items i ON i.id = inv.item_id
              WHERE inv.character_id = $1
              ORDER BY inv.seq",
        )
        .bind(character_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(rows::inventory_entry)
        .collect()
    }

    async fn recent_events(
        &self,
        campaign_id: Uuid,
        limit: i64,
    ) -> Result<Vec<GameEvent>, DomainError> {
        sqlx::query(&format!(
            "{EVENT_COLUMNS} WHERE campaign_id = $1 ORDER BY event_number DESC LIMIT $2"
        ))
        .bind(campaign_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(rows::game_event)
        .collect()
    }

    async fn count_events_of_type(
        &self,
        campaign_id: Uuid,
        event_type: EventType,
    ) -> Result<i64, DomainError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM game_events WHERE campaign_id = $1 AND event_type = $2",
        )
        .bind(campaign_id)
        .bind(event_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    #[instrument(skip_all, fields(campaign_id = %campaign.id))]
    async fn create_campaign(
        &self,
        campaign: &Campaign,
        character: &Character,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            r"INSERT INTO campaigns (id, account_id, name, description, state, created_at, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(campaign.id)
        .bind(campaign.account_id)
        .bind(&campaign.name)
        .bind(&campaign.description)
        .bind(campaign.state.as_str())
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query(
            r"INSERT INTO characters
                  (id, campaign_id, name, race_id, class_id, current_health, max_health,
                   attack, defense, weapon_id, armor_id, shield_id, sprite_path)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(character.id)
        .bind(character.campaign_id)
        .bind(&character.name)
        .bind(character.race_id)
        .bind(character.class_id)
        .bind(character.current_health)
        .bind(character.max_health)
        .bind(character.attack)
        .bind(character.defense)
        .bind(character.weapon_id)
        .bind(character.armor_id)
        .bind(character.shield_id)
        .bind(&character.sprite_path)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        debug!("campaign persisted");
        Ok(())
    }

    #[instrument(skip_all, fields(campaign_id = %turn.campaign_id, events = turn.events.len()))]
    async fn commit_turn(&self, turn: &TurnChanges) -> Result<(), DomainError> {
        // Dropping the transaction on any early return rolls everything back.
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        for event in &turn.events {
            insert_event(&mut tx, event).await?;
        }
        if let Some(character) = &turn.character {
            update_character(&mut tx, character).await?;
        }
        for item_id in &turn.inventory_removed {
            remove_one_item(&mut tx, turn.character_id, *item_id).await?;
        }
        for entry in &turn.inventory_added {
            insert_item(&mut tx, turn, entry).await?;
        }

        let result = sqlx::query(
            r"UPDATE campaigns
              SET state = COALESCE($2, state), updated_at = $3
              WHERE id = $1",
        )
        .bind(turn.campaign_id)
        .bind(turn.campaign_state.map(|state| state.as_str()))
        .bind(turn.committed_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("campaign", turn.campaign_id));
        }

        tx.commit().await.map_err(db_error)?;
        debug!(
            added = turn.inventory_added.len(),
            removed = turn.inventory_removed.len(),
            "turn committed"
        );
        Ok(())
    }

    async fn delete_campaign(&self, campaign_id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(campaign_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("campaign", campaign_id));
        }
        Ok(())
    }
}
