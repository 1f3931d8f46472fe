//! Row decoding shared by the repositories.

use std::fmt::Display;
use std::str::FromStr;

use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use wayfarer_core::error::DomainError;
use wayfarer_game::domain::campaign::{Campaign, Character, InventoryEntry};
use wayfarer_game::domain::catalog::{BaseStats, Enemy, Equipment, Item};
use wayfarer_game::domain::event::{EventData, GameEvent};

/// Wraps any driver error as an infrastructure failure.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn db_error(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

/// Parses a text column into one of the shared vocabulary enums.
fn parse<T>(row: &PgRow, column: &str) -> Result<T, DomainError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = row.try_get(column).map_err(db_error)?;
    raw.parse().map_err(|e| {
        DomainError::Infrastructure(format!("invalid {column} '{raw}' in database: {e}"))
    })
}

pub(crate) fn campaign(row: &PgRow) -> Result<Campaign, DomainError> {
    Ok(Campaign {
        id: row.try_get("id").map_err(db_error)?,
        account_id: row.try_get("account_id").map_err(db_error)?,
        name: row.try_get("name").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        state: parse(row, "state")?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        updated_at: row.try_get("updated_at").map_err(db_error)?,
    })
}

/// Expects `race_name` and `class_name` joined in.
pub(crate) fn character(row: &PgRow) -> Result<Character, DomainError> {
    Ok(Character {
        id: row.try_get("id").map_err(db_error)?,
        campaign_id: row.try_get("campaign_id").map_err(db_error)?,
        name: row.try_get("name").map_err(db_error)?,
        race_id: row.try_get("race_id").map_err(db_error)?,
        race_name: row.try_get("race_name").map_err(db_error)?,
        class_id: row.try_get("class_id").map_err(db_error)?,
        class_name: row.try_get("class_name").map_err(db_error)?,
        current_health: row.try_get("current_health").map_err(db_error)?,
        max_health: row.try_get("max_health").map_err(db_error)?,
        attack: row.try_get("attack").map_err(db_error)?,
        defense: row.try_get("defense").map_err(db_error)?,
        weapon_id: row.try_get("weapon_id").map_err(db_error)?,
        armor_id: row.try_get("armor_id").map_err(db_error)?,
        shield_id: row.try_get("shield_id").map_err(db_error)?,
        sprite_path: row.try_get("sprite_path").map_err(db_error)?,
    })
}

pub(crate) fn base_stats(row: &PgRow) -> Result<BaseStats, DomainError> {
    Ok(BaseStats {
        vitality: row.try_get("vitality").map_err(db_error)?,
        attack: row.try_get("attack").map_err(db_error)?,
        defense: row.try_get("defense").map_err(db_error)?,
    })
}

pub(crate) fn item(row: &PgRow) -> Result<Item, DomainError> {
    Ok(Item {
        id: row.try_get("id").map_err(db_error)?,
        name: row.try_get("name").map_err(db_error)?,
        rarity: row.try_get("rarity").map_err(db_error)?,
        stat: parse(row, "stat_modified")?,
        value: row.try_get("stat_value").map_err(db_error)?,
    })
}

/// Expects the inventory row id aliased as `entry_id` next to the item columns.
pub(crate) fn inventory_entry(row: &PgRow) -> Result<InventoryEntry, DomainError> {
    Ok(InventoryEntry {
        id: row.try_get("entry_id").map_err(db_error)?,
        item: item(row)?,
    })
}

pub(crate) fn equipment(row: &PgRow) -> Result<Equipment, DomainError> {
    Ok(Equipment {
        id: row.try_get("id").map_err(db_error)?,
        name: row.try_get("name").map_err(db_error)?,
        rarity: row.try_get("rarity").map_err(db_error)?,
        slot: parse(row, "slot")?,
        bonus: row.try_get("bonus").map_err(db_error)?,
    })
}

pub(crate) fn enemy(row: &PgRow) -> Result<Enemy, DomainError> {
    Ok(Enemy {
        id: row.try_get("id").map_err(db_error)?,
        name: row.try_get("name").map_err(db_error)?,
        health: row.try_get("health").map_err(db_error)?,
        attack: row.try_get("attack").map_err(db_error)?,
        defense: row.try_get("defense").map_err(db_error)?,
        difficulty: row.try_get("difficulty").map_err(db_error)?,
    })
}

pub(crate) fn game_event(row: &PgRow) -> Result<GameEvent, DomainError> {
    let event_data: Option<Json<EventData>> = row.try_get("event_data").map_err(db_error)?;
    Ok(GameEvent {
        id: row.try_get("id").map_err(db_error)?,
        campaign_id: row.try_get("campaign_id").map_err(db_error)?,
        message: row.try_get("message").map_err(db_error)?,
        event_number: row.try_get("event_number").map_err(db_error)?,
        event_type: parse(row, "event_type")?,
        event_data: event_data.map(|Json(data)| data),
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}
