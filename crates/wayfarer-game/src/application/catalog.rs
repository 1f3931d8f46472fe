//! Nearest-match catalog selection.
//!
//! Picks a random entry whose rarity or difficulty falls inside the window
//! around a target. If the window is empty, the single closest entry is used
//! instead. Only an empty catalog is an error, and a fatal one.

use std::sync::Mutex;

use tracing::{debug, warn};
use wayfarer_core::error::DomainError;
use wayfarer_core::rng::DeterministicRng;
use wayfarer_core::vocabulary::{EquipmentSlot, StatType};
use wayfarer_rules::formulas::{difficulty_range, rarity_range};

use super::engine::with_rng;
use crate::domain::catalog::{Enemy, Equipment, Item};
use crate::domain::repository::CatalogRepository;

fn pick<T>(
    mut candidates: Vec<T>,
    rng: &Mutex<dyn DeterministicRng + Send>,
) -> Result<Option<T>, DomainError> {
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        len => {
            let max_index = u32::try_from(len - 1).unwrap_or(u32::MAX);
            let index = with_rng(rng, |rng| rng.next_u32_range(0, max_index))? as usize;
            Ok(Some(candidates.swap_remove(index.min(len - 1))))
        }
    }
}

fn empty_catalog(what: &str) -> DomainError {
    DomainError::Configuration(format!("{what} catalog is empty"))
}

/// An enemy near `difficulty`.
///
/// # Errors
///
/// Returns `DomainError::Configuration` if the enemy catalog is empty.
pub async fn select_enemy(
    catalog: &dyn CatalogRepository,
    difficulty: i32,
    variance: i32,
    rng: &Mutex<dyn DeterministicRng + Send>,
) -> Result<Enemy, DomainError> {
    let range = difficulty_range(difficulty, variance);
    if let Some(enemy) = pick(catalog.enemies_in_range(range).await?, rng)? {
        debug!(difficulty, enemy = %enemy.name, "enemy selected in range");
        return Ok(enemy);
    }
    let enemy = catalog
        .closest_enemy(difficulty)
        .await?
        .ok_or_else(|| empty_catalog("enemy"))?;
    debug!(
        difficulty,
        enemy = %enemy.name,
        actual = enemy.difficulty,
        "closest enemy selected"
    );
    Ok(enemy)
}

/// A consumable near `rarity`, preferring items that modify `preferred`.
///
/// # Errors
///
/// Returns `DomainError::Configuration` if the item catalog is empty.
pub async fn select_item(
    catalog: &dyn CatalogRepository,
    rarity: i32,
    variance: i32,
    preferred: Option<StatType>,
    rng: &Mutex<dyn DeterministicRng + Send>,
) -> Result<Item, DomainError> {
    let range = rarity_range(rarity, variance);
    let mut candidates = catalog.items_in_range(range).await?;
    if let Some(stat) = preferred {
        if candidates.iter().any(|item| item.stat == stat) {
            candidates.retain(|item| item.stat == stat);
        }
    }
    if let Some(item) = pick(candidates, rng)? {
        debug!(rarity, item = %item.name, "item selected in range");
        return Ok(item);
    }
    let item = catalog
        .closest_item(rarity)
        .await?
        .ok_or_else(|| empty_catalog("item"))?;
    debug!(rarity, item = %item.name, actual = item.rarity, "closest item selected");
    Ok(item)
}

/// Equipment for `slot` near `rarity`.
///
/// # Errors
///
/// Returns `DomainError::Configuration` if the catalog has no equipment for
/// the slot.
pub async fn select_equipment(
    catalog: &dyn CatalogRepository,
    slot: EquipmentSlot,
    rarity: i32,
    variance: i32,
    rng: &Mutex<dyn DeterministicRng + Send>,
) -> Result<Equipment, DomainError> {
    let range = rarity_range(rarity, variance);
    if let Some(piece) = pick(catalog.equipment_in_range(slot, range).await?, rng)? {
        debug!(rarity, %slot, piece = %piece.name, "equipment selected in range");
        return Ok(piece);
    }
    match catalog.closest_equipment(slot, rarity).await? {
        Some(piece) => {
            debug!(rarity, %slot, piece = %piece.name, "closest equipment selected");
            Ok(piece)
        }
        None => {
            warn!(%slot, "no equipment for slot");
            Err(empty_catalog(&format!("{slot} equipment")))
        }
    }
}
