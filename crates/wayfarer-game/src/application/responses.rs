//! Response payloads returned to the HTTP layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::{EquipmentSlot, StatType};
use wayfarer_narrative::context::CombatEnding;
use wayfarer_rules::dice::RollClass;

use super::prompt_store::InvestigationPrompt;
use crate::domain::action::GamePhase;
use crate::domain::campaign::{Campaign, Character, InventoryEntry, Loadout};
use crate::domain::catalog::{Enemy, Equipment, Item};
use crate::domain::event::GameEvent;

/// The enemy of an active encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyState {
    /// Catalog entry.
    pub enemy: Enemy,
    /// Remaining hit points.
    pub current_hp: i32,
    /// Boss-tier enemies cannot be fled from.
    pub boss: bool,
    /// Combat-only attack bonus of the character.
    pub attack_buff: i32,
    /// Combat-only defense bonus of the character.
    pub defense_buff: i32,
    /// Lines narrated so far in this encounter.
    pub combat_log: Vec<String>,
}

/// Full reconstructable view of a campaign.
///
/// During combat, character hit points and inventory come from the combat
/// snapshot rather than durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// The campaign.
    pub campaign: Campaign,
    /// The character with live stats.
    pub character: Character,
    /// Health ceiling including armor.
    pub true_max_health: i32,
    /// Equipped pieces.
    pub equipment: Loadout,
    /// Inventory rows.
    pub inventory: Vec<InventoryEntry>,
    /// Current enemy, in combat.
    pub enemy: Option<EnemyState>,
    /// Most recent events, newest first.
    pub recent_events: Vec<GameEvent>,
    /// Current phase.
    pub phase: GamePhase,
    /// Pending investigation prompt, if any.
    pub pending_prompt: Option<InvestigationPrompt>,
    /// Consecutive descriptive events.
    pub descriptive_streak: u32,
    /// Number of the latest logged event.
    pub event_count: i64,
    /// Events a campaign may run to.
    pub max_event_count: i64,
}

impl GameState {
    /// Choices valid in the current phase.
    #[must_use]
    pub fn choices(&self) -> Vec<String> {
        self.phase.choices(!self.inventory.is_empty())
    }
}

/// What happened in one combat action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    /// The d20 roll, for actions that roll.
    pub dice_roll: Option<u32>,
    /// Band of the roll.
    pub roll_class: Option<RollClass>,
    /// Damage dealt to the enemy.
    pub damage_dealt: Option<i32>,
    /// Damage taken by the character.
    pub damage_received: Option<i32>,
    /// Enemy hit points after the action.
    pub enemy_hp: i32,
    /// Character hit points after the action.
    pub character_hp: i32,
    /// Set when the encounter ended.
    pub outcome: Option<CombatEnding>,
    /// A flee attempt was refused by a boss.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub flee_refused: bool,
    /// Item consumed by a use-item action.
    pub item_used: Option<Item>,
}

/// Loot found by an item drop or combat reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFound {
    /// Catalog id.
    pub item_id: Uuid,
    /// Display name.
    pub name: String,
    /// Rarity.
    pub rarity: i32,
    /// Stat modified.
    pub stat: StatType,
    /// Value or bonus.
    pub value: i32,
    /// Slot, for equipment.
    pub equipment_slot: Option<EquipmentSlot>,
    /// Equipment was equipped immediately.
    pub auto_equipped: bool,
    /// Equipment that was replaced.
    pub replaced_item: Option<Uuid>,
    /// The pack was full and the item stayed behind.
    pub left_behind: bool,
}

impl ItemFound {
    /// A consumable, either stowed or left behind.
    #[must_use]
    pub fn consumable(item: &Item, left_behind: bool) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            rarity: item.rarity,
            stat: item.stat,
            value: item.value,
            equipment_slot: None,
            auto_equipped: false,
            replaced_item: None,
            left_behind,
        }
    }

    /// An equipped piece.
    #[must_use]
    pub fn equipped(piece: &Equipment, replaced_item: Option<Uuid>) -> Self {
        Self {
            item_id: piece.id,
            name: piece.name.clone(),
            rarity: piece.rarity,
            stat: piece.slot.stat(),
            value: piece.bonus,
            equipment_slot: Some(piece.slot),
            auto_equipped: true,
            replaced_item,
            left_behind: false,
        }
    }
}

/// Result of one resolved action, before it is wrapped for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Narrative text for the turn.
    pub message: String,
    /// State after the turn.
    pub game_state: GameState,
    /// Combat details, for combat actions.
    pub combat_result: Option<CombatResult>,
    /// Loot, when something was found.
    pub item_found: Option<ItemFound>,
}

/// Envelope returned for every player action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameServiceResponse {
    /// Whether the action was applied.
    pub success: bool,
    /// State after the action; on failure, the unchanged state if loadable.
    pub game_state: Option<GameState>,
    /// Narrative text, or a summary of the failure.
    pub message: String,
    /// Choices valid next.
    pub choices: Vec<String>,
    /// Failure description.
    pub error: Option<String>,
    /// Combat details.
    pub combat_result: Option<CombatResult>,
    /// Loot found.
    pub item_found: Option<ItemFound>,
}

impl GameServiceResponse {
    /// Wraps a successful turn.
    #[must_use]
    pub fn success(outcome: TurnOutcome) -> Self {
        Self {
            success: true,
            choices: outcome.game_state.choices(),
            game_state: Some(outcome.game_state),
            message: outcome.message,
            error: None,
            combat_result: outcome.combat_result,
            item_found: outcome.item_found,
        }
    }

    /// Wraps a failed action. Nothing was mutated.
    #[must_use]
    pub fn failure(error: &DomainError, game_state: Option<GameState>) -> Self {
        Self {
            success: false,
            choices: game_state.as_ref().map(GameState::choices).unwrap_or_default(),
            game_state,
            message: "The action could not be completed.".to_owned(),
            error: Some(error.to_string()),
            combat_result: None,
            item_found: None,
        }
    }
}
