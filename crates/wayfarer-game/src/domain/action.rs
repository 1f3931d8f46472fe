//! Player actions and game phases.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfarer_core::error::DomainError;

/// Choice label for exploring onward.
pub const CHOICE_CONTINUE: &str = "Continue Forward";
/// Choice label for accepting an investigation prompt.
pub const CHOICE_INVESTIGATE: &str = "Investigate";
/// Choice label for declining an investigation prompt.
pub const CHOICE_DECLINE: &str = "Decline";
/// Choice label for attacking.
pub const CHOICE_ATTACK: &str = "Attack";
/// Choice label for fleeing.
pub const CHOICE_FLEE: &str = "Flee";
/// Choice label for using an item in combat.
pub const CHOICE_USE_ITEM: &str = "Use Item";

/// Where a campaign is in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Free to continue forward.
    Exploration,
    /// Waiting on investigate/decline.
    InvestigationPrompt,
    /// In an active encounter.
    Combat,
    /// The character has fallen. Terminal.
    GameOver,
    /// The boss is defeated. Terminal.
    Victory,
}

impl GamePhase {
    /// Whether no further actions are accepted.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }

    /// Choices offered in this phase.
    #[must_use]
    pub fn choices(self, has_items: bool) -> Vec<String> {
        let labels: &[&str] = match self {
            GamePhase::Exploration => &[CHOICE_CONTINUE],
            GamePhase::InvestigationPrompt => &[CHOICE_INVESTIGATE, CHOICE_DECLINE],
            GamePhase::Combat if has_items => &[CHOICE_ATTACK, CHOICE_FLEE, CHOICE_USE_ITEM],
            GamePhase::Combat => &[CHOICE_ATTACK, CHOICE_FLEE],
            GamePhase::GameOver | GamePhase::Victory => &[],
        };
        labels.iter().map(|label| (*label).to_owned()).collect()
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GamePhase::Exploration => "exploration",
            GamePhase::InvestigationPrompt => "investigation_prompt",
            GamePhase::Combat => "combat",
            GamePhase::GameOver => "game_over",
            GamePhase::Victory => "victory",
        })
    }
}

/// What the player asked to do.
///
/// On the wire: `{"action_type": "...", "action_data": {...}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action_type", content = "action_data", rename_all = "snake_case")]
pub enum ActionType {
    /// Explore onward.
    Continue,
    /// Accept the pending investigation prompt.
    Investigate,
    /// Pass on the pending investigation prompt.
    Decline,
    /// Strike the enemy.
    Attack,
    /// Try to escape.
    Flee,
    /// Consume one item from the in-combat inventory.
    UseItemCombat {
        /// Catalog id of the item.
        item_id: Uuid,
    },
}

impl ActionType {
    /// The only phase this action is valid in.
    #[must_use]
    pub fn required_phase(self) -> GamePhase {
        match self {
            ActionType::Continue => GamePhase::Exploration,
            ActionType::Investigate | ActionType::Decline => GamePhase::InvestigationPrompt,
            ActionType::Attack | ActionType::Flee | ActionType::UseItemCombat { .. } => {
                GamePhase::Combat
            }
        }
    }

    /// Stable name for logs and errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Continue => "continue",
            ActionType::Investigate => "investigate",
            ActionType::Decline => "decline",
            ActionType::Attack => "attack",
            ActionType::Flee => "flee",
            ActionType::UseItemCombat { .. } => "use_item_combat",
        }
    }

    /// Checks the action against the current phase.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming both phases on mismatch.
    pub fn validate(self, phase: GamePhase) -> Result<(), DomainError> {
        let required = self.required_phase();
        if phase == required {
            Ok(())
        } else {
            Err(DomainError::Validation(format!(
                "action '{}' is only valid during {required}, but the game is in {phase}",
                self.as_str()
            )))
        }
    }
}

/// A player action against a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAction {
    /// Target campaign.
    pub campaign_id: Uuid,
    /// The action itself.
    #[serde(flatten)]
    pub action: ActionType,
}
