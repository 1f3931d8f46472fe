//! Pending investigation prompts.
//!
//! When exploration turns up something other than plain travel, the engine
//! parks the event type here and asks the player whether to investigate.
//! One prompt per campaign; in memory only.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::EventType;

/// A "you sense something" prompt awaiting the player's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationPrompt {
    /// Campaign awaiting the answer.
    pub campaign_id: Uuid,
    /// The event that investigating will resolve.
    pub event_type: EventType,
    /// Flavor text shown to the player.
    pub message: String,
}

/// Keyed store of pending prompts, at most one per campaign.
#[derive(Debug, Default)]
pub struct InvestigationPromptStore {
    prompts: Mutex<HashMap<Uuid, InvestigationPrompt>>,
}

impl InvestigationPromptStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, InvestigationPrompt>>, DomainError> {
        self.prompts
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("prompt store poisoned: {e}")))
    }

    /// Stores a prompt.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the campaign already has one.
    pub fn create(&self, prompt: InvestigationPrompt) -> Result<(), DomainError> {
        let mut prompts = self.guard()?;
        if prompts.contains_key(&prompt.campaign_id) {
            return Err(DomainError::Validation(format!(
                "campaign {} already has a pending investigation",
                prompt.campaign_id
            )));
        }
        prompts.insert(prompt.campaign_id, prompt);
        Ok(())
    }

    /// A copy of the campaign's prompt.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is poisoned.
    pub fn get(&self, campaign_id: Uuid) -> Result<Option<InvestigationPrompt>, DomainError> {
        Ok(self.guard()?.get(&campaign_id).cloned())
    }

    /// Removes and returns the campaign's prompt.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is poisoned.
    pub fn clear(&self, campaign_id: Uuid) -> Result<Option<InvestigationPrompt>, DomainError> {
        Ok(self.guard()?.remove(&campaign_id))
    }
}
