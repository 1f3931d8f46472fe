//! Raw narrative generator trait.
//!
//! Implementations wrap a text-generation backend. Their answers are loosely
//! typed on purpose: validating and defaulting them is the job of
//! [`crate::narrator::Narrator`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wayfarer_core::vocabulary::EventType;

use crate::context::{FeaturedItem, NarrativeContext, Scene};
use crate::error::NarrativeError;

/// A stat boost as proposed by the generator, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatBoost {
    /// Name of the stat (`health`, `attack`, `defense`, or a loose variant).
    pub stat_type: String,
    /// Proposed base value. May be zero or absurd.
    pub base_value: i64,
}

/// An item-drop descriptor as proposed by the generator, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItemDrop {
    /// Stat the found item should preferably modify.
    #[serde(default)]
    pub stat_type: Option<String>,
    /// Short flavor phrase for where the item was found.
    #[serde(default)]
    pub flavor: Option<String>,
}

/// External text-generation capability.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Proposes the category of the next event, as free text.
    async fn propose_event_type(&self, context: &NarrativeContext)
    -> Result<String, NarrativeError>;

    /// Writes prose for `scene`, optionally featuring an item.
    async fn generate_description(
        &self,
        scene: Scene,
        context: &NarrativeContext,
        featured: Option<&FeaturedItem>,
    ) -> Result<String, NarrativeError>;

    /// Proposes which stat the surroundings affect and by how much.
    async fn propose_stat_boost(
        &self,
        context: &NarrativeContext,
        category: EventType,
    ) -> Result<RawStatBoost, NarrativeError>;

    /// Proposes a descriptor for found loot.
    async fn propose_item_drop(
        &self,
        context: &NarrativeContext,
    ) -> Result<RawItemDrop, NarrativeError>;
}
