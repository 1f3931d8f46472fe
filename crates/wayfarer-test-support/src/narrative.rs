//! Scripted narrative generator.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use wayfarer_core::vocabulary::EventType;
use wayfarer_narrative::context::{CharacterSummary, FeaturedItem, NarrativeContext, Scene};
use wayfarer_narrative::error::NarrativeError;
use wayfarer_narrative::generator::{NarrativeGenerator, RawItemDrop, RawStatBoost};

/// A generator that answers from queued scripts and records every scene it
/// was asked to describe, along with the character it was shown.
///
/// Descriptions are `"<scene debug> #<event number>"` so tests can assert on
/// what was narrated without depending on prose. An exhausted script answers
/// with `NarrativeError::Unavailable`, which exercises the narrator's
/// fallbacks.
#[derive(Debug, Default)]
pub struct ScriptedNarrativeGenerator {
    event_types: Mutex<VecDeque<String>>,
    stat_boosts: Mutex<VecDeque<RawStatBoost>>,
    item_drops: Mutex<VecDeque<RawItemDrop>>,
    scenes: Mutex<Vec<Scene>>,
    characters: Mutex<Vec<CharacterSummary>>,
    failing: bool,
}

impl ScriptedNarrativeGenerator {
    /// A generator with empty scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose every call fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Queues raw event-type answers.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_event_types(self, answers: &[&str]) -> Self {
        self.event_types
            .lock()
            .unwrap()
            .extend(answers.iter().map(|answer| (*answer).to_owned()));
        self
    }

    /// Queues raw stat-boost answers.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_stat_boosts(self, answers: &[(&str, i64)]) -> Self {
        self.stat_boosts
            .lock()
            .unwrap()
            .extend(answers.iter().map(|(stat, value)| RawStatBoost {
                stat_type: (*stat).to_owned(),
                base_value: *value,
            }));
        self
    }

    /// Queues raw item-drop answers.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_item_drops(self, answers: Vec<RawItemDrop>) -> Self {
        self.item_drops.lock().unwrap().extend(answers);
        self
    }

    /// Scenes described so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn scenes(&self) -> Vec<Scene> {
        self.scenes.lock().unwrap().clone()
    }

    /// Character summaries passed with each description, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn characters(&self) -> Vec<CharacterSummary> {
        self.characters.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), NarrativeError> {
        if self.failing {
            Err(NarrativeError::Unavailable("scripted failure".into()))
        } else {
            Ok(())
        }
    }
}

fn exhausted(what: &str) -> NarrativeError {
    NarrativeError::Unavailable(format!("{what} script exhausted"))
}

#[async_trait]
impl NarrativeGenerator for ScriptedNarrativeGenerator {
    async fn propose_event_type(
        &self,
        _context: &NarrativeContext,
    ) -> Result<String, NarrativeError> {
        self.check()?;
        self.event_types
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| exhausted("event type"))
    }

    async fn generate_description(
        &self,
        scene: Scene,
        context: &NarrativeContext,
        _featured: Option<&FeaturedItem>,
    ) -> Result<String, NarrativeError> {
        self.scenes.lock().unwrap().push(scene);
        self.characters
            .lock()
            .unwrap()
            .push(context.character.clone());
        self.check()?;
        Ok(format!("{scene:?} #{}", context.event_number))
    }

    async fn propose_stat_boost(
        &self,
        _context: &NarrativeContext,
        _category: EventType,
    ) -> Result<RawStatBoost, NarrativeError> {
        self.check()?;
        self.stat_boosts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| exhausted("stat boost"))
    }

    async fn propose_item_drop(
        &self,
        _context: &NarrativeContext,
    ) -> Result<RawItemDrop, NarrativeError> {
        self.check()?;
        self.item_drops
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| exhausted("item drop"))
    }
}
