//! Validating boundary around a [`NarrativeGenerator`].
//!
//! Every call is bounded by a timeout and every answer is parsed into a
//! closed type. Failures are logged and replaced by conservative defaults so
//! a turn never stalls on narrative text.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wayfarer_core::vocabulary::{EventType, StatType};
use wayfarer_rules::config::BalanceConfig;

use crate::context::{CombatEnding, FeaturedItem, NarrativeContext, Scene};
use crate::error::NarrativeError;
use crate::generator::NarrativeGenerator;

/// Tunables for the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarratorSettings {
    /// Upper bound on a single generator call.
    pub timeout: Duration,
    /// Base value substituted for zero, absurd or failed stat proposals.
    pub default_stat_boost: i32,
    /// Largest absolute base value accepted.
    pub max_stat_boost: i32,
}

impl NarratorSettings {
    /// Default call timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

    /// Stat-boost bounds from `balance`, with the given call timeout.
    #[must_use]
    pub fn from_balance(balance: &BalanceConfig, timeout: Duration) -> Self {
        Self {
            timeout,
            default_stat_boost: balance.default_stat_boost,
            max_stat_boost: balance.max_stat_boost,
        }
    }
}

impl Default for NarratorSettings {
    fn default() -> Self {
        Self::from_balance(&BalanceConfig::default(), Self::DEFAULT_TIMEOUT)
    }
}

/// Validated stat-boost proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBoost {
    /// Stat to modify.
    pub stat: StatType,
    /// Nonzero base value, within the configured bound.
    pub base_value: i32,
}

/// Validated item-drop descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDropHint {
    /// Stat the found item should preferably modify.
    pub preferred_stat: Option<StatType>,
    /// Short flavor phrase.
    pub flavor: Option<String>,
}

/// The engine-facing narrative collaborator.
#[derive(Clone)]
pub struct Narrator {
    generator: Arc<dyn NarrativeGenerator>,
    settings: NarratorSettings,
}

impl fmt::Debug for Narrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Narrator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Finds the first event category named anywhere in free text.
fn extract_event_type(raw: &str) -> Option<EventType> {
    if let Ok(event_type) = raw.parse::<EventType>() {
        return Some(event_type);
    }
    let haystack: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    EventType::ALL
        .iter()
        .filter_map(|event_type| {
            let needle: String = event_type
                .as_str()
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .collect();
            haystack.find(&needle).map(|pos| (pos, *event_type))
        })
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, event_type)| event_type)
}

/// Generic line used when the generator cannot describe a scene.
fn fallback_description(scene: Scene, context: &NarrativeContext) -> String {
    let name = &context.character.name;
    let enemy = context
        .enemy
        .as_ref()
        .map_or("the creature", |enemy| enemy.name.as_str());
    match scene {
        Scene::Introduction => format!(
            "{name} sets out on the road of {}, the horizon heavy with unknown promise.",
            context.campaign_name
        ),
        Scene::Descriptive => format!("{name} presses onward along the winding path."),
        Scene::InvestigationHook { event_type } => match event_type {
            EventType::Combat => "You hear movement nearby. Something is watching you.".to_owned(),
            EventType::ItemDrop => "Something glints at the edge of the path.".to_owned(),
            EventType::Environmental | EventType::Descriptive => {
                "The air shifts strangely around you. You sense something unusual.".to_owned()
            }
        },
        Scene::Declined { .. } => format!("{name} decides not to linger and moves on."),
        Scene::Environmental { stat, delta } => {
            if delta >= 0 {
                format!("The surroundings invigorate {name}. Their {stat} rises by {delta}.")
            } else {
                format!(
                    "The surroundings take their toll on {name}. Their {stat} falls by {}.",
                    delta.unsigned_abs()
                )
            }
        }
        Scene::CombatEncounter { boss: true } => {
            format!("The ground trembles as {enemy} rises to bar the way. This is the final battle.")
        }
        Scene::CombatEncounter { boss: false } => format!("{enemy} lunges out to attack {name}!"),
        Scene::CombatConclusion { ending } => match ending {
            CombatEnding::EnemyDefeated => format!("{enemy} falls, and {name} stands victorious."),
            CombatEnding::CharacterDefeated => format!("{name} collapses before {enemy}."),
            CombatEnding::Fled => format!("{name} escapes from {enemy}."),
        },
        Scene::ItemDrop { left_behind: true } => {
            "You find something, but your pack is full. You leave it behind.".to_owned()
        }
        Scene::ItemDrop { left_behind: false } => format!("{name} finds something useful."),
    }
}

impl Narrator {
    /// Wraps `generator` with the given settings.
    #[must_use]
    pub fn new(generator: Arc<dyn NarrativeGenerator>, settings: NarratorSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// The active settings.
    #[must_use]
    pub fn settings(&self) -> NarratorSettings {
        self.settings
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, NarrativeError>>,
    ) -> Result<T, NarrativeError> {
        match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(NarrativeError::Timeout(self.settings.timeout)),
        }
    }

    /// Asks for the next event category. `None` if the generator fails or
    /// names no known category.
    pub async fn propose_event_type(&self, context: &NarrativeContext) -> Option<EventType> {
        match self
            .bounded(self.generator.propose_event_type(context))
            .await
        {
            Ok(raw) => {
                let parsed = extract_event_type(&raw);
                if parsed.is_none() {
                    warn!(raw = %raw, "narrator proposed an unknown event type");
                }
                parsed
            }
            Err(error) => {
                warn!(%error, "event type proposal failed");
                None
            }
        }
    }

    /// Writes prose for `scene`, falling back to a generic line.
    pub async fn describe(
        &self,
        scene: Scene,
        context: &NarrativeContext,
        featured: Option<&FeaturedItem>,
    ) -> String {
        match self
            .bounded(self.generator.generate_description(scene, context, featured))
            .await
        {
            Ok(text) if !text.trim().is_empty() => text.trim().to_owned(),
            Ok(_) => {
                warn!(?scene, "narrator returned empty text");
                fallback_description(scene, context)
            }
            Err(error) => {
                warn!(%error, ?scene, "description generation failed");
                fallback_description(scene, context)
            }
        }
    }

    /// Asks which stat the surroundings affect.
    ///
    /// A zero, out-of-range or failed proposal yields the default base value;
    /// an unknown stat falls back to health.
    pub async fn propose_stat_boost(
        &self,
        context: &NarrativeContext,
        category: EventType,
    ) -> StatBoost {
        let default = StatBoost {
            stat: StatType::Health,
            base_value: self.settings.default_stat_boost,
        };
        let raw = match self
            .bounded(self.generator.propose_stat_boost(context, category))
            .await
        {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "stat boost proposal failed");
                return default;
            }
        };

        let stat = raw.stat_type.parse::<StatType>().unwrap_or_else(|_| {
            warn!(stat_type = %raw.stat_type, "unknown stat type proposed");
            default.stat
        });
        let base_value = match i32::try_from(raw.base_value) {
            Ok(0) => {
                debug!("zero stat boost proposed, using default");
                self.settings.default_stat_boost
            }
            Ok(value) if value.unsigned_abs() <= self.settings.max_stat_boost.unsigned_abs() => {
                value
            }
            _ => {
                warn!(base_value = raw.base_value, "stat boost out of range");
                self.settings.default_stat_boost
            }
        };
        StatBoost { stat, base_value }
    }

    /// Asks for an item-drop descriptor. Failures yield an empty hint.
    pub async fn propose_item_drop(&self, context: &NarrativeContext) -> ItemDropHint {
        match self.bounded(self.generator.propose_item_drop(context)).await {
            Ok(raw) => ItemDropHint {
                preferred_stat: raw.stat_type.and_then(|s| s.parse::<StatType>().ok()),
                flavor: raw.flavor.filter(|f| !f.trim().is_empty()),
            },
            Err(error) => {
                warn!(%error, "item drop proposal failed");
                ItemDropHint::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::context::CharacterSummary;
    use crate::generator::{RawItemDrop, RawStatBoost};

    struct StubGenerator {
        event_type: Result<&'static str, ()>,
        description: &'static str,
        boost: RawStatBoost,
        delay: Duration,
    }

    impl StubGenerator {
        fn answering(event_type: &'static str, stat: &str, value: i64) -> Self {
            Self {
                event_type: Ok(event_type),
                description: "A crow watches from a dead branch.",
                boost: RawStatBoost {
                    stat_type: stat.to_owned(),
                    base_value: value,
                },
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl NarrativeGenerator for StubGenerator {
        async fn propose_event_type(
            &self,
            _context: &NarrativeContext,
        ) -> Result<String, NarrativeError> {
            tokio::time::sleep(self.delay).await;
            self.event_type
                .map(str::to_owned)
                .map_err(|()| NarrativeError::Unavailable("down".to_owned()))
        }

        async fn generate_description(
            &self,
            _scene: Scene,
            _context: &NarrativeContext,
            _featured: Option<&FeaturedItem>,
        ) -> Result<String, NarrativeError> {
            Ok(self.description.to_owned())
        }

        async fn propose_stat_boost(
            &self,
            _context: &NarrativeContext,
            _category: EventType,
        ) -> Result<RawStatBoost, NarrativeError> {
            Ok(self.boost.clone())
        }

        async fn propose_item_drop(
            &self,
            _context: &NarrativeContext,
        ) -> Result<RawItemDrop, NarrativeError> {
            Err(NarrativeError::InvalidResponse("not json".to_owned()))
        }
    }

    fn context() -> NarrativeContext {
        NarrativeContext {
            campaign_name: "Ashen Road".to_owned(),
            event_number: 4,
            character: CharacterSummary {
                name: "Mira".to_owned(),
                race: "Elf".to_owned(),
                class: "Ranger".to_owned(),
                current_health: 20,
                max_health: 25,
                attack: 8,
                defense: 4,
            },
            recent_events: vec![],
            enemy: None,
        }
    }

    fn narrator(generator: StubGenerator) -> Narrator {
        Narrator::new(Arc::new(generator), NarratorSettings::default())
    }

    #[test]
    fn test_extract_event_type_from_sentence() {
        assert_eq!(
            extract_event_type("I think the next event should be an item drop."),
            Some(EventType::ItemDrop)
        );
        assert_eq!(extract_event_type("Environmental"), Some(EventType::Environmental));
        assert_eq!(extract_event_type("a quiet moment"), None);
    }

    #[tokio::test]
    async fn test_propose_event_type_parses_answer() {
        let narrator = narrator(StubGenerator::answering("Combat", "attack", 3));
        assert_eq!(
            narrator.propose_event_type(&context()).await,
            Some(EventType::Combat)
        );
    }

    #[tokio::test]
    async fn test_propose_event_type_failure_is_none() {
        let mut generator = StubGenerator::answering("Combat", "attack", 3);
        generator.event_type = Err(());
        assert_eq!(narrator(generator).propose_event_type(&context()).await, None);
    }

    #[tokio::test]
    async fn test_slow_generator_times_out_to_none() {
        let mut generator = StubGenerator::answering("Combat", "attack", 3);
        generator.delay = Duration::from_millis(500);
        let narrator = Narrator::new(
            Arc::new(generator),
            NarratorSettings {
                timeout: Duration::from_millis(10),
                ..NarratorSettings::default()
            },
        );

        assert_eq!(narrator.propose_event_type(&context()).await, None);
    }

    #[tokio::test]
    async fn test_zero_stat_boost_uses_default() {
        let narrator = narrator(StubGenerator::answering("Combat", "defense", 0));
        let boost = narrator
            .propose_stat_boost(&context(), EventType::Environmental)
            .await;
        assert_eq!(boost.stat, StatType::Defense);
        assert_eq!(boost.base_value, 2);
    }

    #[tokio::test]
    async fn test_stat_boost_bounds_follow_balance_config() {
        let balance = BalanceConfig {
            default_stat_boost: 4,
            max_stat_boost: 6,
            ..BalanceConfig::default()
        };
        let settings = NarratorSettings::from_balance(&balance, Duration::from_secs(1));
        let zero = Narrator::new(
            Arc::new(StubGenerator::answering("Combat", "attack", 0)),
            settings,
        );
        let large = Narrator::new(
            Arc::new(StubGenerator::answering("Combat", "attack", 8)),
            settings,
        );

        let zero = zero
            .propose_stat_boost(&context(), EventType::Environmental)
            .await;
        let large = large
            .propose_stat_boost(&context(), EventType::Environmental)
            .await;

        assert_eq!(zero.base_value, 4);
        assert_eq!(large.base_value, 4);
    }

    #[tokio::test]
    async fn test_absurd_stat_boost_uses_default() {
        let narrator = narrator(StubGenerator::answering("Combat", "mana", 5000));
        let boost = narrator
            .propose_stat_boost(&context(), EventType::Environmental)
            .await;
        assert_eq!(boost.stat, StatType::Health);
        assert_eq!(boost.base_value, 2);
    }

    #[tokio::test]
    async fn test_valid_stat_boost_passes_through() {
        let narrator = narrator(StubGenerator::answering("Combat", "Attack", -4));
        let boost = narrator
            .propose_stat_boost(&context(), EventType::Environmental)
            .await;
        assert_eq!(
            boost,
            StatBoost {
                stat: StatType::Attack,
                base_value: -4
            }
        );
    }

    #[tokio::test]
    async fn test_failed_item_drop_yields_empty_hint() {
        let narrator = narrator(StubGenerator::answering("Combat", "attack", 3));
        assert_eq!(
            narrator.propose_item_drop(&context()).await,
            ItemDropHint::default()
        );
    }

    #[tokio::test]
    async fn test_empty_description_falls_back() {
        let mut generator = StubGenerator::answering("Combat", "attack", 3);
        generator.description = "   ";
        let text = narrator(generator)
            .describe(Scene::Descriptive, &context(), None)
            .await;
        assert!(text.contains("Mira"));
    }
}
