//! Offline narrative generator.
//!
//! Produces deterministic template prose with no network access. Used when no
//! LLM credentials are configured and in local development.

use async_trait::async_trait;
use wayfarer_core::vocabulary::{EventType, StatType};

use crate::context::{CombatEnding, FeaturedItem, NarrativeContext, Scene};
use crate::error::NarrativeError;
use crate::generator::{NarrativeGenerator, RawItemDrop, RawStatBoost};

/// Category rotation. Descriptive and Combat dominate, as they do in play.
const ROTATION: [EventType; 7] = [
    EventType::Descriptive,
    EventType::Environmental,
    EventType::Combat,
    EventType::Descriptive,
    EventType::ItemDrop,
    EventType::Combat,
    EventType::Environmental,
];

const LANDSCAPES: [&str; 5] = [
    "a fog-bound moor",
    "the roots of an ancient forest",
    "a collapsed watchtower",
    "a river ford strewn with bones",
    "a windswept ridge",
];

fn pick<T: Copy>(table: &[T], event_number: i64) -> T {
    let len = i64::try_from(table.len()).unwrap_or(1);
    let index = usize::try_from(event_number.rem_euclid(len)).unwrap_or(0);
    table[index]
}

/// Deterministic template-based generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

#[async_trait]
impl NarrativeGenerator for TemplateNarrator {
    async fn propose_event_type(
        &self,
        context: &NarrativeContext,
    ) -> Result<String, NarrativeError> {
        Ok(pick(&ROTATION, context.event_number).as_str().to_owned())
    }

    async fn generate_description(
        &self,
        scene: Scene,
        context: &NarrativeContext,
        featured: Option<&FeaturedItem>,
    ) -> Result<String, NarrativeError> {
        let name = &context.character.name;
        let place = pick(&LANDSCAPES, context.event_number);
        let enemy = context
            .enemy
            .as_ref()
            .map_or("a shadowy foe", |enemy| enemy.name.as_str());
        let item = featured.map_or("something", |item| item.name.as_str());

        let text = match scene {
            Scene::Introduction => format!(
                "The tale of {} begins. {name}, a {} {}, leaves the last village behind and \
                 follows the road toward {place}.",
                context.campaign_name, context.character.race, context.character.class
            ),
            Scene::Descriptive => format!("{name} travels through {place}. Nothing stirs."),
            Scene::InvestigationHook { event_type } => match event_type {
                EventType::Combat => format!("Twigs snap somewhere in {place}. You are not alone."),
                EventType::ItemDrop => format!("Something catches the light in {place}."),
                EventType::Environmental | EventType::Descriptive => {
                    format!("The air in {place} feels charged. Something is different here.")
                }
            },
            Scene::Declined { .. } => format!("{name} shrugs off the feeling and walks on."),
            Scene::Environmental { stat, delta } => {
                let verb = if delta >= 0 { "strengthens" } else { "weakens" };
                format!(
                    "A strange spring in {place} {verb} {name}'s {stat} by {}.",
                    delta.unsigned_abs()
                )
            }
            Scene::CombatEncounter { boss: true } => {
                format!("{enemy} awakens in {place}. The final battle begins.")
            }
            Scene::CombatEncounter { boss: false } => {
                format!("{enemy} blocks the path through {place}!")
            }
            Scene::CombatConclusion { ending } => match ending {
                CombatEnding::EnemyDefeated => format!("{enemy} is defeated. {name} finds {item}."),
                CombatEnding::CharacterDefeated => {
                    format!("{name} falls to {enemy}. The tale ends here.")
                }
                CombatEnding::Fled => format!("{name} slips away from {enemy}."),
            },
            Scene::ItemDrop { left_behind: true } => {
                format!("{name} finds {item}, but has no room to carry it.")
            }
            Scene::ItemDrop { left_behind: false } => format!("{name} finds {item} in {place}."),
        };
        Ok(text)
    }

    async fn propose_stat_boost(
        &self,
        context: &NarrativeContext,
        _category: EventType,
    ) -> Result<RawStatBoost, NarrativeError> {
        let stat = pick(
            &[StatType::Health, StatType::Attack, StatType::Defense],
            context.event_number,
        );
        Ok(RawStatBoost {
            stat_type: stat.as_str().to_owned(),
            base_value: 1 + context.event_number.rem_euclid(4),
        })
    }

    async fn propose_item_drop(
        &self,
        context: &NarrativeContext,
    ) -> Result<RawItemDrop, NarrativeError> {
        Ok(RawItemDrop {
            stat_type: None,
            flavor: Some(format!("half-buried in {}", pick(&LANDSCAPES, context.event_number))),
        })
    }
}
