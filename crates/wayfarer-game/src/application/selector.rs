//! Event-type selection for exploration turns.
//!
//! Past the boss threshold the selector always forces the boss. Before it,
//! the narrator proposes a category and the selector enforces the
//! distribution rules: no category more than the configured number of times
//! in the recent window, and a lifetime cap on descriptive events. Rejected
//! proposals are resampled a bounded number of times, then replaced by a
//! random acceptable category, and as a last resort the narrator's original
//! proposal is accepted.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wayfarer_core::error::DomainError;
use wayfarer_core::rng::DeterministicRng;
use wayfarer_core::vocabulary::EventType;
use wayfarer_narrative::context::NarrativeContext;
use wayfarer_narrative::narrator::Narrator;
use wayfarer_rules::config::BalanceConfig;

use super::engine::with_rng;

/// History the distribution rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionHistory {
    /// Number the next event will receive.
    pub next_event_number: i64,
    /// Types of persisted events, newest first.
    pub recent_types: Vec<EventType>,
    /// Lifetime count of descriptive events.
    pub descriptive_count: i64,
}

/// Why a candidate was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Already at the repeat limit within the recent window.
    Overrepresented,
    /// Descriptive lifetime cap reached.
    DescriptiveCapReached,
}

/// Where the chosen category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// An accepted narrator proposal.
    Proposal,
    /// A random acceptable category after proposals were exhausted.
    Fallback,
    /// The narrator's first proposal, accepted despite the rules.
    OriginalProposal,
}

/// Outcome of selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "selection", rename_all = "snake_case")]
pub enum Selection {
    /// The boss threshold is reached.
    ForcedBoss,
    /// A category for this turn.
    Chosen {
        /// The category.
        event_type: EventType,
        /// Where it came from.
        source: SelectionSource,
    },
}

/// Checks `candidate` against the distribution rules.
#[must_use]
pub fn rejection(
    config: &BalanceConfig,
    history: &SelectionHistory,
    candidate: EventType,
) -> Option<Rejection> {
    if candidate == EventType::Descriptive
        && history.descriptive_count >= config.max_descriptive_events
    {
        return Some(Rejection::DescriptiveCapReached);
    }
    let repeats = history
        .recent_types
        .iter()
        .take(config.repeat_window)
        .filter(|event_type| **event_type == candidate)
        .count();
    if repeats >= config.max_repeats_in_window {
        return Some(Rejection::Overrepresented);
    }
    None
}

/// Every category the rules currently allow.
#[must_use]
pub fn acceptable_types(config: &BalanceConfig, history: &SelectionHistory) -> Vec<EventType> {
    EventType::ALL
        .into_iter()
        .filter(|candidate| rejection(config, history, *candidate).is_none())
        .collect()
}

/// Chooses the category for the next exploration turn.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the RNG mutex is poisoned.
pub async fn select_event_type(
    config: &BalanceConfig,
    narrator: &Narrator,
    context: &NarrativeContext,
    history: &SelectionHistory,
    rng: &Mutex<dyn DeterministicRng + Send>,
) -> Result<Selection, DomainError> {
    if history.next_event_number >= config.boss_forced_event_start {
        debug!(
            next_event_number = history.next_event_number,
            "boss threshold reached"
        );
        return Ok(Selection::ForcedBoss);
    }

    let mut original = None;
    for attempt in 1..=config.selector_attempts {
        let Some(proposal) = narrator.propose_event_type(context).await else {
            continue;
        };
        original.get_or_insert(proposal);
        match rejection(config, history, proposal) {
            None => {
                debug!(%proposal, attempt, "event type accepted");
                return Ok(Selection::Chosen {
                    event_type: proposal,
                    source: SelectionSource::Proposal,
                });
            }
            Some(reason) => debug!(%proposal, ?reason, attempt, "event type rejected"),
        }
    }

    let acceptable = acceptable_types(config, history);
    if !acceptable.is_empty() {
        let max_index = u32::try_from(acceptable.len() - 1).unwrap_or(0);
        let index = if max_index == 0 {
            0
        } else {
            with_rng(rng, |rng| rng.next_u32_range(0, max_index))? as usize
        };
        let event_type = acceptable[index.min(acceptable.len() - 1)];
        warn!(%event_type, "proposals exhausted, using fallback event type");
        return Ok(Selection::Chosen {
            event_type,
            source: SelectionSource::Fallback,
        });
    }

    let event_type = original.unwrap_or(EventType::Environmental);
    warn!(%event_type, "no acceptable event type, accepting original proposal");
    Ok(Selection::Chosen {
        event_type,
        source: SelectionSource::OriginalProposal,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wayfarer_narrative::context::CharacterSummary;
    use wayfarer_narrative::narrator::NarratorSettings;
    use wayfarer_test_support::{ScriptedNarrativeGenerator, SequenceRng};

    use super::*;

    fn context() -> NarrativeContext {
        NarrativeContext {
            campaign_name: "Ashen Road".to_owned(),
            event_number: 5,
            character: CharacterSummary {
                name: "Mira".to_owned(),
                race: "Elf".to_owned(),
                class: "Ranger".to_owned(),
                current_health: 20,
                max_health: 20,
                attack: 5,
                defense: 3,
            },
            recent_events: vec![],
            enemy: None,
        }
    }

    fn narrator(proposals: &[&str]) -> Narrator {
        let generator = ScriptedNarrativeGenerator::new().with_event_types(proposals);
        Narrator::new(Arc::new(generator), NarratorSettings::default())
    }

    fn history(recent: &[EventType], descriptive_count: i64) -> SelectionHistory {
        SelectionHistory {
            next_event_number: 6,
            recent_types: recent.to_vec(),
            descriptive_count,
        }
    }

    fn rng(values: Vec<u32>) -> Mutex<SequenceRng> {
        Mutex::new(SequenceRng::new(values))
    }

    #[test]
    fn test_two_in_window_is_overrepresented() {
        let config = BalanceConfig::default();
        let h = history(
            &[
                EventType::Combat,
                EventType::Descriptive,
                EventType::Combat,
            ],
            1,
        );
        assert_eq!(
            rejection(&config, &h, EventType::Combat),
            Some(Rejection::Overrepresented)
        );
        assert_eq!(rejection(&config, &h, EventType::Descriptive), None);
    }

    #[test]
    fn test_occurrences_outside_window_do_not_count() {
        let config = BalanceConfig::default();
        let h = history(
            &[
                EventType::Combat,
                EventType::Descriptive,
                EventType::ItemDrop,
                EventType::Environmental,
                EventType::Descriptive,
                EventType::Combat,
            ],
            2,
        );
        assert_eq!(rejection(&config, &h, EventType::Combat), None);
    }

    #[test]
    fn test_descriptive_cap() {
        let config = BalanceConfig::default();
        let h = history(&[], 10);
        assert_eq!(
            rejection(&config, &h, EventType::Descriptive),
            Some(Rejection::DescriptiveCapReached)
        );
    }

    #[tokio::test]
    async fn test_boss_is_forced_at_threshold() {
        let config = BalanceConfig::default();
        let mut h = history(&[], 0);
        h.next_event_number = config.boss_forced_event_start;

        let selection = select_event_type(&config, &narrator(&[]), &context(), &h, &rng(vec![]))
            .await
            .unwrap();

        assert_eq!(selection, Selection::ForcedBoss);
    }

    #[tokio::test]
    async fn test_acceptable_proposal_is_used() {
        let config = BalanceConfig::default();
        let selection = select_event_type(
            &config,
            &narrator(&["Item_Drop"]),
            &context(),
            &history(&[], 0),
            &rng(vec![]),
        )
        .await
        .unwrap();

        assert_eq!(
            selection,
            Selection::Chosen {
                event_type: EventType::ItemDrop,
                source: SelectionSource::Proposal,
            }
        );
    }

    #[tokio::test]
    async fn test_rejected_proposal_is_resampled() {
        let config = BalanceConfig::default();
        let h = history(&[EventType::Combat, EventType::Combat], 0);

        let selection = select_event_type(
            &config,
            &narrator(&["Combat", "Environmental"]),
            &context(),
            &h,
            &rng(vec![]),
        )
        .await
        .unwrap();

        assert_eq!(
            selection,
            Selection::Chosen {
                event_type: EventType::Environmental,
                source: SelectionSource::Proposal,
            }
        );
    }

    #[tokio::test]
    async fn test_exhausted_proposals_fall_back_to_acceptable_type() {
        let config = BalanceConfig::default();
        let h = history(&[EventType::Combat, EventType::Combat], 10);

        let selection = select_event_type(
            &config,
            &narrator(&["Combat", "Combat", "Descriptive"]),
            &context(),
            &h,
            &rng(vec![1]),
        )
        .await
        .unwrap();

        // Acceptable: Environmental, Item_Drop; index 1 picks Item_Drop.
        assert_eq!(
            selection,
            Selection::Chosen {
                event_type: EventType::ItemDrop,
                source: SelectionSource::Fallback,
            }
        );
    }
}
