//! Consecutive-descriptive counters, one per campaign.
//!
//! Any accepted non-descriptive event resets a campaign's streak. Counters
//! are in memory; after a restart they are re-seeded from the event log.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;
use wayfarer_core::error::DomainError;
use wayfarer_core::vocabulary::EventType;

use crate::domain::event::GameEvent;

/// Length of the descriptive run at the head of a newest-first log.
#[must_use]
pub fn streak_from_log(newest_first: &[GameEvent]) -> u32 {
    let run = newest_first
        .iter()
        .take_while(|event| event.event_type == EventType::Descriptive)
        .count();
    u32::try_from(run).unwrap_or(u32::MAX)
}

/// Keyed store of descriptive streaks.
#[derive(Debug, Default)]
pub struct DescriptiveStreaks {
    streaks: Mutex<HashMap<Uuid, u32>>,
}

impl DescriptiveStreaks {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, u32>>, DomainError> {
        self.streaks
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("streak store poisoned: {e}")))
    }

    /// The campaign's streak, seeding it from `newest_first` if unknown.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is poisoned.
    pub fn current(
        &self,
        campaign_id: Uuid,
        newest_first: &[GameEvent],
    ) -> Result<u32, DomainError> {
        Ok(*self
            .guard()?
            .entry(campaign_id)
            .or_insert_with(|| streak_from_log(newest_first)))
    }

    /// Records accepted events in order and returns the new streak.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is poisoned.
    pub fn record(
        &self,
        campaign_id: Uuid,
        accepted: impl IntoIterator<Item = EventType>,
    ) -> Result<u32, DomainError> {
        let mut streaks = self.guard()?;
        let streak = streaks.entry(campaign_id).or_default();
        for event_type in accepted {
            if event_type == EventType::Descriptive {
                *streak = streak.saturating_add(1);
            } else {
                *streak = 0;
            }
        }
        Ok(*streak)
    }

    /// Drops the campaign's counter.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is poisoned.
    pub fn forget(&self, campaign_id: Uuid) -> Result<(), DomainError> {
        self.guard()?.remove(&campaign_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn event(event_number: i64, event_type: EventType) -> GameEvent {
        GameEvent {
            id: Uuid::new_v4(),
            campaign_id: Uuid::nil(),
            message: String::new(),
            event_number,
            event_type,
            event_data: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_streak_from_log_counts_leading_descriptive_run() {
        let log = vec![
            event(5, EventType::Descriptive),
            event(4, EventType::Descriptive),
            event(3, EventType::Combat),
            event(2, EventType::Descriptive),
        ];
        assert_eq!(streak_from_log(&log), 2);
        assert_eq!(streak_from_log(&[]), 0);
    }

    #[test]
    fn test_non_descriptive_resets_streak() {
        let streaks = DescriptiveStreaks::new();
        let id = Uuid::new_v4();

        streaks
            .record(id, [EventType::Descriptive, EventType::Descriptive])
            .unwrap();
        let after_reset = streaks.record(id, [EventType::Environmental]).unwrap();
        let after_one = streaks.record(id, [EventType::Descriptive]).unwrap();

        assert_eq!(after_reset, 0);
        assert_eq!(after_one, 1);
    }

    #[test]
    fn test_streaks_are_per_campaign() {
        let streaks = DescriptiveStreaks::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        streaks.record(a, [EventType::Descriptive]).unwrap();

        assert_eq!(streaks.current(a, &[]).unwrap(), 1);
        assert_eq!(streaks.current(b, &[]).unwrap(), 0);
    }

    #[test]
    fn test_unknown_campaign_is_seeded_from_log() {
        let streaks = DescriptiveStreaks::new();
        let log = vec![
            event(2, EventType::Descriptive),
            event(1, EventType::Descriptive),
        ];
        assert_eq!(streaks.current(Uuid::new_v4(), &log).unwrap(), 2);
    }
}
