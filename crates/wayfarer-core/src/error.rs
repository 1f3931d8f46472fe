//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up (`campaign`, `character`, ...).
        entity: &'static str,
        /// The identifier that was looked up.
        id: Uuid,
    },

    /// Optimistic concurrency conflict, e.g. a duplicate event number.
    #[error("concurrency conflict on campaign {campaign_id}: event {event_number} already exists")]
    ConcurrencyConflict {
        /// The campaign that had the conflict.
        campaign_id: Uuid,
        /// The event number that was already taken.
        event_number: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A fatal configuration error (empty catalog, inconsistent balance block).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for a `NotFound` error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}
