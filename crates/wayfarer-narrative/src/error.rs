//! Narrative generation errors.

use std::time::Duration;

use thiserror::Error;

/// Failure of a narrative generator call.
///
/// These never reach the game engine: the [`crate::narrator::Narrator`]
/// recovers each one with a default.
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// The generator could not be reached or returned a server error.
    #[error("narrative generator unavailable: {0}")]
    Unavailable(String),

    /// The generator did not answer in time.
    #[error("narrative generator timed out after {0:?}")]
    Timeout(Duration),

    /// The generator answered with something that cannot be used.
    #[error("invalid narrative response: {0}")]
    InvalidResponse(String),

    /// The generator is misconfigured (missing key, bad header value).
    #[error("narrative configuration error: {0}")]
    Configuration(String),
}
