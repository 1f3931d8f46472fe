//! Shared application state.

use std::sync::Arc;

use wayfarer_game::application::engine::GameEngine;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The orchestrator every campaign route goes through.
    pub engine: Arc<GameEngine>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(engine: GameEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
