//! Wayfarer RPG: Game orchestration.
//!
//! Owns the campaign/character/inventory model, the persistence traits the
//! engine consumes, the ephemeral per-campaign stores (combat snapshots,
//! investigation prompts, descriptive streaks) and the [`application::engine::GameEngine`]
//! state machine that turns one player action into one committed turn.

pub mod application;
pub mod domain;
