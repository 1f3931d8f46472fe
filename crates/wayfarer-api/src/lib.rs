//! Wayfarer RPG: HTTP API.
//!
//! A thin axum surface over [`wayfarer_game::application::engine::GameEngine`]:
//! campaign creation, state lookup, deletion and player actions.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
