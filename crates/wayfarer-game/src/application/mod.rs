//! Application layer: ephemeral stores, selection services and the engine.

pub mod catalog;
pub mod combat;
pub mod engine;
pub mod exploration;
pub mod locks;
pub mod prompt_store;
pub mod responses;
pub mod selector;
pub mod snapshot_store;
pub mod streak;
