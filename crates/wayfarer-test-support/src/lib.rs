//! Shared test doubles and fixtures for the Wayfarer RPG engine.

mod clock;
pub mod fixtures;
mod narrative;
mod repository;
mod rng;

pub use clock::FixedClock;
pub use narrative::ScriptedNarrativeGenerator;
pub use repository::{FailingGameRepository, InMemoryGameRepository};
pub use rng::{MockRng, SequenceRng};
