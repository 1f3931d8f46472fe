//! Wayfarer RPG: Narrative generation boundary.
//!
//! Narrative text and a few numeric proposals come from an external text
//! generator (usually an LLM). The raw [`generator::NarrativeGenerator`] trait
//! speaks in loosely typed values; [`narrator::Narrator`] is the only thing
//! the game engine talks to, and it turns every raw answer into a small
//! closed type, substituting conservative defaults on failure.

pub mod anthropic;
pub mod context;
pub mod error;
pub mod generator;
pub mod narrator;
pub mod template;
