//! Wayfarer Core: shared domain abstractions.
//!
//! This crate defines the traits, error taxonomy and vocabulary types that
//! every other crate depends on. It contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod rng;
pub mod vocabulary;
