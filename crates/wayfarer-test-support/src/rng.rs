//! Test RNG: deterministic `DeterministicRng` implementations for tests.

use std::collections::VecDeque;

use wayfarer_core::rng::DeterministicRng;

/// A no-op RNG that always returns `min` for `next_u32_range` and `0.0` for
/// `next_f64`. Suitable for tests that do not depend on specific random values.
#[derive(Debug)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }

    fn next_f64(&mut self) -> f64 {
        0.0
    }
}

/// An RNG that returns integers from a predetermined sequence, clamped into
/// the requested range. Panics if the sequence is exhausted, so a test fails
/// loudly when the engine rolls more often than expected.
///
/// Floats come from a separate queue and default to `0.0` once it is empty.
#[derive(Debug)]
pub struct SequenceRng {
    values: VecDeque<u32>,
    floats: VecDeque<f64>,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given integer values.
    #[must_use]
    pub fn new(values: Vec<u32>) -> Self {
        Self {
            values: values.into(),
            floats: VecDeque::new(),
        }
    }

    /// Queues values for `next_f64`.
    #[must_use]
    pub fn with_floats(mut self, floats: Vec<f64>) -> Self {
        self.floats = floats.into();
        self
    }

    /// Integers not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        let Some(value) = self.values.pop_front() else {
            panic!("SequenceRng exhausted (requested a value in [{min}, {max}])");
        };
        value.clamp(min, max.max(min))
    }

    fn next_f64(&mut self) -> f64 {
        self.floats.pop_front().unwrap_or(0.0)
    }
}
