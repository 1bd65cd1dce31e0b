#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded generator of single-digit multiplication facts.

use crow_defence_core::{Problem, MAX_OPERAND, MIN_OPERAND};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Draws both operands independently and uniformly from `1..=9`.
#[derive(Clone, Debug)]
pub struct ProblemGenerator {
    rng: ChaCha8Rng,
}

impl ProblemGenerator {
    /// Creates a generator whose sequence is fully determined by `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Produces the next problem. The answer lies in `1..=81`.
    pub fn generate(&mut self) -> Problem {
        let left = self.rng.gen_range(MIN_OPERAND..=MAX_OPERAND);
        let right = self.rng.gen_range(MIN_OPERAND..=MAX_OPERAND);
        Problem::new(left, right)
    }

    /// Draws a value uniformly from the inclusive range `[low, high]`.
    ///
    /// Shares the generator's stream so a single seed reproduces a whole session.
    pub fn sample_between(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}
