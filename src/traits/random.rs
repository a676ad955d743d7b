//! Random source abstraction for testable shuffling.

use rand::Rng;

/// Trait for drawing uniform random indices.
///
/// This abstraction allows code that depends on randomness (the per-round
/// catalog shuffle) to be tested with deterministic, controllable values.
pub trait RandomSource: Send + Sync {
    /// Return a uniform value in `[0, bound)`. `bound` must be non-zero.
    fn pick(&self, bound: usize) -> usize;
}

/// Production implementation using the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl ThreadRngSource {
    pub const fn new() -> Self {
        Self
    }
}

impl RandomSource for ThreadRngSource {
    fn pick(&self, bound: usize) -> usize {
        rand::thread_rng().gen_range(0..bound)
    }
}

/// Fisher-Yates shuffle driven by a [`RandomSource`].
pub fn shuffle<T>(random: &impl RandomSource, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = random.pick(i + 1);
        items.swap(i, j);
    }
}
