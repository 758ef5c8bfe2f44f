use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::error::{CoordinatorError, Result};

/// Creates a random number generator, seeded if a seed is given and from the OS otherwise.
pub fn generate_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Derives the seed of the coordinator's own stream from the run's seed.
///
/// The run's seed itself is left to whoever builds the dataset and the initial model, and the
/// workers train from `seed + index + 1`, so the coordinator takes `seed - 1`.
pub fn selection_seed(seed: Option<u64>) -> Option<u64> {
    seed.map(|seed| seed.wrapping_sub(1))
}

/// Draws the workers that take part in each round.
#[derive(Debug, Clone)]
pub struct RoundSelector {
    rng: StdRng,
}

impl RoundSelector {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Creates a selector that's reproducible if given a seed.
    pub fn seeded(seed: Option<u64>) -> Self {
        Self::new(generate_rng(seed))
    }

    /// Draws `k` distinct members of `roster` uniformly at random, without replacement.
    ///
    /// # Errors
    /// `CoordinatorError::InvalidArgument` if `k` is zero or larger than the roster.
    pub fn select<T: Clone>(&mut self, roster: &[T], k: usize) -> Result<Vec<T>> {
        if k == 0 || k > roster.len() {
            return Err(CoordinatorError::InvalidArgument(format!(
                "cannot select {k} out of {} workers",
                roster.len()
            )));
        }

        Ok(roster.choose_multiple(&mut self.rng, k).cloned().collect())
    }
}
