//! Posterior samplers backed by `rand`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Mutex, PoisonError};

use crate::domain::models::BetaPosterior;
use crate::domain::ports::PosteriorSampler;

/// Draws from the calling thread's RNG; no shared state between requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSampler;

impl PosteriorSampler for ThreadRngSampler {
    fn sample(&self, posterior: &BetaPosterior) -> f64 {
        posterior.sample(&mut rand::thread_rng())
    }
}

/// Deterministic sampler for reproducible allocation sequences.
#[derive(Debug)]
pub struct SeededSampler {
    rng: Mutex<StdRng>,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl PosteriorSampler for SeededSampler {
    fn sample(&self, posterior: &BetaPosterior) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        posterior.sample(&mut *rng)
    }
}
