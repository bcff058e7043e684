//! Randomness source for posterior draws.

use crate::domain::models::BetaPosterior;

/// Draws one value from a Beta posterior.
///
/// Production uses a thread-local RNG; tests inject a seeded sampler so
/// allocation sequences are reproducible.
pub trait PosteriorSampler: Send + Sync {
    fn sample(&self, posterior: &BetaPosterior) -> f64;
}
