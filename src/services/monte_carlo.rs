//! Monte Carlo probability-of-best over Beta posteriors.
//!
//! Each draw samples every posterior once; the arm with the largest sample
//! scores the draw. Ties go to the lower index, so callers pass posteriors
//! ordered by `version_number`. Results always sum to 1.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Beta, Distribution};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::posterior::ln_beta;
use crate::domain::models::BetaPosterior;

/// Draws between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 1024;

/// Largest integer `alpha` accepted by the exact two-arm formula.
const EXACT_MAX_TERMS: f64 = 1_000_000.0;

/// Shared flag a caller sets to abandon an in-flight comparison.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Estimate `P(arm i has the highest rate)` for every arm.
///
/// `draws` of zero is treated as one.
pub fn probability_of_best(posteriors: &[BetaPosterior], draws: usize, seed: u64) -> Vec<f64> {
    // Without a flag the run cannot be cancelled.
    run(posteriors, draws, seed, None).unwrap_or_default()
}

/// [`probability_of_best`] that polls `cancel` and gives up with
/// [`DomainError::Cancelled`] once it is set.
pub fn probability_of_best_cancellable(
    posteriors: &[BetaPosterior],
    draws: usize,
    seed: u64,
    cancel: &CancelFlag,
) -> DomainResult<Vec<f64>> {
    run(posteriors, draws, seed, Some(cancel))
}

fn run(
    posteriors: &[BetaPosterior],
    draws: usize,
    seed: u64,
    cancel: Option<&CancelFlag>,
) -> DomainResult<Vec<f64>> {
    match posteriors.len() {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![1.0]),
        _ => {}
    }

    let draws = draws.max(1);
    let arms: Vec<Arm> = posteriors.iter().map(Arm::new).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut wins = vec![0_u64; arms.len()];

    for draw in 0..draws {
        if draw % CANCEL_CHECK_INTERVAL == 0 && cancel.is_some_and(CancelFlag::is_cancelled) {
            return Err(DomainError::Cancelled);
        }

        let mut best_index = 0;
        let mut best_sample = f64::NEG_INFINITY;
        for (index, arm) in arms.iter().enumerate() {
            let sample = arm.sample(&mut rng);
            if sample > best_sample {
                best_sample = sample;
                best_index = index;
            }
        }
        wins[best_index] += 1;
    }

    let total = draws as f64;
    Ok(wins.into_iter().map(|w| w as f64 / total).collect())
}

/// Sampling form of one posterior; degenerate parameters collapse to the mean.
enum Arm {
    Beta(Beta<f64>),
    Fixed(f64),
}

impl Arm {
    fn new(posterior: &BetaPosterior) -> Self {
        posterior
            .distribution()
            .map_or_else(|| Self::Fixed(posterior.mean()), Self::Beta)
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            Self::Beta(dist) => dist.sample(rng),
            Self::Fixed(value) => *value,
        }
    }
}

/// Exact `P(X_a > X_b)` for independent Beta variables.
///
/// Closed form summing `alpha_a` terms, so `a.alpha` must be a whole number
/// (true for any posterior built from counts). Returns `None` otherwise.
pub fn probability_exceeds(a: &BetaPosterior, b: &BetaPosterior) -> Option<f64> {
    if a.alpha.fract() != 0.0 || a.alpha < 1.0 || a.alpha > EXACT_MAX_TERMS {
        return None;
    }

    let base = ln_beta(b.alpha, b.beta);
    let terms = a.alpha as u64;
    let total: f64 = (0..terms)
        .map(|i| {
            let i = i as f64;
            (ln_beta(b.alpha + i, a.beta + b.beta)
                - (a.beta + i).ln()
                - ln_beta(1.0 + i, a.beta)
                - base)
                .exp()
        })
        .sum();

    Some(total.clamp(0.0, 1.0))
}
