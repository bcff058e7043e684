//! Beta-Bernoulli posterior for a single prompt version.
//!
//! A version with `s` successes out of `n` trials has posterior
//! Beta(s + 1, n - s + 1) under the uniform Beta(1, 1) prior. Besides the
//! closed-form moments, this module provides the regularized incomplete beta
//! function and its inverse so credible intervals are exact percentiles
//! rather than normal approximations.

use rand::Rng;
use rand_distr::{Beta, Distribution};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Convergence tolerance for the incomplete-beta continued fraction.
const CF_EPSILON: f64 = 1e-14;

/// Guard against division by zero inside Lentz's algorithm.
const CF_TINY: f64 = 1e-300;

/// Iteration cap for the continued fraction. Convergence needs roughly
/// `sqrt(max(alpha, beta))` iterations.
const CF_MAX_ITERATIONS: usize = 10_000;

/// Bisection stops once the bracket is narrower than this.
const QUANTILE_TOLERANCE: f64 = 1e-12;

// ---------------------------------------------------------------------------
// BetaPosterior
// ---------------------------------------------------------------------------

/// A Beta distribution parameterised by `alpha` and `beta`, used as the
/// conjugate posterior for a version's booking rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPosterior {
    /// Pseudo-successes (shape parameter).
    pub alpha: f64,
    /// Pseudo-failures (shape parameter).
    pub beta: f64,
}

impl BetaPosterior {
    /// A uniform (uninformative) prior: Beta(1, 1).
    pub const fn uniform() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
        }
    }

    /// Create a distribution with the given parameters.
    pub const fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Posterior after `successes` out of `trials` under the uniform prior.
    ///
    /// `trials` below `successes` is clamped so the shape parameters stay
    /// at least 1.
    pub fn from_counts(successes: u64, trials: u64) -> Self {
        let failures = trials.saturating_sub(successes);
        Self {
            alpha: successes as f64 + 1.0,
            beta: failures as f64 + 1.0,
        }
    }

    /// The mean of the Beta distribution: `alpha / (alpha + beta)`.
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// The variance of the Beta distribution.
    pub fn variance(&self) -> f64 {
        let sum = self.alpha + self.beta;
        (self.alpha * self.beta) / (sum.powi(2) * (sum + 1.0))
    }

    /// `P(X <= x)`.
    pub fn cdf(&self, x: f64) -> f64 {
        regularized_incomplete_beta(self.alpha, self.beta, x)
    }

    /// Inverse CDF: the `p`-th quantile, found by bisection on [`Self::cdf`].
    pub fn quantile(&self, p: f64) -> f64 {
        if p <= 0.0 {
            return 0.0;
        }
        if p >= 1.0 {
            return 1.0;
        }

        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        while hi - lo > QUANTILE_TOLERANCE {
            let mid = 0.5 * (lo + hi);
            if self.cdf(mid) < p {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    /// Equal-tailed credible interval holding `mass` of the posterior.
    ///
    /// `mass = 0.95` yields the 2.5th and 97.5th percentiles.
    pub fn credible_interval(&self, mass: f64) -> (f64, f64) {
        let tail = (1.0 - mass.clamp(0.0, 1.0)) / 2.0;
        (self.quantile(tail), self.quantile(1.0 - tail))
    }

    /// Sampling distribution, or `None` for invalid shape parameters.
    pub fn distribution(&self) -> Option<Beta<f64>> {
        if !(self.alpha.is_finite() && self.beta.is_finite()) {
            return None;
        }
        Beta::new(self.alpha, self.beta).ok()
    }

    /// Draw one sample from the posterior.
    ///
    /// Falls back to the mean if the parameters cannot form a distribution.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.distribution()
            .map_or_else(|| self.mean(), |dist| dist.sample(rng))
    }
}

impl Default for BetaPosterior {
    fn default() -> Self {
        Self::uniform()
    }
}

// ---------------------------------------------------------------------------
// Special functions
// ---------------------------------------------------------------------------

/// Log gamma function (Lanczos approximation, g = 7).
pub fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula
        return PI.ln() - (PI * x).sin().abs().ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut a = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    let t = x + G + 0.5;
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// `ln B(a, b)`.
pub fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// Regularized incomplete beta function `I_x(a, b)`.
pub fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = a.mul_add(x.ln(), b * (1.0 - x).ln()) - ln_beta(a, b);
    let front = ln_front.exp();

    // The continued fraction converges fastest below the mode-ish split point
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Continued fraction for the incomplete beta function (modified Lentz).
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let guard = |v: f64| if v.abs() < CF_TINY { CF_TINY } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=CF_MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        // Even step
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(aa.mul_add(d, 1.0));
        c = guard(1.0 + aa / c);
        h *= d * c;

        // Odd step
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(aa.mul_add(d, 1.0));
        c = guard(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < CF_EPSILON {
            break;
        }
    }

    h
}
