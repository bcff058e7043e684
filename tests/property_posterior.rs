use promptbandit::services::monte_carlo::{probability_exceeds, probability_of_best};
use promptbandit::BetaPosterior;
use proptest::prelude::*;

/// Beta draws use rejection sampling, so one extra success can shift the
/// random stream for the other arms; allow about three standard errors of
/// Monte Carlo noise at 10k draws.
const MONTE_CARLO_TOLERANCE: f64 = 0.02;

proptest! {
    /// Property: One more success never lowers the posterior mean
    #[test]
    fn prop_mean_monotonic_in_successes(
        trials in 1u64..500,
        fraction in 0.0f64..1.0,
    ) {
        let successes = ((trials - 1) as f64 * fraction) as u64;
        let before = BetaPosterior::from_counts(successes, trials);
        let after = BetaPosterior::from_counts(successes + 1, trials);
        prop_assert!(after.mean() > before.mean());
    }

    /// Property: The credible interval brackets the mean and stays in [0, 1]
    #[test]
    fn prop_credible_interval_contains_mean(
        trials in 0u64..400,
        fraction in 0.0f64..=1.0,
        mass in 0.5f64..0.99,
    ) {
        let successes = (trials as f64 * fraction) as u64;
        let posterior = BetaPosterior::from_counts(successes, trials);
        let (lower, upper) = posterior.credible_interval(mass);

        prop_assert!(0.0 <= lower);
        prop_assert!(upper <= 1.0);
        prop_assert!(lower <= posterior.mean() && posterior.mean() <= upper);
    }

    /// Property: A wider interval mass never narrows the interval
    #[test]
    fn prop_credible_interval_nested(
        successes in 0u64..50,
        failures in 0u64..50,
    ) {
        let posterior = BetaPosterior::from_counts(successes, successes + failures);
        let (narrow_lo, narrow_hi) = posterior.credible_interval(0.8);
        let (wide_lo, wide_hi) = posterior.credible_interval(0.95);
        prop_assert!(wide_lo <= narrow_lo + 1e-9);
        prop_assert!(narrow_hi <= wide_hi + 1e-9);
    }

    /// Property: Exact P(A > B) grows with A's successes
    #[test]
    fn prop_exact_probability_monotonic(
        a_successes in 0u64..80,
        a_failures in 0u64..80,
        b_successes in 0u64..80,
        b_failures in 0u64..80,
    ) {
        let b = BetaPosterior::from_counts(b_successes, b_successes + b_failures);
        let a = BetaPosterior::from_counts(a_successes, a_successes + a_failures);
        let a_better = BetaPosterior::from_counts(a_successes + 1, a_successes + 1 + a_failures);

        let p = probability_exceeds(&a, &b).unwrap();
        let p_better = probability_exceeds(&a_better, &b).unwrap();
        prop_assert!((0.0..=1.0 + 1e-9).contains(&p));
        prop_assert!(p_better >= p - 1e-9);
    }

    /// Property: Probability-of-best sums to one for any arm count
    #[test]
    fn prop_probability_of_best_conserved(
        counts in prop::collection::vec((0u64..60, 0u64..60), 1..6),
        seed in any::<u64>(),
    ) {
        let posteriors: Vec<BetaPosterior> = counts
            .iter()
            .map(|&(s, f)| BetaPosterior::from_counts(s, s + f))
            .collect();

        let probabilities = probability_of_best(&posteriors, 2_000, seed);
        prop_assert_eq!(probabilities.len(), posteriors.len());
        let total: f64 = probabilities.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    /// Property: One more success for arm 0 never lowers its probability of
    /// being best when the other arms and the seed are fixed
    #[test]
    fn prop_probability_of_best_monotonic_in_successes(
        successes in 0u64..100,
        others in prop::collection::vec((0u64..100, 1u64..100), 2..5),
        seed in any::<u64>(),
    ) {
        let rest: Vec<BetaPosterior> = others
            .iter()
            .map(|&(s, extra)| BetaPosterior::from_counts(s, s + extra))
            .collect();

        let mut before = vec![BetaPosterior::from_counts(successes, 100)];
        before.extend(rest.iter().copied());
        let mut after = vec![BetaPosterior::from_counts(successes + 1, 101)];
        after.extend(rest.iter().copied());

        let p_before = probability_of_best(&before, 10_000, seed);
        let p_after = probability_of_best(&after, 10_000, seed);
        prop_assert!(
            p_after[0] >= p_before[0] - MONTE_CARLO_TOLERANCE,
            "P(best) fell from {} to {}",
            p_before[0],
            p_after[0]
        );
    }
}
