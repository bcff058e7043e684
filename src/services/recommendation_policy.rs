//! Turns ranked comparison statistics into operator advice.
//!
//! Rules are evaluated in order; the first match wins:
//!
//! 1. any arm below `min_samples_per_arm` trials -> `collecting_data`
//! 2. top arm's probability-best >= `winner_probability_threshold` -> `declare_winner`
//! 3. more than two arms and the bottom arm's probability-best
//!    <= `elimination_probability_threshold` -> `eliminate_worst`
//! 4. otherwise -> `continue_testing`
//!
//! Advice only; nothing here changes arm state.

use uuid::Uuid;

use crate::domain::models::{ExperimentConfig, RecommendedAction, VersionStats};

/// Outcome of evaluating the policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recommendation {
    pub action: RecommendedAction,
    /// Extra trials the least-sampled arm needs; 0 once the gate is met.
    pub min_samples_needed: u64,
    /// The arm to cull when `action` is `eliminate_worst`.
    pub eliminate_version_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct RecommendationPolicy {
    config: ExperimentConfig,
}

impl RecommendationPolicy {
    pub const fn new(config: ExperimentConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Top arm and its probability when it clears the winner threshold.
    ///
    /// Independent of the sample-size gate.
    pub fn winner(&self, ranked: &[VersionStats]) -> Option<(Uuid, f64)> {
        ranked
            .first()
            .filter(|top| top.probability_best >= self.config.winner_probability_threshold)
            .map(|top| (top.version_id, top.probability_best))
    }

    /// Evaluate the rules against `ranked`, ordered by `probability_best`
    /// descending.
    pub fn recommend(&self, ranked: &[VersionStats]) -> Recommendation {
        let min_samples = self.config.min_samples_per_arm;
        let fewest = ranked.iter().map(|v| v.sample_size).min().unwrap_or(0);

        if ranked.is_empty() || fewest < min_samples {
            return Recommendation {
                action: RecommendedAction::CollectingData,
                min_samples_needed: min_samples - fewest,
                eliminate_version_id: None,
            };
        }

        if self.winner(ranked).is_some() {
            return Self::settled(RecommendedAction::DeclareWinner, None);
        }

        if ranked.len() > 2 {
            if let Some(bottom) = ranked.last() {
                if bottom.probability_best <= self.config.elimination_probability_threshold {
                    return Self::settled(
                        RecommendedAction::EliminateWorst,
                        Some(bottom.version_id),
                    );
                }
            }
        }

        Self::settled(RecommendedAction::ContinueTesting, None)
    }

    const fn settled(action: RecommendedAction, eliminate: Option<Uuid>) -> Recommendation {
        Recommendation {
            action,
            min_samples_needed: 0,
            eliminate_version_id: eliminate,
        }
    }
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self::new(ExperimentConfig::default())
    }
}
