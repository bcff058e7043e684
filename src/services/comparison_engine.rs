//! Per-agent comparison of active and paused prompt versions.

use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    ArmState, BetaPosterior, ExperimentConfig, SimulationConfig, VersionComparison, VersionStats,
};
use crate::domain::ports::VersionRepository;
use crate::services::monte_carlo::{self, CancelFlag};
use crate::services::recommendation_policy::RecommendationPolicy;

/// Computes [`VersionComparison`]s on demand from a consistent snapshot.
///
/// Eliminated versions are left out. The result is a pure function of the
/// snapshot and the Monte Carlo seed, so a configured seed makes repeated
/// comparisons identical.
pub struct ComparisonEngine<R: VersionRepository> {
    repository: Arc<R>,
    policy: RecommendationPolicy,
    simulation: SimulationConfig,
}

impl<R: VersionRepository> ComparisonEngine<R> {
    pub fn new(
        repository: Arc<R>,
        experiment: ExperimentConfig,
        simulation: SimulationConfig,
    ) -> Self {
        Self {
            repository,
            policy: RecommendationPolicy::new(experiment),
            simulation,
        }
    }

    /// Compare every active and paused version of `agent_id`.
    ///
    /// The Monte Carlo run and the credible-interval quantiles are CPU-bound
    /// and execute inline on the calling task. With many arms or a large
    /// `simulation.draws`, take a snapshot and run [`Self::evaluate`] under
    /// `tokio::task::spawn_blocking` instead.
    pub async fn compare(&self, agent_id: Uuid) -> DomainResult<VersionComparison> {
        self.compare_with_cancel(agent_id, &CancelFlag::new()).await
    }

    /// [`Self::compare`] that stops with `Cancelled` once `cancel` is set.
    pub async fn compare_with_cancel(
        &self,
        agent_id: Uuid,
        cancel: &CancelFlag,
    ) -> DomainResult<VersionComparison> {
        let arms = self.repository.arm_states(agent_id).await?;
        let seed = self.simulation.seed.unwrap_or_else(rand::random);
        let comparison = self.evaluate(agent_id, &arms, seed, cancel)?;

        tracing::debug!(
            %agent_id,
            versions = comparison.versions.len(),
            action = %comparison.recommended_action,
            "Compared prompt versions"
        );

        Ok(comparison)
    }

    /// Build a comparison from an already-taken snapshot.
    pub fn evaluate(
        &self,
        agent_id: Uuid,
        arms: &[ArmState],
        seed: u64,
        cancel: &CancelFlag,
    ) -> DomainResult<VersionComparison> {
        let mut compared: Vec<&ArmState> =
            arms.iter().filter(|arm| !arm.arm_status.is_terminal()).collect();
        compared.sort_by_key(|arm| arm.version_number);

        let posteriors: Vec<BetaPosterior> = compared.iter().map(|arm| arm.posterior()).collect();
        let probabilities = monte_carlo::probability_of_best_cancellable(
            &posteriors,
            self.simulation.draws,
            seed,
            cancel,
        )?;

        let mass = self.policy.config().credible_interval_mass;
        let mut versions: Vec<VersionStats> = compared
            .iter()
            .zip(posteriors.iter().zip(probabilities))
            .map(|(arm, (posterior, probability_best))| {
                let (lower, upper) = posterior.credible_interval(mass);
                VersionStats {
                    version_id: arm.version_id,
                    version_number: arm.version_number,
                    is_baseline: arm.is_baseline,
                    sample_size: arm.trials,
                    mean_estimate: posterior.mean(),
                    booking_rate: arm.booking_rate(),
                    probability_best,
                    credible_interval_lower: lower,
                    credible_interval_upper: upper,
                    arm_status: arm.arm_status,
                }
            })
            .collect();

        versions.sort_by(|a, b| {
            b.probability_best
                .partial_cmp(&a.probability_best)
                .unwrap_or(Ordering::Equal)
                .then(a.version_number.cmp(&b.version_number))
        });

        let winner = self.policy.winner(&versions);
        let recommendation = self.policy.recommend(&versions);

        Ok(VersionComparison {
            agent_id,
            versions,
            winner_id: winner.map(|(id, _)| id),
            winner_probability: winner.map(|(_, p)| p),
            recommended_action: recommendation.action,
            min_samples_needed: recommendation.min_samples_needed,
            eliminate_version_id: recommendation.eliminate_version_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryVersionRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::models::{ArmStatus, LifecycleAction, PromptContent, RecommendedAction};

    fn engine(
        repo: Arc<InMemoryVersionRepository>,
    ) -> ComparisonEngine<InMemoryVersionRepository> {
        ComparisonEngine::new(
            repo,
            ExperimentConfig::default(),
            SimulationConfig {
                draws: 10_000,
                seed: Some(2024),
            },
        )
    }

    async fn seed(
        repo: &InMemoryVersionRepository,
        version_id: Uuid,
        successes: u64,
        trials: u64,
    ) {
        for i in 0..trials {
            repo.record_outcome(version_id, i < successes).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_excludes_eliminated_and_keeps_paused() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let agent = Uuid::new_v4();
        let a = repo.create(agent, PromptContent::new("a"), ArmStatus::Active).await.unwrap();
        let b = repo.create(agent, PromptContent::new("b"), ArmStatus::Paused).await.unwrap();
        let c = repo.create(agent, PromptContent::new("c"), ArmStatus::Active).await.unwrap();
        repo.transition(c.version_id, LifecycleAction::Eliminate)
            .await
            .unwrap();

        let comparison = engine(Arc::clone(&repo)).compare(agent).await.unwrap();
        assert_eq!(comparison.versions.len(), 2);
        assert!(comparison.get(a.version_id).is_some());
        assert_eq!(
            comparison.get(b.version_id).unwrap().arm_status,
            ArmStatus::Paused
        );
        assert!(comparison.get(c.version_id).is_none());
    }

    #[tokio::test]
    async fn test_fixed_seed_is_reproducible() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let agent = Uuid::new_v4();
        let a = repo.create(agent, PromptContent::new("a"), ArmStatus::Active).await.unwrap();
        let b = repo.create(agent, PromptContent::new("b"), ArmStatus::Active).await.unwrap();
        seed(&repo, a.version_id, 12, 30).await;
        seed(&repo, b.version_id, 14, 30).await;

        let engine = engine(Arc::clone(&repo));
        let first = engine.compare(agent).await.unwrap();
        let second = engine.compare(agent).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_stats_fields() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let agent = Uuid::new_v4();
        let a = repo.create(agent, PromptContent::new("a"), ArmStatus::Active).await.unwrap();
        let b = repo.create(agent, PromptContent::new("b"), ArmStatus::Active).await.unwrap();
        seed(&repo, a.version_id, 8, 10).await;

        let comparison = engine(Arc::clone(&repo)).compare(agent).await.unwrap();
        let sa = comparison.get(a.version_id).unwrap();
        assert_eq!(sa.sample_size, 10);
        assert!(sa.is_baseline);
        assert_eq!(sa.booking_rate, Some(0.8));
        assert!((sa.mean_estimate - 9.0 / 12.0).abs() < 1e-12);
        assert!(sa.credible_interval_lower < sa.mean_estimate);
        assert!(sa.mean_estimate < sa.credible_interval_upper);

        let sb = comparison.get(b.version_id).unwrap();
        assert_eq!(sb.booking_rate, None);
        assert!((sb.mean_estimate - 0.5).abs() < 1e-12);
        assert!((sb.credible_interval_lower - 0.025).abs() < 1e-6);
        assert!((sb.credible_interval_upper - 0.975).abs() < 1e-6);

        assert_eq!(comparison.recommended_action, RecommendedAction::CollectingData);
        assert_eq!(comparison.min_samples_needed, 100);
    }

    #[tokio::test]
    async fn test_all_eliminated_yields_empty_comparison() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let agent = Uuid::new_v4();
        let a = repo.create(agent, PromptContent::new("a"), ArmStatus::Active).await.unwrap();
        repo.transition(a.version_id, LifecycleAction::Eliminate)
            .await
            .unwrap();

        let comparison = engine(repo).compare(agent).await.unwrap();
        assert!(comparison.versions.is_empty());
        assert!(comparison.winner_id.is_none());
        assert_eq!(comparison.recommended_action, RecommendedAction::CollectingData);
    }

    #[tokio::test]
    async fn test_cancelled_comparison() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let agent = Uuid::new_v4();
        repo.create(agent, PromptContent::new("a"), ArmStatus::Active).await.unwrap();
        repo.create(agent, PromptContent::new("b"), ArmStatus::Active).await.unwrap();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = engine(repo)
            .compare_with_cancel(agent, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Cancelled));
    }

    #[tokio::test]
    async fn test_unknown_agent() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let err = engine(repo).compare(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::UnknownAgent(_)));
    }
}
