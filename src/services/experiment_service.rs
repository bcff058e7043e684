//! Single entry point wiring the experiment components together.

use std::sync::Arc;
use uuid::Uuid;

use crate::adapters::{InMemoryVersionRepository, SeededSampler, ThreadRngSampler};
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    BetaPosterior, Config, ForkOverrides, NewPromptVersion, PromptVersion, VersionComparison,
};
use crate::domain::ports::{OutcomeDisposition, PosteriorSampler, VersionRepository};
use crate::services::arm_lifecycle::ArmLifecycleManager;
use crate::services::comparison_engine::ComparisonEngine;
use crate::services::monte_carlo::CancelFlag;
use crate::services::outcome_recorder::OutcomeRecorder;
use crate::services::posterior_store::PosteriorStore;
use crate::services::thompson_allocator::ThompsonAllocator;

/// Facade over recording, allocation, comparison and lifecycle.
///
/// All components share one repository, so an outcome recorded here is
/// visible to the next selection or comparison.
pub struct ExperimentService<R: VersionRepository> {
    recorder: OutcomeRecorder<R>,
    store: PosteriorStore<R>,
    allocator: ThompsonAllocator<R>,
    comparison: ComparisonEngine<R>,
    lifecycle: ArmLifecycleManager<R>,
}

impl<R: VersionRepository> ExperimentService<R> {
    pub fn new(repository: Arc<R>, sampler: Arc<dyn PosteriorSampler>, config: &Config) -> Self {
        let store = PosteriorStore::new(Arc::clone(&repository), sampler);
        Self {
            recorder: OutcomeRecorder::new(Arc::clone(&repository)),
            allocator: ThompsonAllocator::new(store.clone()),
            store,
            comparison: ComparisonEngine::new(
                Arc::clone(&repository),
                config.experiment.clone(),
                config.simulation.clone(),
            ),
            lifecycle: ArmLifecycleManager::new(repository),
        }
    }

    // -----------------------------------------------------------------------
    // Hot path
    // -----------------------------------------------------------------------

    pub async fn record_outcome(
        &self,
        version_id: Uuid,
        success: bool,
    ) -> DomainResult<OutcomeDisposition> {
        self.recorder.record_outcome(version_id, success).await
    }

    pub async fn select_version(&self, agent_id: Uuid) -> DomainResult<Uuid> {
        self.allocator.select_version(agent_id).await
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    pub async fn posterior(&self, version_id: Uuid) -> DomainResult<BetaPosterior> {
        self.store.posterior(version_id).await
    }

    pub async fn stats(&self, version_id: Uuid) -> DomainResult<(u64, u64)> {
        self.store.stats(version_id).await
    }

    pub async fn compare(&self, agent_id: Uuid) -> DomainResult<VersionComparison> {
        self.comparison.compare(agent_id).await
    }

    pub async fn compare_with_cancel(
        &self,
        agent_id: Uuid,
        cancel: &CancelFlag,
    ) -> DomainResult<VersionComparison> {
        self.comparison.compare_with_cancel(agent_id, cancel).await
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub async fn create_version(&self, request: NewPromptVersion) -> DomainResult<PromptVersion> {
        self.lifecycle.create(request).await
    }

    pub async fn fork_version(
        &self,
        source_id: Uuid,
        overrides: ForkOverrides,
    ) -> DomainResult<PromptVersion> {
        self.lifecycle.fork(source_id, overrides).await
    }

    pub async fn pause(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.lifecycle.pause(version_id).await
    }

    pub async fn resume(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.lifecycle.resume(version_id).await
    }

    pub async fn eliminate(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.lifecycle.eliminate(version_id).await
    }

    pub async fn activate_as_winner(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.lifecycle.activate_as_winner(version_id).await
    }

    pub async fn activate_for_testing(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.lifecycle.activate_for_testing(version_id).await
    }

    pub async fn get_version(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.lifecycle.get_version(version_id).await
    }

    pub async fn list_versions(&self, agent_id: Uuid) -> DomainResult<Vec<PromptVersion>> {
        self.lifecycle.list_versions(agent_id).await
    }

    pub async fn production_version(&self, agent_id: Uuid) -> DomainResult<Option<PromptVersion>> {
        self.lifecycle.production_version(agent_id).await
    }
}

impl ExperimentService<InMemoryVersionRepository> {
    /// In-memory service. A configured `simulation.seed` also seeds the
    /// allocation sampler, making whole runs reproducible.
    pub fn in_memory(config: &Config) -> Self {
        let sampler: Arc<dyn PosteriorSampler> = match config.simulation.seed {
            Some(seed) => Arc::new(SeededSampler::new(seed)),
            None => Arc::new(ThreadRngSampler),
        };
        Self::new(Arc::new(InMemoryVersionRepository::new()), sampler, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{PromptContent, RecommendedAction};

    #[tokio::test]
    async fn test_end_to_end_flow() {
        let service = ExperimentService::in_memory(&Config::default());
        let agent = Uuid::new_v4();

        let baseline = service
            .create_version(NewPromptVersion::new(agent, PromptContent::new("v1")))
            .await
            .unwrap();
        let challenger = service
            .fork_version(baseline.version_id, ForkOverrides::default())
            .await
            .unwrap();

        for _ in 0..50 {
            let chosen = service.select_version(agent).await.unwrap();
            assert!(chosen == baseline.version_id || chosen == challenger.version_id);
            service.record_outcome(chosen, true).await.unwrap();
        }

        let (_, trials_a) = service.stats(baseline.version_id).await.unwrap();
        let (_, trials_b) = service.stats(challenger.version_id).await.unwrap();
        assert_eq!(trials_a + trials_b, 50);

        let comparison = service.compare(agent).await.unwrap();
        assert_eq!(comparison.versions.len(), 2);
        assert_eq!(comparison.recommended_action, RecommendedAction::CollectingData);
        assert!((comparison.total_probability() - 1.0).abs() < 1e-9);
    }
}
