//! Read access to each version's Beta posterior.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ArmState, BetaPosterior};
use crate::domain::ports::{PosteriorSampler, VersionRepository};

/// Derives posteriors from stored counters; holds no state of its own.
pub struct PosteriorStore<R: VersionRepository> {
    repository: Arc<R>,
    sampler: Arc<dyn PosteriorSampler>,
}

impl<R: VersionRepository> Clone for PosteriorStore<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            sampler: Arc::clone(&self.sampler),
        }
    }
}

impl<R: VersionRepository> PosteriorStore<R> {
    pub fn new(repository: Arc<R>, sampler: Arc<dyn PosteriorSampler>) -> Self {
        Self {
            repository,
            sampler,
        }
    }

    async fn arm(&self, version_id: Uuid) -> DomainResult<ArmState> {
        self.repository
            .arm_state(version_id)
            .await?
            .ok_or(DomainError::UnknownVersion(version_id))
    }

    /// `(successes, trials)` for a version.
    pub async fn stats(&self, version_id: Uuid) -> DomainResult<(u64, u64)> {
        let arm = self.arm(version_id).await?;
        Ok((arm.successes, arm.trials))
    }

    /// Beta(successes + 1, failures + 1).
    pub async fn posterior(&self, version_id: Uuid) -> DomainResult<BetaPosterior> {
        Ok(self.arm(version_id).await?.posterior())
    }

    /// One draw from the version's current posterior.
    pub async fn sample(&self, version_id: Uuid) -> DomainResult<f64> {
        let posterior = self.posterior(version_id).await?;
        Ok(self.sampler.sample(&posterior))
    }

    /// One draw from an already-snapshotted arm.
    pub fn sample_arm(&self, arm: &ArmState) -> f64 {
        self.sampler.sample(&arm.posterior())
    }

    /// Consistent snapshot of an agent's arms.
    pub async fn arms(&self, agent_id: Uuid) -> DomainResult<Vec<ArmState>> {
        self.repository.arm_states(agent_id).await
    }
}
