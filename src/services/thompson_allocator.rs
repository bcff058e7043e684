//! Thompson sampling traffic allocation.
//!
//! Each call draws once from every active arm's posterior and serves the
//! version with the largest draw. Arms with more evidence of a high
//! booking rate win more often, while uncertain arms still get explored.

use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ArmState, ArmStatus};
use crate::domain::ports::VersionRepository;
use crate::services::posterior_store::PosteriorStore;

pub struct ThompsonAllocator<R: VersionRepository> {
    store: PosteriorStore<R>,
}

impl<R: VersionRepository> ThompsonAllocator<R> {
    pub fn new(store: PosteriorStore<R>) -> Self {
        Self { store }
    }

    /// Choose which version serves the next conversation for `agent_id`.
    ///
    /// Fails with `UnknownAgent` if the agent has no versions and with
    /// `NoActiveVersion` if none of them is active. A single active version
    /// is returned without sampling. Equal draws go to the lower
    /// `version_number`.
    pub async fn select_version(&self, agent_id: Uuid) -> DomainResult<Uuid> {
        let mut active: Vec<ArmState> = self
            .store
            .arms(agent_id)
            .await?
            .into_iter()
            .filter(|arm| arm.arm_status == ArmStatus::Active)
            .collect();
        active.sort_by_key(|arm| arm.version_number);

        let selected = match active.as_slice() {
            [] => return Err(DomainError::NoActiveVersion(agent_id)),
            [only] => only.version_id,
            arms => self.draw(arms),
        };

        tracing::trace!(%agent_id, version_id = %selected, "Selected prompt version");
        Ok(selected)
    }

    fn draw(&self, arms: &[ArmState]) -> Uuid {
        let mut best = arms[0].version_id;
        let mut best_sample = f64::NEG_INFINITY;

        for arm in arms {
            let sample = self.store.sample_arm(arm);
            if sample > best_sample {
                best_sample = sample;
                best = arm.version_id;
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryVersionRepository, SeededSampler};
    use crate::domain::models::{BetaPosterior, LifecycleAction, PromptContent};
    use crate::domain::ports::PosteriorSampler;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSampler(AtomicUsize);

    impl PosteriorSampler for CountingSampler {
        fn sample(&self, _posterior: &BetaPosterior) -> f64 {
            self.0.fetch_add(1, Ordering::SeqCst);
            0.5
        }
    }

    #[tokio::test]
    async fn test_single_active_version_skips_sampling() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let sampler = Arc::new(CountingSampler(AtomicUsize::new(0)));
        let allocator = ThompsonAllocator::new(PosteriorStore::new(
            Arc::clone(&repo),
            Arc::clone(&sampler) as Arc<dyn PosteriorSampler>,
        ));
        let agent = Uuid::new_v4();
        let v1 = repo.create(agent, PromptContent::new("a"), ArmStatus::Active).await.unwrap();
        repo.create(agent, PromptContent::new("b"), ArmStatus::Paused).await.unwrap();

        for _ in 0..10 {
            assert_eq!(allocator.select_version(agent).await.unwrap(), v1.version_id);
        }
        assert_eq!(sampler.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tied_draws_go_to_lowest_version_number() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let sampler: Arc<dyn PosteriorSampler> = Arc::new(CountingSampler(AtomicUsize::new(0)));
        let allocator = ThompsonAllocator::new(PosteriorStore::new(Arc::clone(&repo), sampler));
        let agent = Uuid::new_v4();
        let v1 = repo.create(agent, PromptContent::new("a"), ArmStatus::Active).await.unwrap();
        repo.create(agent, PromptContent::new("b"), ArmStatus::Active).await.unwrap();
        repo.create(agent, PromptContent::new("c"), ArmStatus::Active).await.unwrap();

        assert_eq!(allocator.select_version(agent).await.unwrap(), v1.version_id);
    }

    #[tokio::test]
    async fn test_no_active_version() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let allocator = ThompsonAllocator::new(PosteriorStore::new(
            Arc::clone(&repo),
            Arc::new(SeededSampler::new(3)),
        ));
        let agent = Uuid::new_v4();
        repo.create(agent, PromptContent::new("a"), ArmStatus::Paused).await.unwrap();

        let err = allocator.select_version(agent).await.unwrap_err();
        assert!(matches!(err, DomainError::NoActiveVersion(id) if id == agent));
    }

    #[tokio::test]
    async fn test_unknown_agent() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let allocator =
            ThompsonAllocator::new(PosteriorStore::new(repo, Arc::new(SeededSampler::new(3))));
        let err = allocator.select_version(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::UnknownAgent(_)));
    }

    #[tokio::test]
    async fn test_paused_and_eliminated_never_selected() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let allocator = ThompsonAllocator::new(PosteriorStore::new(
            Arc::clone(&repo),
            Arc::new(SeededSampler::new(17)),
        ));
        let agent = Uuid::new_v4();
        let a = repo.create(agent, PromptContent::new("a"), ArmStatus::Active).await.unwrap();
        let b = repo.create(agent, PromptContent::new("b"), ArmStatus::Active).await.unwrap();
        let c = repo.create(agent, PromptContent::new("c"), ArmStatus::Active).await.unwrap();
        repo.transition(b.version_id, LifecycleAction::Pause)
            .await
            .unwrap();
        repo.transition(c.version_id, LifecycleAction::Eliminate)
            .await
            .unwrap();
        let d = repo.create(agent, PromptContent::new("d"), ArmStatus::Active).await.unwrap();

        for _ in 0..200 {
            let chosen = allocator.select_version(agent).await.unwrap();
            assert!(chosen == a.version_id || chosen == d.version_id);
        }
    }
}
