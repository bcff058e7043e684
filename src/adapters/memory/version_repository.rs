//! In-memory version repository using `DashMap`.
//!
//! Every version lives in its own slot guarded by a short `Mutex`, so
//! outcome recording for one version never waits on another. Each agent
//! owns a ledger (`RwLock` over its ordered slots): snapshots take the read
//! side, lifecycle transitions take the write side. Status and production
//! flags only change under the ledger write lock, which makes every
//! transition appear atomic to snapshot readers.
//!
//! Data is lost on process restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    plan_transition, ArmState, ArmStatus, LifecycleAction, PromptContent, PromptVersion,
    StatusChange,
};
use crate::domain::ports::{OutcomeDisposition, VersionRepository};

/// Mutable part of a version.
#[derive(Debug)]
struct SlotState {
    successes: u64,
    trials: u64,
    arm_status: ArmStatus,
    is_production: bool,
    updated_at: DateTime<Utc>,
}

#[derive(Debug)]
struct VersionSlot {
    version_id: Uuid,
    agent_id: Uuid,
    version_number: u32,
    is_baseline: bool,
    content: PromptContent,
    created_at: DateTime<Utc>,
    state: Mutex<SlotState>,
}

impl VersionSlot {
    fn from_version(version: &PromptVersion) -> Self {
        Self {
            version_id: version.version_id,
            agent_id: version.agent_id,
            version_number: version.version_number,
            is_baseline: version.is_baseline,
            content: version.content.clone(),
            created_at: version.created_at,
            state: Mutex::new(SlotState {
                successes: version.successes,
                trials: version.trials,
                arm_status: version.arm_status,
                is_production: version.is_production,
                updated_at: version.updated_at,
            }),
        }
    }

    // Counters stay internally consistent even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm_state(&self) -> ArmState {
        let state = self.lock();
        ArmState {
            version_id: self.version_id,
            version_number: self.version_number,
            is_baseline: self.is_baseline,
            is_production: state.is_production,
            successes: state.successes,
            trials: state.trials,
            arm_status: state.arm_status,
        }
    }

    fn snapshot(&self) -> PromptVersion {
        let state = self.lock();
        PromptVersion {
            version_id: self.version_id,
            agent_id: self.agent_id,
            version_number: self.version_number,
            content: self.content.clone(),
            is_baseline: self.is_baseline,
            is_production: state.is_production,
            successes: state.successes,
            trials: state.trials,
            arm_status: state.arm_status,
            created_at: self.created_at,
            updated_at: state.updated_at,
        }
    }

    fn apply(&self, change: &StatusChange, now: DateTime<Utc>) {
        let mut state = self.lock();
        state.arm_status = change.to;
        if let Some(is_production) = change.is_production {
            state.is_production = is_production;
        }
        state.updated_at = now;
    }
}

/// Per-agent ordered list of versions.
#[derive(Debug, Default)]
struct AgentLedger {
    slots: RwLock<Vec<Arc<VersionSlot>>>,
}

/// In-memory [`VersionRepository`].
#[derive(Debug, Default)]
pub struct InMemoryVersionRepository {
    versions: DashMap<Uuid, Arc<VersionSlot>>,
    agents: DashMap<Uuid, Arc<AgentLedger>>,
}

impl InMemoryVersionRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored versions across all agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    fn slot(&self, version_id: Uuid) -> DomainResult<Arc<VersionSlot>> {
        self.versions
            .get(&version_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(DomainError::UnknownVersion(version_id))
    }

    fn ledger(&self, agent_id: Uuid) -> DomainResult<Arc<AgentLedger>> {
        self.agents
            .get(&agent_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(DomainError::UnknownAgent(agent_id))
    }
}

#[async_trait]
impl VersionRepository for InMemoryVersionRepository {
    async fn create(
        &self,
        agent_id: Uuid,
        content: PromptContent,
        status: ArmStatus,
    ) -> DomainResult<PromptVersion> {
        let ledger = Arc::clone(&self.agents.entry(agent_id).or_default());
        let mut slots = ledger.slots.write().await;

        let version_number = u32::try_from(slots.len() + 1).map_err(|_| {
            DomainError::ValidationFailed(format!("agent {agent_id} has too many versions"))
        })?;
        let version = PromptVersion::new(agent_id, version_number, content, status);

        let slot = Arc::new(VersionSlot::from_version(&version));
        self.versions.insert(version.version_id, Arc::clone(&slot));
        slots.push(slot);

        Ok(version)
    }

    async fn get(&self, version_id: Uuid) -> DomainResult<Option<PromptVersion>> {
        Ok(self
            .versions
            .get(&version_id)
            .map(|entry| entry.value().snapshot()))
    }

    async fn list_by_agent(&self, agent_id: Uuid) -> DomainResult<Vec<PromptVersion>> {
        let ledger = self.ledger(agent_id)?;
        let slots = ledger.slots.read().await;
        Ok(slots.iter().map(|slot| slot.snapshot()).collect())
    }

    async fn arm_states(&self, agent_id: Uuid) -> DomainResult<Vec<ArmState>> {
        let ledger = self.ledger(agent_id)?;
        let slots = ledger.slots.read().await;
        Ok(slots.iter().map(|slot| slot.arm_state()).collect())
    }

    async fn arm_state(&self, version_id: Uuid) -> DomainResult<Option<ArmState>> {
        Ok(self
            .versions
            .get(&version_id)
            .map(|entry| entry.value().arm_state()))
    }

    async fn record_outcome(
        &self,
        version_id: Uuid,
        success: bool,
    ) -> DomainResult<OutcomeDisposition> {
        let slot = self.slot(version_id)?;
        let mut state = slot.lock();

        if state.arm_status == ArmStatus::Eliminated {
            return Ok(OutcomeDisposition::Discarded);
        }

        state.trials += 1;
        if success {
            state.successes += 1;
        }
        state.updated_at = Utc::now();

        Ok(OutcomeDisposition::Recorded {
            successes: state.successes,
            trials: state.trials,
        })
    }

    async fn transition(
        &self,
        version_id: Uuid,
        action: LifecycleAction,
    ) -> DomainResult<Vec<StatusChange>> {
        let target = self.slot(version_id)?;
        let ledger = self.ledger(target.agent_id)?;
        let slots = ledger.slots.write().await;

        let arms: Vec<ArmState> = slots.iter().map(|slot| slot.arm_state()).collect();
        let changes = plan_transition(action, version_id, &arms)?;

        let now = Utc::now();
        for change in &changes {
            if let Some(slot) = slots.iter().find(|s| s.version_id == change.version_id) {
                slot.apply(change, now);
            }
        }

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(text: &str) -> PromptContent {
        PromptContent::new(text)
    }

    #[tokio::test]
    async fn test_version_numbers_per_agent() {
        let repo = InMemoryVersionRepository::new();
        let agent_a = Uuid::new_v4();
        let agent_b = Uuid::new_v4();

        let a1 = repo.create(agent_a, content("a1"), ArmStatus::Active).await.unwrap();
        let a2 = repo.create(agent_a, content("a2"), ArmStatus::Active).await.unwrap();
        let b1 = repo.create(agent_b, content("b1"), ArmStatus::Active).await.unwrap();

        assert_eq!(a1.version_number, 1);
        assert_eq!(a2.version_number, 2);
        assert_eq!(b1.version_number, 1);
        assert!(a1.is_baseline && a1.is_production);
        assert!(!a2.is_baseline && !a2.is_production);
        assert_eq!(repo.len(), 3);
    }

    #[tokio::test]
    async fn test_record_outcome_updates_counters() {
        let repo = InMemoryVersionRepository::new();
        let v = repo
            .create(Uuid::new_v4(), content("p"), ArmStatus::Active)
            .await
            .unwrap();

        repo.record_outcome(v.version_id, true).await.unwrap();
        let result = repo.record_outcome(v.version_id, false).await.unwrap();

        assert_eq!(
            result,
            OutcomeDisposition::Recorded {
                successes: 1,
                trials: 2
            }
        );
        let state = repo.arm_state(v.version_id).await.unwrap().unwrap();
        assert_eq!((state.successes, state.trials), (1, 2));
    }

    #[tokio::test]
    async fn test_record_outcome_for_paused_version_counts() {
        let repo = InMemoryVersionRepository::new();
        let v = repo
            .create(Uuid::new_v4(), content("p"), ArmStatus::Paused)
            .await
            .unwrap();

        let result = repo.record_outcome(v.version_id, true).await.unwrap();
        assert!(result.is_recorded());
    }

    #[tokio::test]
    async fn test_record_outcome_after_elimination_is_discarded() {
        let repo = InMemoryVersionRepository::new();
        let v = repo
            .create(Uuid::new_v4(), content("p"), ArmStatus::Active)
            .await
            .unwrap();
        repo.record_outcome(v.version_id, true).await.unwrap();
        repo.transition(v.version_id, LifecycleAction::Eliminate)
            .await
            .unwrap();

        let result = repo.record_outcome(v.version_id, true).await.unwrap();
        assert_eq!(result, OutcomeDisposition::Discarded);

        let state = repo.arm_state(v.version_id).await.unwrap().unwrap();
        assert_eq!((state.successes, state.trials), (1, 1));
        assert_eq!(state.arm_status, ArmStatus::Eliminated);
        assert!(!state.is_production);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let repo = InMemoryVersionRepository::new();
        let missing = Uuid::new_v4();

        assert!(repo.get(missing).await.unwrap().is_none());
        assert!(matches!(
            repo.record_outcome(missing, true).await,
            Err(DomainError::UnknownVersion(_))
        ));
        assert!(matches!(
            repo.arm_states(missing).await,
            Err(DomainError::UnknownAgent(_))
        ));
        assert!(matches!(
            repo.transition(missing, LifecycleAction::Pause).await,
            Err(DomainError::UnknownVersion(_))
        ));
    }

    #[tokio::test]
    async fn test_transition_to_winner_applies_all_changes() {
        let repo = InMemoryVersionRepository::new();
        let agent = Uuid::new_v4();
        let v1 = repo.create(agent, content("1"), ArmStatus::Active).await.unwrap();
        let v2 = repo.create(agent, content("2"), ArmStatus::Active).await.unwrap();
        let v3 = repo.create(agent, content("3"), ArmStatus::Paused).await.unwrap();

        repo.transition(v3.version_id, LifecycleAction::ActivateAsWinner)
            .await
            .unwrap();

        let versions = repo.list_by_agent(agent).await.unwrap();
        let status: Vec<_> = versions.iter().map(|v| (v.arm_status, v.is_production)).collect();
        assert_eq!(
            status,
            vec![
                (ArmStatus::Paused, false),
                (ArmStatus::Paused, false),
                (ArmStatus::Active, true),
            ]
        );
        assert_eq!(versions[0].version_id, v1.version_id);
        assert_eq!(versions[1].version_id, v2.version_id);
    }

    #[tokio::test]
    async fn test_failed_transition_changes_nothing() {
        let repo = InMemoryVersionRepository::new();
        let v = repo
            .create(Uuid::new_v4(), content("p"), ArmStatus::Paused)
            .await
            .unwrap();
        let before = repo.get(v.version_id).await.unwrap().unwrap();

        let err = repo
            .transition(v.version_id, LifecycleAction::Pause)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));

        let after = repo.get(v.version_id).await.unwrap().unwrap();
        assert_eq!(before, after);
    }
}
