//! Version repository port for experiment state.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    ArmState, ArmStatus, LifecycleAction, PromptContent, PromptVersion, StatusChange,
};

/// What happened to a recorded outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeDisposition {
    /// Counters were incremented; carries the values after the update.
    Recorded { successes: u64, trials: u64 },
    /// The version was eliminated; counters are unchanged.
    Discarded,
}

impl OutcomeDisposition {
    pub const fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// Repository interface for prompt versions and their bandit counters.
///
/// Implementations serialize work per version for outcome recording and per
/// agent for lifecycle transitions; unrelated versions and agents must not
/// contend with each other.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Create a version with the agent's next `version_number` (starting at 1).
    ///
    /// The agent's first version becomes baseline and production.
    async fn create(
        &self,
        agent_id: Uuid,
        content: PromptContent,
        status: ArmStatus,
    ) -> DomainResult<PromptVersion>;

    /// Load a version by its ID.
    async fn get(&self, version_id: Uuid) -> DomainResult<Option<PromptVersion>>;

    /// All versions of an agent (eliminated included), ordered by `version_number`.
    ///
    /// Fails with `UnknownAgent` when the agent has never had a version.
    async fn list_by_agent(&self, agent_id: Uuid) -> DomainResult<Vec<PromptVersion>>;

    /// Consistent snapshot of every arm of an agent, ordered by `version_number`.
    ///
    /// No lifecycle transition is observed half-applied. Fails with
    /// `UnknownAgent` when the agent has never had a version.
    async fn arm_states(&self, agent_id: Uuid) -> DomainResult<Vec<ArmState>>;

    /// Current counters and status of one version.
    async fn arm_state(&self, version_id: Uuid) -> DomainResult<Option<ArmState>>;

    /// Atomically add one trial (and one success when `success`).
    ///
    /// Outcomes for eliminated versions are discarded. Fails with
    /// `UnknownVersion` when the version does not exist.
    async fn record_outcome(&self, version_id: Uuid, success: bool)
        -> DomainResult<OutcomeDisposition>;

    /// Plan and apply a lifecycle action against the version's agent.
    ///
    /// Implementations evaluate [`crate::domain::models::plan_transition`] on a
    /// consistent snapshot and apply every resulting change as one step.
    /// Returns the applied changes.
    async fn transition(
        &self,
        version_id: Uuid,
        action: LifecycleAction,
    ) -> DomainResult<Vec<StatusChange>>;
}
