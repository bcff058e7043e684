//! Prompt version creation and operator-driven arm transitions.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ArmStatus, ForkOverrides, LifecycleAction, NewPromptVersion, PromptContent, PromptVersion,
};
use crate::domain::ports::VersionRepository;

pub struct ArmLifecycleManager<R: VersionRepository> {
    repository: Arc<R>,
}

impl<R: VersionRepository> ArmLifecycleManager<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a version, active unless staged without traffic.
    ///
    /// The first version of an agent is its baseline and production version.
    pub async fn create(&self, request: NewPromptVersion) -> DomainResult<PromptVersion> {
        let status = if request.stage_without_traffic {
            ArmStatus::Paused
        } else {
            ArmStatus::Active
        };
        self.create_with_status(request.agent_id, request.content, status)
            .await
    }

    /// Create a new version of the same agent from an existing one.
    ///
    /// Content is copied from the source with `overrides` applied. The fork
    /// starts with zeroed statistics.
    pub async fn fork(
        &self,
        source_id: Uuid,
        overrides: ForkOverrides,
    ) -> DomainResult<PromptVersion> {
        let source = self.get_version(source_id).await?;
        let status = if overrides.stage_without_traffic {
            ArmStatus::Paused
        } else {
            ArmStatus::Active
        };
        let version = self
            .create_with_status(source.agent_id, overrides.apply(&source.content), status)
            .await?;

        tracing::info!(
            source = %source_id,
            version_id = %version.version_id,
            version_number = version.version_number,
            "Forked prompt version"
        );
        Ok(version)
    }

    async fn create_with_status(
        &self,
        agent_id: Uuid,
        content: PromptContent,
        status: ArmStatus,
    ) -> DomainResult<PromptVersion> {
        content.validate().map_err(DomainError::ValidationFailed)?;

        let version = self.repository.create(agent_id, content, status).await?;
        tracing::info!(
            %agent_id,
            version_id = %version.version_id,
            version_number = version.version_number,
            status = %version.arm_status,
            baseline = version.is_baseline,
            "Created prompt version"
        );
        Ok(version)
    }

    /// Stop routing traffic to an active version. Outcomes still count.
    pub async fn pause(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.apply(version_id, LifecycleAction::Pause).await
    }

    /// Return a paused version to the active pool.
    pub async fn resume(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.apply(version_id, LifecycleAction::Resume).await
    }

    /// Permanently retire a version. Statistics are kept.
    pub async fn eliminate(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.apply(version_id, LifecycleAction::Eliminate).await
    }

    /// Make a version the production version and the only active arm.
    pub async fn activate_as_winner(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.apply(version_id, LifecycleAction::ActivateAsWinner)
            .await
    }

    /// Add a version to the active pool; a no-op when already active.
    pub async fn activate_for_testing(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.apply(version_id, LifecycleAction::ActivateForTesting)
            .await
    }

    async fn apply(
        &self,
        version_id: Uuid,
        action: LifecycleAction,
    ) -> DomainResult<PromptVersion> {
        let changes = self.repository.transition(version_id, action).await?;

        for change in &changes {
            if change.is_production == Some(false) && change.to == ArmStatus::Eliminated {
                tracing::warn!(
                    version_id = %change.version_id,
                    "Eliminated the production version; agent has no production version"
                );
            }
            if change.changes_status() {
                tracing::info!(
                    version_id = %change.version_id,
                    %action,
                    from = %change.from,
                    to = %change.to,
                    "Arm status changed"
                );
            } else if let Some(is_production) = change.is_production {
                tracing::info!(
                    version_id = %change.version_id,
                    %action,
                    status = %change.to,
                    is_production,
                    "Production flag changed"
                );
            }
        }

        self.get_version(version_id).await
    }

    pub async fn get_version(&self, version_id: Uuid) -> DomainResult<PromptVersion> {
        self.repository
            .get(version_id)
            .await?
            .ok_or(DomainError::UnknownVersion(version_id))
    }

    /// All versions of an agent, eliminated included, by `version_number`.
    pub async fn list_versions(&self, agent_id: Uuid) -> DomainResult<Vec<PromptVersion>> {
        self.repository.list_by_agent(agent_id).await
    }

    /// The agent's current production version, if it has one.
    pub async fn production_version(&self, agent_id: Uuid) -> DomainResult<Option<PromptVersion>> {
        Ok(self
            .list_versions(agent_id)
            .await?
            .into_iter()
            .find(|v| v.is_production))
    }
}
