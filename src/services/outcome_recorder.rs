//! Records binary conversation outcomes against prompt versions.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{OutcomeDisposition, VersionRepository};

/// Increments per-version trial/success counters.
///
/// Safe to call from many tasks at once: each call is a single atomic
/// update in the repository, so no outcome is lost or double counted.
pub struct OutcomeRecorder<R: VersionRepository> {
    repository: Arc<R>,
}

impl<R: VersionRepository> OutcomeRecorder<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Record one conversation outcome for `version_id`.
    ///
    /// Outcomes arriving after the version was eliminated are discarded and
    /// reported as [`OutcomeDisposition::Discarded`].
    pub async fn record_outcome(
        &self,
        version_id: Uuid,
        success: bool,
    ) -> DomainResult<OutcomeDisposition> {
        let disposition = self.repository.record_outcome(version_id, success).await?;

        match disposition {
            OutcomeDisposition::Recorded { successes, trials } => {
                tracing::debug!(%version_id, success, successes, trials, "Recorded outcome");
            }
            OutcomeDisposition::Discarded => {
                tracing::warn!(%version_id, success, "Discarded outcome for eliminated version");
            }
        }

        Ok(disposition)
    }
}
