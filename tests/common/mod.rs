//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use promptbandit::{
    Config, ExperimentService, InMemoryVersionRepository, NewPromptVersion, PromptContent,
    PromptVersion,
};
use uuid::Uuid;

pub type Service = ExperimentService<InMemoryVersionRepository>;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Config with a fixed seed so Monte Carlo estimates and allocation are
/// reproducible.
#[allow(dead_code)]
pub fn seeded_config(seed: u64) -> Config {
    let mut config = Config::default();
    config.simulation.seed = Some(seed);
    config
}

#[allow(dead_code)]
pub fn seeded_service(seed: u64) -> Service {
    ExperimentService::in_memory(&seeded_config(seed))
}

/// Create one active version per `(successes, trials)` pair and replay
/// those outcomes into it. Returned in creation order.
#[allow(dead_code)]
pub async fn versions_with_counts(
    service: &Service,
    agent_id: Uuid,
    counts: &[(u64, u64)],
) -> Vec<PromptVersion> {
    let mut versions = Vec::with_capacity(counts.len());
    for (index, &(successes, trials)) in counts.iter().enumerate() {
        let version = service
            .create_version(NewPromptVersion::new(
                agent_id,
                PromptContent::new(format!("Prompt variant {}", index + 1)),
            ))
            .await
            .expect("Failed to create version");

        for trial in 0..trials {
            service
                .record_outcome(version.version_id, trial < successes)
                .await
                .expect("Failed to record outcome");
        }
        versions.push(version);
    }
    versions
}
