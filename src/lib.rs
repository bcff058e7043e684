//! promptbandit - Prompt Version Experimentation Engine
//!
//! promptbandit decides which prompt version an agent serves on each
//! conversation. Every version carries a Beta-Bernoulli posterior over its
//! booking rate; Thompson sampling allocates traffic, Monte Carlo estimates
//! each version's probability of being best, and a recommendation policy
//! tells the operator when to keep collecting data, eliminate a loser or
//! promote a winner.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Versions, posteriors, lifecycle rules and ports
//! - **Service Layer** (`services`): Recording, allocation, comparison and lifecycle
//! - **Adapters** (`adapters`): In-memory version store and random samplers
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use promptbandit::{Config, ExperimentService, NewPromptVersion, PromptContent};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = ExperimentService::in_memory(&Config::default());
//!     let agent_id = Uuid::new_v4();
//!     service
//!         .create_version(NewPromptVersion::new(agent_id, PromptContent::new("Be brief.")))
//!         .await?;
//!
//!     let version_id = service.select_version(agent_id).await?;
//!     service.record_outcome(version_id, true).await?;
//!     println!("{}", service.compare(agent_id).await?.recommended_action);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::{InMemoryVersionRepository, SeededSampler, ThreadRngSampler};
pub use domain::models::{
    ArmState, ArmStatus, BetaPosterior, Config, ExperimentConfig, ForkOverrides,
    LifecycleAction, NewPromptVersion, PromptContent, PromptVersion, RecommendedAction,
    VersionComparison, VersionStats,
};
pub use domain::ports::{OutcomeDisposition, PosteriorSampler, VersionRepository};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    ArmLifecycleManager, CancelFlag, ComparisonEngine, ExperimentService, OutcomeRecorder,
    PosteriorStore, RecommendationPolicy, ThompsonAllocator,
};
