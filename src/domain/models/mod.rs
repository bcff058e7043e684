pub mod arm;
pub mod comparison;
pub mod config;
pub mod posterior;
pub mod prompt_version;

pub use arm::{plan_transition, ArmState, LifecycleAction, StatusChange};
pub use comparison::{RecommendedAction, VersionComparison, VersionStats};
pub use config::{Config, ExperimentConfig, LoggingConfig, SimulationConfig};
pub use posterior::BetaPosterior;
pub use prompt_version::{
    ArmStatus, ForkOverrides, NewPromptVersion, PromptContent, PromptVersion,
};
