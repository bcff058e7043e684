//! Application services for prompt experiments.

pub mod arm_lifecycle;
pub mod comparison_engine;
pub mod experiment_service;
pub mod monte_carlo;
pub mod outcome_recorder;
pub mod posterior_store;
pub mod recommendation_policy;
pub mod thompson_allocator;

pub use arm_lifecycle::ArmLifecycleManager;
pub use comparison_engine::ComparisonEngine;
pub use experiment_service::ExperimentService;
pub use monte_carlo::CancelFlag;
pub use outcome_recorder::OutcomeRecorder;
pub use posterior_store::PosteriorStore;
pub use recommendation_policy::{Recommendation, RecommendationPolicy};
pub use thompson_allocator::ThompsonAllocator;
