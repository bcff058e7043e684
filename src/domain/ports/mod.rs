//! Port trait definitions (Hexagonal Architecture)
//!
//! - VersionRepository: storage of prompt versions and their counters
//! - PosteriorSampler: randomness source for Thompson draws

pub mod posterior_sampler;
pub mod version_repository;

pub use posterior_sampler::PosteriorSampler;
pub use version_repository::{OutcomeDisposition, VersionRepository};
