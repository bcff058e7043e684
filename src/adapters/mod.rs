//! Infrastructure adapters for the domain ports.

pub mod memory;
pub mod sampling;

pub use memory::InMemoryVersionRepository;
pub use sampling::{SeededSampler, ThreadRngSampler};
