//! Domain layer for the prompt experimentation engine
//!
//! Pure models (posteriors, arm lifecycle, comparison results), the error
//! taxonomy, and the port traits adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
