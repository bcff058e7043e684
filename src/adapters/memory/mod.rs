//! In-memory adapters.

mod version_repository;

pub use version_repository::InMemoryVersionRepository;
