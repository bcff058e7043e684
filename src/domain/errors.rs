//! Domain errors for the prompt experimentation engine.

use thiserror::Error;
use uuid::Uuid;

use super::models::ArmStatus;

/// Domain-level errors that can occur while running prompt experiments.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Prompt version not found: {0}")]
    UnknownVersion(Uuid),

    #[error("Agent not found: {0}")]
    UnknownAgent(Uuid),

    #[error("Cannot {action} version {version_id}: version is {from}")]
    InvalidTransition {
        version_id: Uuid,
        from: ArmStatus,
        action: &'static str,
    },

    #[error("Agent {0} has no active prompt version")]
    NoActiveVersion(Uuid),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Comparison cancelled")]
    Cancelled,
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether the error represents a missing entity (maps to a not-found response).
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownVersion(_) | Self::UnknownAgent(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message_names_state() {
        let id = Uuid::new_v4();
        let err = DomainError::InvalidTransition {
            version_id: id,
            from: ArmStatus::Eliminated,
            action: "resume",
        };
        let msg = err.to_string();
        assert!(msg.contains("Cannot resume"));
        assert!(msg.contains("eliminated"));
        assert!(msg.contains(&id.to_string()));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(DomainError::UnknownVersion(Uuid::new_v4()).is_not_found());
        assert!(DomainError::UnknownAgent(Uuid::new_v4()).is_not_found());
        assert!(!DomainError::NoActiveVersion(Uuid::new_v4()).is_not_found());
        assert!(!DomainError::Cancelled.is_not_found());
    }
}
