//! Domain-level error taxonomy for Crewline.

use crate::domain::role::Role;

/// Crewline domain errors.
#[derive(Debug, thiserror::Error)]
pub enum CrewlineError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown phase: {0}")]
    UnknownPhase(String),

    #[error("unknown model tier: {0}")]
    UnknownTier(String),

    #[error("merged file invariant violated: {lines} lines but {status} status tags")]
    MergeInvariant { lines: usize, status: usize },

    #[error("context holds more than one artifact for role {0}")]
    DuplicateArtifact(Role),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Crewline domain operations.
pub type Result<T> = std::result::Result<T, CrewlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_invariant_display() {
        let err = CrewlineError::MergeInvariant {
            lines: 3,
            status: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("3 lines"));
        assert!(msg.contains("2 status tags"));
    }

    #[test]
    fn test_duplicate_artifact_names_role() {
        let err = CrewlineError::DuplicateArtifact(Role::Implementer);
        assert!(err.to_string().contains("implementer"));
    }
}
