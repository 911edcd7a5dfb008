//! Error types for role orchestration.

use crewline_state::StorageError;

/// Errors produced by the orchestration layer.
///
/// Worker failures are not errors here: they halt the chain and are reported
/// through [`HaltReason`](crate::role_orchestration::executor::HaltReason).
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("session {session_id} already has messages; use revise instead of start")]
    AlreadyStarted { session_id: String },

    #[error("session {session_id} has no messages; use start instead of revise")]
    NotStarted { session_id: String },

    #[error("persistence failed: {0}")]
    Storage(#[from] StorageError),

    #[error("session encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("domain error: {0}")]
    Domain(#[from] crate::domain::error::CrewlineError),
}

/// Result type for orchestration operations.
pub type OrchestrationResult<T> = std::result::Result<T, OrchestrationError>;
