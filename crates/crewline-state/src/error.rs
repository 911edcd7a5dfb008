//! Error types for crewline-state

use thiserror::Error;

/// Errors that can occur in the session persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// No record stored under this session id
    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Session id contains characters that are not safe as a storage key
    #[error("invalid session id: {session_id}")]
    InvalidSessionId { session_id: String },

    /// Digest string is not 64 hex characters
    #[error("invalid digest: {digest}")]
    InvalidDigest { digest: String },

    /// Stored payload no longer matches its recorded digest
    #[error("digest mismatch for session {session_id}: expected {expected}, got {actual}")]
    DigestMismatch {
        session_id: String,
        expected: String,
        actual: String,
    },

    /// A save carried an older step count than the one already stored
    #[error("stale write for session {session_id}: stored step {stored}, incoming step {incoming}")]
    StaleWrite {
        session_id: String,
        stored: u64,
        incoming: u64,
    },

    /// Serialization error
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure (e.g. a blocking task panicked)
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_write_message_names_both_steps() {
        let err = StorageError::StaleWrite {
            session_id: "s-1".to_string(),
            stored: 4,
            incoming: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("s-1"));
        assert!(msg.contains("stored step 4"));
        assert!(msg.contains("incoming step 2"));
    }

    #[test]
    fn not_found_display() {
        let err = StorageError::SessionNotFound {
            session_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "session not found: abc");
    }
}
