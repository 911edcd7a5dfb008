//! Storage trait definitions for Crewline
//!
//! A session's durable state is its context store and message log, handed to
//! a [`SessionStore`] after every committed orchestrator step. The layer is
//! schema-agnostic: both halves travel as JSON values so this crate never
//! depends on the orchestration types.
//!
//! An in-memory fake is provided for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// ContentDigest
// ---------------------------------------------------------------------------

/// Content digest (SHA-256 hex string).
///
/// The inner field is private to guarantee the string is always valid
/// lowercase hex produced by `from_bytes` or validated via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidDigest { digest: s });
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Unique identifier for a generation session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new random SessionId
    pub fn new() -> Self {
        SessionId(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when the id is non-empty and only uses `[A-Za-z0-9_-]`.
    ///
    /// File-backed stores use the id as a file stem.
    pub fn is_storage_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// A persisted session snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    /// Number of committed steps (user inputs + worker runs) at save time.
    pub steps: u64,
    /// Serialized context store.
    pub context: serde_json::Value,
    /// Serialized message log, oldest first.
    pub messages: Vec<serde_json::Value>,
    /// SHA-256 over `(context, messages)`.
    pub digest: ContentDigest,
    pub saved_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Build a record, computing and embedding the payload digest.
    pub fn new(
        session_id: SessionId,
        steps: u64,
        context: serde_json::Value,
        messages: Vec<serde_json::Value>,
    ) -> StorageResult<Self> {
        let digest = payload_digest(&context, &messages)?;
        Ok(Self {
            session_id,
            steps,
            context,
            messages,
            digest,
            saved_at: Utc::now(),
        })
    }

    /// Re-derive the digest and compare it to the embedded one.
    pub fn verify(&self) -> StorageResult<()> {
        let computed = payload_digest(&self.context, &self.messages)?;
        if computed != self.digest {
            return Err(StorageError::DigestMismatch {
                session_id: self.session_id.to_string(),
                expected: self.digest.to_string(),
                actual: computed.to_string(),
            });
        }
        Ok(())
    }

    /// Lightweight projection used for listings.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            steps: self.steps,
            message_count: self.messages.len(),
            digest: self.digest.clone(),
            saved_at: self.saved_at,
        }
    }
}

fn payload_digest(
    context: &serde_json::Value,
    messages: &[serde_json::Value],
) -> StorageResult<ContentDigest> {
    let bytes = serde_json::to_vec(&(context, messages))?;
    Ok(ContentDigest::from_bytes(&bytes))
}

/// Listing entry for a stored session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub steps: u64,
    pub message_count: usize,
    pub digest: ContentDigest,
    pub saved_at: DateTime<Utc>,
}

/// Session persistence.
///
/// Guarantees:
/// - `save` replaces the stored record for the session.
/// - A save whose `steps` is lower than the stored record's is rejected with
///   [`StorageError::StaleWrite`]; equal step counts overwrite.
/// - `load` returns a record whose digest verifies.
/// - `list` is ordered newest save first, ties broken by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a session snapshot.
    async fn save(&self, record: SessionRecord) -> StorageResult<()>;

    /// Load the latest snapshot. Returns `StorageError::SessionNotFound` if absent.
    async fn load(&self, session_id: &SessionId) -> StorageResult<SessionRecord>;

    /// Summaries of every stored session.
    async fn list(&self) -> StorageResult<Vec<SessionSummary>>;

    /// Remove a session. No-op if absent.
    async fn delete(&self, session_id: &SessionId) -> StorageResult<()>;
}

/// Shared ordering for `SessionStore::list` implementations.
pub(crate) fn sort_summaries(summaries: &mut [SessionSummary]) {
    summaries.sort_by(|a, b| {
        b.saved_at
            .cmp(&a.saved_at)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
}

/// Shared stale-write check for `SessionStore::save` implementations.
pub(crate) fn check_not_stale(
    stored: Option<u64>,
    incoming: &SessionRecord,
) -> StorageResult<()> {
    match stored {
        Some(stored) if stored > incoming.steps => Err(StorageError::StaleWrite {
            session_id: incoming.session_id.to_string(),
            stored,
            incoming: incoming.steps,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_for_identical_payloads() {
        let a = SessionRecord::new(
            SessionId::from("s"),
            1,
            serde_json::json!({"name": "x"}),
            vec![serde_json::json!({"content": "hi"})],
        )
        .unwrap();
        let b = SessionRecord::new(
            SessionId::from("s"),
            1,
            serde_json::json!({"name": "x"}),
            vec![serde_json::json!({"content": "hi"})],
        )
        .unwrap();
        assert_eq!(a.digest, b.digest);
    }

    #[test]
    fn verify_rejects_tampered_context() {
        let mut record = SessionRecord::new(
            SessionId::from("s"),
            1,
            serde_json::json!({"name": "x"}),
            vec![],
        )
        .unwrap();
        record.context = serde_json::json!({"name": "y"});
        assert!(matches!(
            record.verify(),
            Err(StorageError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn digest_try_from_validates_hex() {
        assert!(ContentDigest::try_from("abcd".to_string()).is_err());
        let ok = ContentDigest::from_bytes(b"data");
        let parsed = ContentDigest::try_from(ok.as_str().to_uppercase()).unwrap();
        assert_eq!(parsed, ok);
    }

    #[test]
    fn session_id_storage_safety() {
        assert!(SessionId::from("abc-123_x").is_storage_safe());
        assert!(!SessionId::from("../etc").is_storage_safe());
        assert!(!SessionId::from("").is_storage_safe());
        assert!(SessionId::new().is_storage_safe());
    }
}
