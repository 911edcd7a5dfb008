//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemorySessionStore`, which satisfies the `SessionStore` contract
//! without touching the filesystem.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::storage_traits::*;

/// In-memory session store backed by a `HashMap<session id, record>`.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, SessionRecord>>> {
        self.sessions
            .lock()
            .map_err(|_| StorageError::Backend("session map lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, record: SessionRecord) -> StorageResult<()> {
        let mut sessions = self.lock()?;
        let stored = sessions.get(record.session_id.as_str()).map(|r| r.steps);
        check_not_stale(stored, &record)?;
        sessions.insert(record.session_id.0.clone(), record);
        Ok(())
    }

    async fn load(&self, session_id: &SessionId) -> StorageResult<SessionRecord> {
        let sessions = self.lock()?;
        let record = sessions
            .get(session_id.as_str())
            .cloned()
            .ok_or_else(|| StorageError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;
        record.verify()?;
        Ok(record)
    }

    async fn list(&self) -> StorageResult<Vec<SessionSummary>> {
        let sessions = self.lock()?;
        let mut summaries: Vec<SessionSummary> =
            sessions.values().map(SessionRecord::summary).collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn delete(&self, session_id: &SessionId) -> StorageResult<()> {
        let mut sessions = self.lock()?;
        sessions.remove(session_id.as_str());
        Ok(())
    }
}
