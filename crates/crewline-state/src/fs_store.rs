//! Filesystem-backed session store.
//!
//! Layout: `<root>/sessions/<session id>.json`, one pretty-printed
//! [`SessionRecord`] per file. Writes go to a temp file in the same directory
//! and are renamed into place, so a crash never leaves a torn record.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage_traits::*;

/// JSON-file session store.
#[derive(Debug, Clone)]
pub struct FsSessionStore {
    sessions_dir: Arc<PathBuf>,
}

impl FsSessionStore {
    /// Create a store rooted at `root`. Creates `root/sessions/` if needed.
    pub fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let sessions_dir = root.as_ref().join("sessions");
        fs::create_dir_all(&sessions_dir)?;
        Ok(Self {
            sessions_dir: Arc::new(sessions_dir),
        })
    }

    /// Directory holding the session files.
    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn record_path(&self, session_id: &SessionId) -> StorageResult<PathBuf> {
        if !session_id.is_storage_safe() {
            return Err(StorageError::InvalidSessionId {
                session_id: session_id.to_string(),
            });
        }
        Ok(self.sessions_dir.join(format!("{}.json", session_id)))
    }

    fn read_record(path: &Path, session_id: &SessionId) -> StorageResult<SessionRecord> {
        let bytes = fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::SessionNotFound {
                    session_id: session_id.to_string(),
                }
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_record(&self, record: &SessionRecord) -> StorageResult<()> {
        let path = self.record_path(&record.session_id)?;

        let stored = match Self::read_record(&path, &record.session_id) {
            Ok(existing) => Some(existing.steps),
            Err(StorageError::SessionNotFound { .. }) => None,
            Err(e) => return Err(e),
        };
        check_not_stale(stored, record)?;

        let bytes = serde_json::to_vec_pretty(record)?;
        let mut tmp = NamedTempFile::new_in(self.sessions_dir.as_path())?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(
            session_id = %record.session_id,
            steps = record.steps,
            digest = %record.digest.short(),
            "session record written"
        );
        Ok(())
    }

    fn list_records(&self) -> StorageResult<Vec<SessionSummary>> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(self.sessions_dir.as_path())? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match Self::read_record(&path, &SessionId::from(stem)) {
                Ok(record) => summaries.push(record.summary()),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable session file"),
            }
        }
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn blocking<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(FsSessionStore) -> StorageResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| StorageError::Backend(format!("blocking task failed: {e}")))?
    }
}

#[async_trait]
impl SessionStore for FsSessionStore {
    async fn save(&self, record: SessionRecord) -> StorageResult<()> {
        self.blocking(move |store| store.write_record(&record)).await
    }

    async fn load(&self, session_id: &SessionId) -> StorageResult<SessionRecord> {
        let session_id = session_id.clone();
        self.blocking(move |store| {
            let path = store.record_path(&session_id)?;
            let record = Self::read_record(&path, &session_id)?;
            record.verify()?;
            Ok(record)
        })
        .await
    }

    async fn list(&self) -> StorageResult<Vec<SessionSummary>> {
        self.blocking(|store| store.list_records()).await
    }

    async fn delete(&self, session_id: &SessionId) -> StorageResult<()> {
        let session_id = session_id.clone();
        self.blocking(move |store| {
            let path = store.record_path(&session_id)?;
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::Io(e)),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (tempfile::TempDir, FsSessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path()).unwrap();
        (dir, store)
    }

    fn record(id: &str, steps: u64) -> SessionRecord {
        SessionRecord::new(
            SessionId::from(id),
            steps,
            serde_json::json!({"name": "demo", "steps": steps}),
            vec![serde_json::json!({"role": "end_user", "content": "build it"})],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_writes_json_file_named_after_session() {
        let (_dir, store) = make_store();
        store.save(record("abc", 1)).await.unwrap();
        assert!(store.sessions_dir().join("abc.json").exists());
    }

    #[tokio::test]
    async fn rejects_path_traversal_ids() {
        let (_dir, store) = make_store();
        let err = store.load(&SessionId::from("../escape")).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidSessionId { .. }));
    }

    #[tokio::test]
    async fn tampered_file_fails_verification() {
        let (_dir, store) = make_store();
        store.save(record("tamper", 1)).await.unwrap();

        let path = store.sessions_dir().join("tamper.json");
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replace("build it", "build something else")).unwrap();

        let err = store.load(&SessionId::from("tamper")).await.unwrap_err();
        assert!(matches!(err, StorageError::DigestMismatch { .. }));
    }

    #[tokio::test]
    async fn list_skips_foreign_files() {
        let (_dir, store) = make_store();
        store.save(record("one", 1)).await.unwrap();
        std::fs::write(store.sessions_dir().join("notes.txt"), "ignore me").unwrap();
        std::fs::write(store.sessions_dir().join("broken.json"), "{not json").unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].session_id, SessionId::from("one"));
    }
}
