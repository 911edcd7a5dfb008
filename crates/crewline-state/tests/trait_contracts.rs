//! Trait contract tests for SessionStore.
//!
//! Every conforming implementation must pass these; each contract runs
//! against both the in-memory fake and the filesystem store.

use crewline_state::fakes::MemorySessionStore;
use crewline_state::storage_traits::*;
use crewline_state::{FsSessionStore, StorageError};

fn record(id: &str, steps: u64, content: &str) -> SessionRecord {
    SessionRecord::new(
        SessionId::from(id),
        steps,
        serde_json::json!({"name": "demo", "summary": "", "artifacts": []}),
        vec![serde_json::json!({"role": "end_user", "content": content})],
    )
    .unwrap()
}

async fn save_load_round_trip(store: &dyn SessionStore) {
    let saved = record("round-trip", 3, "hello");
    store.save(saved.clone()).await.unwrap();

    let loaded = store.load(&SessionId::from("round-trip")).await.unwrap();
    assert_eq!(loaded.steps, 3);
    assert_eq!(loaded.digest, saved.digest);
    assert_eq!(loaded.messages, saved.messages);
}

async fn load_missing_is_not_found(store: &dyn SessionStore) {
    let err = store.load(&SessionId::from("missing")).await.unwrap_err();
    assert!(matches!(err, StorageError::SessionNotFound { .. }));
}

async fn newer_step_overwrites(store: &dyn SessionStore) {
    store.save(record("grow", 1, "first")).await.unwrap();
    store.save(record("grow", 2, "second")).await.unwrap();

    let loaded = store.load(&SessionId::from("grow")).await.unwrap();
    assert_eq!(loaded.steps, 2);
    assert_eq!(loaded.messages[0]["content"], "second");
}

async fn older_step_is_rejected(store: &dyn SessionStore) {
    store.save(record("stale", 5, "latest")).await.unwrap();
    let err = store.save(record("stale", 4, "older")).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::StaleWrite {
            stored: 5,
            incoming: 4,
            ..
        }
    ));

    let loaded = store.load(&SessionId::from("stale")).await.unwrap();
    assert_eq!(loaded.messages[0]["content"], "latest");
}

async fn list_returns_every_session(store: &dyn SessionStore) {
    store.save(record("list-a", 1, "a")).await.unwrap();
    store.save(record("list-b", 2, "b")).await.unwrap();

    let listed = store.list().await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|s| s.session_id.as_str()).collect();
    assert!(ids.contains(&"list-a"));
    assert!(ids.contains(&"list-b"));
    let b = listed
        .iter()
        .find(|s| s.session_id.as_str() == "list-b")
        .unwrap();
    assert_eq!(b.steps, 2);
    assert_eq!(b.message_count, 1);
}

async fn delete_is_idempotent(store: &dyn SessionStore) {
    store.save(record("gone", 1, "x")).await.unwrap();
    store.delete(&SessionId::from("gone")).await.unwrap();
    store.delete(&SessionId::from("gone")).await.unwrap();

    let err = store.load(&SessionId::from("gone")).await.unwrap_err();
    assert!(matches!(err, StorageError::SessionNotFound { .. }));
}

// ===========================================================================
// MemorySessionStore
// ===========================================================================

#[tokio::test]
async fn memory_save_load_round_trip() {
    save_load_round_trip(&MemorySessionStore::new()).await;
}

#[tokio::test]
async fn memory_load_missing_is_not_found() {
    load_missing_is_not_found(&MemorySessionStore::new()).await;
}

#[tokio::test]
async fn memory_newer_step_overwrites() {
    newer_step_overwrites(&MemorySessionStore::new()).await;
}

#[tokio::test]
async fn memory_older_step_is_rejected() {
    older_step_is_rejected(&MemorySessionStore::new()).await;
}

#[tokio::test]
async fn memory_list_returns_every_session() {
    list_returns_every_session(&MemorySessionStore::new()).await;
}

#[tokio::test]
async fn memory_delete_is_idempotent() {
    delete_is_idempotent(&MemorySessionStore::new()).await;
}

// ===========================================================================
// FsSessionStore
// ===========================================================================

fn fs_store() -> (tempfile::TempDir, FsSessionStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = FsSessionStore::new(dir.path()).unwrap();
    (dir, store)
}

#[tokio::test]
async fn fs_save_load_round_trip() {
    let (_dir, store) = fs_store();
    save_load_round_trip(&store).await;
}

#[tokio::test]
async fn fs_load_missing_is_not_found() {
    let (_dir, store) = fs_store();
    load_missing_is_not_found(&store).await;
}

#[tokio::test]
async fn fs_newer_step_overwrites() {
    let (_dir, store) = fs_store();
    newer_step_overwrites(&store).await;
}

#[tokio::test]
async fn fs_older_step_is_rejected() {
    let (_dir, store) = fs_store();
    older_step_is_rejected(&store).await;
}

#[tokio::test]
async fn fs_list_returns_every_session() {
    let (_dir, store) = fs_store();
    list_returns_every_session(&store).await;
}

#[tokio::test]
async fn fs_delete_is_idempotent() {
    let (_dir, store) = fs_store();
    delete_is_idempotent(&store).await;
}

#[tokio::test]
async fn fs_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = FsSessionStore::new(dir.path()).unwrap();
        store.save(record("durable", 7, "kept")).await.unwrap();
    }
    let reopened = FsSessionStore::new(dir.path()).unwrap();
    let loaded = reopened.load(&SessionId::from("durable")).await.unwrap();
    assert_eq!(loaded.steps, 7);
}
