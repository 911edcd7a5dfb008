//! Crewline-State: session persistence for the Crewline pipeline
//!
//! This crate provides the persistence layer for generation sessions. After
//! every committed orchestrator step the session's context store and message
//! log are handed to a [`SessionStore`] as JSON, tagged with a content digest.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: Data integrity and stale-write protection. Knows nothing about
//! roles, phases, or merge semantics.
//!
//! ## Key Components
//!
//! - `SessionStore`: async storage trait
//! - `SessionRecord`: digest-verified session snapshot
//! - `FsSessionStore`: one JSON file per session, atomic writes
//! - `fakes::MemorySessionStore`: in-memory store for tests

mod error;
pub mod fakes;
mod fs_store;
pub mod storage_traits;

pub use error::StorageError;
pub use fs_store::FsSessionStore;
pub use storage_traits::{
    ContentDigest, SessionId, SessionRecord, SessionStore, SessionSummary, StorageResult,
};
