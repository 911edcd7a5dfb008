//! Domain models for Crewline.
//!
//! Canonical definitions for the pipeline vocabulary:
//! - `Role`: the fixed set of pipeline participants
//! - `Phase`: a declared next stage, used purely for routing
//! - `Message`: immutable log entry produced by every committed step

pub mod error;
pub mod message;
pub mod phase;
pub mod role;

// Re-export main types and errors
pub use error::{CrewlineError, Result};
pub use message::{ArtifactKind, ArtifactRef, Message, MessageLog, Usage, UsageTotals};
pub use phase::Phase;
pub use role::{Role, TransportRole};
