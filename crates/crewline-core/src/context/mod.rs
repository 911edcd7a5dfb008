//! Context compaction engine.
//!
//! - [`merge`]: folds a role's new file snapshot into its line-tagged view
//! - [`store`]: the per-session [`ProjectContext`]
//! - [`assembler`]: renders the context into a worker conversation

pub mod assembler;
pub mod merge;
pub mod store;

pub use assembler::{assemble, render_role_block, ConversationTurn};
pub use merge::{merge, merge_artifact, Artifact, LineStats, MergedFile};
pub use store::{ProjectContext, RoleArtifact};
