//! Role orchestration.
//!
//! A deterministic state machine that, given the role that produced the
//! latest message and the phase it declared, decides which worker runs next,
//! assembles that worker's input, and commits its output.
//!
//! # Module layout
//!
//! - [`roles`]: `RoleTemplate` and `PhasePolicy` (include filters, phase
//!   resolution, handoff notes)
//! - [`router`]: `TRANSITIONS`, `next_role`, `route`
//! - [`session`]: `Session` and its persisted record form
//! - [`error`]: `OrchestrationError`, `OrchestrationResult`
//! - [`executor`]: `Orchestrator`, `HaltReason`, `ChainReport`

pub mod error;
pub mod executor;
pub mod roles;
pub mod router;
pub mod session;
