//! Structured observability hooks for the orchestration lifecycle.
//!
//! This module provides:
//! - Session-scoped tracing spans via the `SessionSpan` RAII guard
//! - Emission functions for chain start/halt, step start/finish/failure,
//!   and context updates
//!
//! Events are emitted at `info!` level (failures at `error!`). Verbosity is
//! controlled through `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use tracing::{error, info};

use crate::domain::phase::Phase;
use crate::domain::role::Role;

/// RAII guard that enters a session-scoped tracing span.
///
/// Use in synchronous code only; async code should attach
/// [`session_span`] with `tracing::Instrument`.
///
/// ```ignore
/// let _span = SessionSpan::enter("4f1c...");
/// // every event below carries session_id = "4f1c..."
/// ```
pub struct SessionSpan {
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    pub fn enter(session_id: &str) -> Self {
        Self {
            _span: session_span(session_id).entered(),
        }
    }
}

/// Span tagged with the session id.
pub fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("crewline.session", session_id = %session_id)
}

pub fn emit_chain_started(session_id: &str, role: Role, phase: Phase) {
    info!(event = "chain.started", session_id = %session_id, role = %role, phase = %phase);
}

pub fn emit_step_started(session_id: &str, role: Role, trigger: Phase, model: &str) {
    info!(
        event = "step.started",
        session_id = %session_id,
        role = %role,
        trigger = %trigger,
        model = %model,
    );
}

pub fn emit_step_finished(
    session_id: &str,
    role: Role,
    next_phase: Phase,
    input_tokens: u64,
    output_tokens: u64,
    fallback: bool,
) {
    info!(
        event = "step.finished",
        session_id = %session_id,
        role = %role,
        next_phase = %next_phase,
        input_tokens = input_tokens,
        output_tokens = output_tokens,
        fallback = fallback,
    );
}

pub fn emit_step_failed(session_id: &str, role: Role, error: &dyn std::fmt::Display) {
    error!(event = "step.failed", session_id = %session_id, role = %role, error = %error);
}

pub fn emit_chain_halted(session_id: &str, reason: &str, steps: usize) {
    info!(event = "chain.halted", session_id = %session_id, reason = %reason, steps = steps);
}

/// One role's artifact was merged. `changed_files` counts files whose
/// merged view carries added or removed lines.
pub fn emit_context_updated(session_id: &str, role: Role, files: usize, changed_files: usize) {
    info!(
        event = "context.updated",
        session_id = %session_id,
        role = %role,
        files = files,
        changed_files = changed_files,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_span_create() {
        let _span = SessionSpan::enter("test-session");
    }
}
