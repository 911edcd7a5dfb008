//! Worker adapter boundary.
//!
//! A [`Worker`] performs one role's task: it receives the assembled
//! conversation plus a model identifier and returns text, structured fields,
//! and usage metrics. The orchestrator only ever talks to workers through a
//! [`WorkerRegistry`].

pub mod scripted;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::ConversationTurn;
use crate::domain::message::Usage;
use crate::domain::phase::Phase;
use crate::domain::role::Role;

pub use scripted::ScriptedWorker;

/// Input handed to a worker for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub role: Role,
    pub conversation: Vec<ConversationTurn>,
    pub model: String,
    /// Phase of the message that routed to this worker.
    pub trigger: Phase,
    pub tdd_enabled: bool,
}

/// Result of a worker call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerOutput {
    pub text: String,
    pub declared_phase: Option<Phase>,
    /// Project name proposed by the manager on the first request.
    pub name: Option<String>,
    pub summary: Option<String>,
    pub files: BTreeMap<String, String>,
    pub usage: Usage,
    pub time_taken_secs: f64,
    /// Set when the adapter returned a best-effort result after a failure.
    pub fallback: bool,
}

impl WorkerOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.declared_phase = Some(phase);
        self
    }

    pub fn with_identity(mut self, name: impl Into<String>, summary: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self.summary = Some(summary.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = Usage::new(input_tokens, output_tokens);
        self
    }

    pub fn with_time(mut self, secs: f64) -> Self {
        self.time_taken_secs = secs;
        self
    }

    pub fn as_fallback(mut self) -> Self {
        self.fallback = true;
        self.usage = Usage::default();
        self
    }
}

/// Errors that reach the orchestrator from a worker.
///
/// Adapters recover ordinary model failures as fallback outputs; an `Err`
/// halts the chain.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkerError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("worker response could not be parsed: {0}")]
    Parse(String),

    #[error("no worker registered for role {0}")]
    Unavailable(Role),
}

/// One role's task performer.
#[async_trait]
pub trait Worker: Send + Sync {
    async fn run(&self, request: WorkerRequest) -> Result<WorkerOutput, WorkerError>;
}

/// Role → worker lookup.
#[derive(Clone, Default)]
pub struct WorkerRegistry {
    workers: BTreeMap<Role, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `worker` for `role`, replacing any previous one.
    pub fn register(&mut self, role: Role, worker: Arc<dyn Worker>) {
        self.workers.insert(role, worker);
    }

    pub fn with(mut self, role: Role, worker: Arc<dyn Worker>) -> Self {
        self.register(role, worker);
        self
    }

    pub fn get(&self, role: Role) -> Result<Arc<dyn Worker>, WorkerError> {
        self.workers
            .get(&role)
            .cloned()
            .ok_or(WorkerError::Unavailable(role))
    }

    pub fn roles(&self) -> Vec<Role> {
        self.workers.keys().copied().collect()
    }
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("roles", &self.roles())
            .finish()
    }
}
