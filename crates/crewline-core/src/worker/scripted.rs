//! Deterministic worker that replays canned outputs.
//!
//! Used by tests and by the CLI's `--script` mode. Every request is recorded
//! so callers can assert on what a worker was shown.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::role::Role;
use crate::worker::{Worker, WorkerError, WorkerOutput, WorkerRegistry, WorkerRequest};

/// Replays a queue of results, one per call.
#[derive(Debug, Default)]
pub struct ScriptedWorker {
    script: Mutex<VecDeque<Result<WorkerOutput, WorkerError>>>,
    requests: Mutex<Vec<WorkerRequest>>,
}

impl ScriptedWorker {
    pub fn new(outputs: impl IntoIterator<Item = WorkerOutput>) -> Self {
        Self::from_results(outputs.into_iter().map(Ok))
    }

    pub fn from_results(
        results: impl IntoIterator<Item = Result<WorkerOutput, WorkerError>>,
    ) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<WorkerRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Outputs not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Worker for ScriptedWorker {
    async fn run(&self, request: WorkerRequest) -> Result<WorkerOutput, WorkerError> {
        let role = request.role;
        self.requests
            .lock()
            .map_err(|_| WorkerError::Invocation("request log lock poisoned".to_string()))?
            .push(request);
        self.script
            .lock()
            .map_err(|_| WorkerError::Invocation("script lock poisoned".to_string()))?
            .pop_front()
            .unwrap_or_else(|| {
                Err(WorkerError::Invocation(format!(
                    "script for {role} is exhausted"
                )))
            })
    }
}

/// Build a registry from per-role scripts.
///
/// Returns the scripted workers alongside so callers can inspect them.
pub fn scripted_registry(
    scripts: BTreeMap<Role, Vec<WorkerOutput>>,
) -> (WorkerRegistry, BTreeMap<Role, Arc<ScriptedWorker>>) {
    let mut registry = WorkerRegistry::new();
    let mut workers = BTreeMap::new();
    for (role, outputs) in scripts {
        let worker = Arc::new(ScriptedWorker::new(outputs));
        registry.register(role, worker.clone());
        workers.insert(role, worker);
    }
    (registry, workers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::phase::Phase;

    fn request(role: Role) -> WorkerRequest {
        WorkerRequest {
            role,
            conversation: Vec::new(),
            model: "test-model".to_string(),
            trigger: Phase::Init,
            tdd_enabled: false,
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_then_errors() {
        let worker = ScriptedWorker::new([WorkerOutput::text("one"), WorkerOutput::text("two")]);
        assert_eq!(worker.run(request(Role::Manager)).await.unwrap().text, "one");
        assert_eq!(worker.run(request(Role::Manager)).await.unwrap().text, "two");
        let err = worker.run(request(Role::Manager)).await.unwrap_err();
        assert!(err.to_string().contains("exhausted"));
        assert_eq!(worker.calls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_registry_exposes_workers() {
        let scripts = BTreeMap::from([(Role::Analyst, vec![WorkerOutput::text("report")])]);
        let (registry, workers) = scripted_registry(scripts);
        let worker = registry.get(Role::Analyst).unwrap();
        worker.run(request(Role::Analyst)).await.unwrap();
        assert_eq!(workers[&Role::Analyst].calls(), 1);
        assert_eq!(workers[&Role::Analyst].remaining(), 0);
    }
}
