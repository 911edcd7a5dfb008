//! The role-transition loop.
//!
//! [`Orchestrator::run_chain`] repeatedly reads the routing cursor from the
//! latest message, invokes the next worker, and commits its output to the
//! session. A committed step appends exactly one message and replaces exactly
//! one role's artifact; a failed step commits nothing.

use std::collections::BTreeMap;
use std::sync::Arc;

use crewline_state::{SessionId, SessionStore};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::PipelineConfig;
use crate::context::assemble;
use crate::domain::message::{ArtifactRef, Message};
use crate::domain::phase::Phase;
use crate::domain::role::Role;
use crate::metrics::METRICS;
use crate::obs;
use crate::role_orchestration::error::{OrchestrationError, OrchestrationResult};
use crate::role_orchestration::roles::RoleTemplate;
use crate::role_orchestration::router::route;
use crate::role_orchestration::session::Session;
use crate::worker::{WorkerOutput, WorkerRegistry, WorkerRequest};

/// Why a chain stopped. Every variant is a normal terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HaltReason {
    /// The session has no messages.
    EmptyLog,
    /// The latest `(role, phase)` pair is not in the transition table.
    NoTransition { role: Role, phase: Option<Phase> },
    /// The manager reported zero input tokens.
    DegradedManagerCall,
    /// A worker returned an error; nothing was committed for that step.
    WorkerFailed { role: Role, error: String },
    /// The automatic step ceiling was reached.
    StepLimit { limit: usize },
}

impl HaltReason {
    pub fn label(&self) -> &'static str {
        match self {
            HaltReason::EmptyLog => "empty_log",
            HaltReason::NoTransition { .. } => "no_transition",
            HaltReason::DegradedManagerCall => "degraded_manager_call",
            HaltReason::WorkerFailed { .. } => "worker_failed",
            HaltReason::StepLimit { .. } => "step_limit",
        }
    }
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::EmptyLog => write!(f, "session has no messages"),
            HaltReason::NoTransition {
                role,
                phase: Some(phase),
            } => write!(f, "no transition from {role} on {phase}"),
            HaltReason::NoTransition { role, phase: None } => {
                write!(f, "{role} declared no next phase")
            }
            HaltReason::DegradedManagerCall => write!(f, "manager call reported no input tokens"),
            HaltReason::WorkerFailed { role, error } => write!(f, "{role} worker failed: {error}"),
            HaltReason::StepLimit { limit } => write!(f, "step limit of {limit} reached"),
        }
    }
}

/// A step whose output was committed to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommittedStep {
    pub role: Role,
    /// Resolved next phase recorded on the new message.
    pub phase: Phase,
    /// The worker reported zero input tokens.
    pub degraded: bool,
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Committed(CommittedStep),
    Halted(HaltReason),
}

/// Summary of one automatic chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub session_id: SessionId,
    /// Workers invoked, in order. Failed invocations are not included.
    pub invoked: Vec<Role>,
    pub halt: HaltReason,
}

impl ChainReport {
    pub fn steps(&self) -> usize {
        self.invoked.len()
    }
}

/// Drives sessions through the role pipeline.
///
/// Holds no per-session state, so one orchestrator can serve many sessions
/// concurrently.
#[derive(Clone)]
pub struct Orchestrator {
    workers: WorkerRegistry,
    config: PipelineConfig,
    store: Option<Arc<dyn SessionStore>>,
}

impl Orchestrator {
    pub fn new(workers: WorkerRegistry, config: PipelineConfig) -> Self {
        Self {
            workers,
            config,
            store: None,
        }
    }

    /// Persist the session after every committed step.
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Submit the initial request of a new session and run the chain.
    pub async fn start(&self, session: &mut Session, prompt: &str) -> OrchestrationResult<ChainReport> {
        if !session.log.is_empty() {
            return Err(OrchestrationError::AlreadyStarted {
                session_id: session.id.to_string(),
            });
        }
        self.submit(session, prompt, Phase::Init).await?;
        self.run_chain(session).await
    }

    /// Submit a revision request to an existing session and run the chain.
    pub async fn revise(&self, session: &mut Session, prompt: &str) -> OrchestrationResult<ChainReport> {
        if session.log.is_empty() {
            return Err(OrchestrationError::NotStarted {
                session_id: session.id.to_string(),
            });
        }
        self.submit(session, prompt, Phase::Revise).await?;
        self.run_chain(session).await
    }

    async fn submit(&self, session: &mut Session, prompt: &str, phase: Phase) -> OrchestrationResult<()> {
        session.context = session
            .context
            .update(Role::EndUser, prompt, &BTreeMap::new());
        session
            .log
            .append(Message::new(Role::EndUser, prompt).with_phase(phase));
        self.persist(session).await
    }

    /// Run workers until no transition applies or a halt condition is hit.
    #[instrument(name = "crewline.chain", skip_all, fields(session_id = %session.id))]
    pub async fn run_chain(&self, session: &mut Session) -> OrchestrationResult<ChainReport> {
        let session_id = session.id.to_string();
        if let Some((role, phase)) = session.log.last().and_then(Message::cursor) {
            obs::emit_chain_started(&session_id, role, phase);
        }

        let mut invoked = Vec::new();
        let halt = loop {
            let (role, trigger) = match next_worker(session, self.config.tdd_enabled) {
                Ok(next) => next,
                Err(reason) => break reason,
            };
            if invoked.len() >= self.config.max_steps {
                warn!(
                    session_id = %session_id,
                    limit = self.config.max_steps,
                    next_role = %role,
                    "step limit reached"
                );
                break HaltReason::StepLimit {
                    limit: self.config.max_steps,
                };
            }
            match self.execute(session, role, trigger).await? {
                StepOutcome::Halted(reason) => break reason,
                StepOutcome::Committed(step) => {
                    invoked.push(step.role);
                    if step.role == Role::Manager && step.degraded {
                        break HaltReason::DegradedManagerCall;
                    }
                }
            }
        };

        METRICS.inc_chains_halted();
        obs::emit_chain_halted(&session_id, halt.label(), invoked.len());
        Ok(ChainReport {
            session_id: session.id.clone(),
            invoked,
            halt,
        })
    }

    /// Run at most one worker.
    pub async fn step(&self, session: &mut Session) -> OrchestrationResult<StepOutcome> {
        match next_worker(session, self.config.tdd_enabled) {
            Ok((role, trigger)) => self.execute(session, role, trigger).await,
            Err(reason) => Ok(StepOutcome::Halted(reason)),
        }
    }

    async fn execute(
        &self,
        session: &mut Session,
        role: Role,
        trigger: Phase,
    ) -> OrchestrationResult<StepOutcome> {
        let session_id = session.id.to_string();
        let template = RoleTemplate::for_role(role);
        let model = self.config.model_for(template.purpose).to_string();
        let request = WorkerRequest {
            role,
            conversation: assemble(&session.context, Some(&template.include_filter())),
            model: model.clone(),
            trigger,
            tdd_enabled: self.config.tdd_enabled,
        };

        obs::emit_step_started(&session_id, role, trigger, &model);
        let result = match self.workers.get(role) {
            Ok(worker) => worker.run(request).await,
            Err(e) => Err(e),
        };
        let output = match result {
            Ok(output) => output,
            Err(e) => {
                METRICS.inc_worker_failures();
                obs::emit_step_failed(&session_id, role, &e);
                return Ok(StepOutcome::Halted(HaltReason::WorkerFailed {
                    role,
                    error: e.to_string(),
                }));
            }
        };

        let step = self.commit(session, &template, trigger, output, model);
        self.persist(session).await?;
        Ok(StepOutcome::Committed(step))
    }

    fn commit(
        &self,
        session: &mut Session,
        template: &RoleTemplate,
        trigger: Phase,
        output: WorkerOutput,
        model: String,
    ) -> CommittedStep {
        let role = template.role;
        let session_id = session.id.to_string();
        let phase = template
            .phase_policy
            .resolve(output.declared_phase, self.config.tdd_enabled);

        let mut events = Vec::new();
        let mut context = session.context.clone();
        if role == Role::Manager && trigger == Phase::Init {
            if let Some(name) = output.name.as_deref().filter(|n| !n.trim().is_empty()) {
                context = context.set_identity(name, output.summary.as_deref().unwrap_or(""));
                events.push(format!("Updated project name to \"{name}\""));
                if output.summary.is_some() {
                    events.push("Updated project summary".to_string());
                }
            }
        }

        let files = if template.accumulates_files {
            let mut files = session.log.latest_files(role).cloned().unwrap_or_default();
            files.extend(output.files);
            files
        } else {
            output.files
        };

        context = context.update(role, &output.text, &files);
        if let Some(artifact) = context.artifact(role) {
            let changed = artifact.files.values().filter(|f| f.has_changes()).count();
            obs::emit_context_updated(&session_id, role, artifact.files.len(), changed);
        }

        let content = if output.text.trim().is_empty() {
            template.handoff(phase).to_string()
        } else {
            output.text
        };
        let mut message = Message::new(role, content)
            .with_phase(phase)
            .with_usage(output.usage, output.time_taken_secs)
            .with_model(model)
            .with_events(events);
        if let Some((kind, title)) = template.artifact {
            if !files.is_empty() {
                message = message.with_artifact(ArtifactRef {
                    kind,
                    title: title.to_string(),
                    files,
                });
            }
        }

        session.context = context;
        session.log.append(message);

        METRICS.inc_steps();
        METRICS.add_tokens(output.usage.total());
        obs::emit_step_finished(
            &session_id,
            role,
            phase,
            output.usage.input_tokens,
            output.usage.output_tokens,
            output.fallback,
        );

        CommittedStep {
            role,
            phase,
            degraded: output.usage.input_tokens == 0,
            fallback: output.fallback,
        }
    }

    async fn persist(&self, session: &Session) -> OrchestrationResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        store.save(session.to_record()?).await?;
        debug!(session_id = %session.id, steps = session.steps(), "session persisted");
        Ok(())
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("workers", &self.workers)
            .field("config", &self.config)
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

/// Resolve the worker that runs next from the latest message.
pub fn next_worker(session: &Session, tdd_enabled: bool) -> Result<(Role, Phase), HaltReason> {
    let last = session.log.last().ok_or(HaltReason::EmptyLog)?;
    let Some(phase) = last.phase else {
        return Err(HaltReason::NoTransition {
            role: last.role,
            phase: None,
        });
    };
    route(last.role, phase, tdd_enabled)
        .map(|next| (next, phase))
        .ok_or(HaltReason::NoTransition {
            role: last.role,
            phase: Some(phase),
        })
}
