//! Crewline core library.
//!
//! Drives a multi-role generation pipeline (manager, analyst, architect,
//! implementer, tester, reviewer, deployer) and keeps each role's output in a
//! line-tagged, compacted context so prompts carry what changed rather than
//! everything ever produced.

pub mod config;
pub mod context;
pub mod diff;
pub mod domain;
pub mod metrics;
pub mod model;
pub mod obs;
pub mod role_orchestration;
pub mod telemetry;
pub mod worker;

pub use config::{PipelineConfig, DEFAULT_MAX_STEPS};
pub use context::{
    assemble, merge, merge_artifact, Artifact, ConversationTurn, LineStats, MergedFile,
    ProjectContext,
};
pub use diff::{diff_lines, split_lines, DiffLine, LineTag};
pub use domain::{
    ArtifactKind, ArtifactRef, CrewlineError, Message, MessageLog, Phase, Result, Role,
    TransportRole, Usage, UsageTotals,
};
pub use metrics::METRICS;
pub use model::{ModelCatalog, ModelPurpose, ModelTier};
pub use obs::{
    emit_chain_halted, emit_chain_started, emit_context_updated, emit_step_failed,
    emit_step_finished, emit_step_started, session_span, SessionSpan,
};
pub use role_orchestration::error::{OrchestrationError, OrchestrationResult};
pub use role_orchestration::executor::{
    next_worker, ChainReport, CommittedStep, HaltReason, Orchestrator, StepOutcome,
};
pub use role_orchestration::roles::{PhasePolicy, RoleTemplate};
pub use role_orchestration::router::{next_role, route, Transition, TRANSITIONS};
pub use role_orchestration::session::Session;
pub use telemetry::init_tracing;
pub use worker::scripted::scripted_registry;
pub use worker::{ScriptedWorker, Worker, WorkerError, WorkerOutput, WorkerRegistry, WorkerRequest};
