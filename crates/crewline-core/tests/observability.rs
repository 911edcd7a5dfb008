//! Lifecycle events emitted by the orchestrator.

use crewline_core::{
    emit_chain_halted, emit_context_updated, emit_step_failed, scripted_registry, Orchestrator,
    Phase, PipelineConfig, Role, Session, SessionSpan, WorkerOutput,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn session_span_enter_and_drop() {
    let span = SessionSpan::enter("span-session");
    emit_context_updated("span-session", Role::Analyst, 1, 1);
    drop(span);
    assert!(logs_contain("context.updated"));
}

#[traced_test]
#[test]
fn step_failed_logs_error() {
    emit_step_failed("s-1", Role::Tester, &"script exhausted");
    assert!(logs_contain("step.failed"));
    assert!(logs_contain("script exhausted"));
}

#[traced_test]
#[test]
fn chain_halted_logs_reason() {
    emit_chain_halted("s-2", "no_transition", 3);
    assert!(logs_contain("chain.halted"));
    assert!(logs_contain("no_transition"));
}

#[traced_test]
#[tokio::test]
async fn chain_emits_lifecycle_events() {
    let scripts = [
        (
            Role::Manager,
            vec![WorkerOutput::text("analyse")
                .with_phase(Phase::Analysis)
                .with_usage(50, 10)],
        ),
        (
            Role::Analyst,
            vec![WorkerOutput::text("")
                .with_file("Analysis Report", "scope")
                .with_usage(80, 40)],
        ),
    ];
    let (registry, _workers) = scripted_registry(scripts.into_iter().collect());
    let orchestrator = Orchestrator::new(registry, PipelineConfig::default());
    let mut session = Session::new();

    orchestrator.start(&mut session, "scope it").await.unwrap();

    assert!(logs_contain("chain.started"));
    assert!(logs_contain("step.started"));
    assert!(logs_contain("step.finished"));
    assert!(logs_contain("context.updated"));
    // architect is not registered
    assert!(logs_contain("step.failed"));
    assert!(logs_contain("worker_failed"));
}
