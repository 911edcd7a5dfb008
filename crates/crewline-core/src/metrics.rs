//! Global atomic counters for Crewline observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a chain).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters with no allocation or locking.
pub struct Metrics {
    steps_executed: AtomicU64,
    worker_failures: AtomicU64,
    chains_halted: AtomicU64,
    tokens_consumed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            steps_executed: AtomicU64::new(0),
            worker_failures: AtomicU64::new(0),
            chains_halted: AtomicU64::new(0),
            tokens_consumed: AtomicU64::new(0),
        }
    }

    /// Increment the steps-executed counter by one.
    pub fn inc_steps(&self) {
        self.steps_executed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "steps_executed", "counter incremented");
    }

    pub fn inc_worker_failures(&self) {
        self.worker_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "worker_failures", "counter incremented");
    }

    pub fn inc_chains_halted(&self) {
        self.chains_halted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "chains_halted", "counter incremented");
    }

    /// Add input + output tokens of one worker call.
    pub fn add_tokens(&self, tokens: u64) {
        self.tokens_consumed.fetch_add(tokens, Ordering::Relaxed);
        tracing::trace!(metric = "tokens_consumed", tokens, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a chain, CLI exit)
    /// rather than on every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            steps_executed = self.steps_executed(),
            worker_failures = self.worker_failures(),
            chains_halted = self.chains_halted(),
            tokens_consumed = self.tokens_consumed(),
        );
    }

    pub fn steps_executed(&self) -> u64 {
        self.steps_executed.load(Ordering::Relaxed)
    }

    pub fn worker_failures(&self) -> u64 {
        self.worker_failures.load(Ordering::Relaxed)
    }

    pub fn chains_halted(&self) -> u64 {
        self.chains_halted.load(Ordering::Relaxed)
    }

    pub fn tokens_consumed(&self) -> u64 {
        self.tokens_consumed.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.steps_executed.store(0, Ordering::Relaxed);
        self.worker_failures.store(0, Ordering::Relaxed);
        self.chains_halted.store(0, Ordering::Relaxed);
        self.tokens_consumed.store(0, Ordering::Relaxed);
    }
}
