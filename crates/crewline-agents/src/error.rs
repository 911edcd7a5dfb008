//! Error types for the agents crate.

use thiserror::Error;

/// Errors raised while talking to a model endpoint.
///
/// [`LlmWorker`](crate::LlmWorker) turns every one of these into a fallback
/// output; they only escape through [`ChatClient`](crate::ChatClient).
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("failed to parse response: {0}")]
    ResponseParse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
