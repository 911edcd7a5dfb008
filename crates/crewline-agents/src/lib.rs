//! Language-model workers for Crewline.
//!
//! Each pipeline role is performed by an [`LlmWorker`] talking to an
//! OpenAI-compatible chat completions endpoint through [`ChatClient`]:
//!
//! - the manager replies with JSON naming the next phase
//! - document roles (analyst, architect, reviewer, deployer) reply in
//!   Markdown, recorded as a single titled file
//! - code roles (implementer, tester) write files through the
//!   `create_or_update_files` tool; the tester may end with a verdict line

pub mod client;
pub mod config;
pub mod error;
pub mod parse;
pub mod prompts;
pub mod worker;

pub use client::ChatClient;
pub use config::AgentsConfig;
pub use error::{AgentError, Result};
pub use worker::{llm_registry, LlmWorker, MANAGER_FALLBACK_TEXT};
