//! Endpoint configuration for the model workers.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Settings shared by every [`LlmWorker`](crate::LlmWorker).
///
/// Loaded from the `[agents]` table of the CLI config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// OpenAI-compatible API root; `/chat/completions` is appended.
    pub base_url: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    /// Omitted from requests when unset; reasoning models reject it.
    pub temperature: Option<f32>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 120,
            max_tokens: 8192,
            temperature: None,
        }
    }
}

impl AgentsConfig {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_trims_slash() {
        let config = AgentsConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..AgentsConfig::default()
        };
        assert_eq!(config.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_defaults_read_openai_key() {
        let config = AgentsConfig::default();
        assert_eq!(config.api_key_env, "OPENAI_API_KEY");
        assert!(config.temperature.is_none());
    }
}
