//! OpenAI-compatible chat completions client.
//!
//! Supports:
//! - Chat completions with system, user, and assistant messages
//! - Tool/function calling
//! - JSON-object response format

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::AgentsConfig;
use crate::error::{AgentError, Result};

/// Chat completions client with bearer auth.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl ChatClient {
    /// Create a client with an explicit API key.
    pub fn new(config: &AgentsConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            url: config.completions_url(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Create a client reading the key from `config.api_key_env`.
    pub fn from_env(config: &AgentsConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            AgentError::Configuration(format!(
                "Missing {} environment variable",
                config.api_key_env
            ))
        })?;
        Self::new(config, api_key)
    }

    /// Send a chat completion request.
    pub async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ChatTool>>,
        json_mode: bool,
    ) -> Result<ChatResponse> {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            tools,
            response_format: json_mode.then(ResponseFormat::json_object),
            max_completion_tokens: Some(self.max_tokens),
            temperature: self.temperature,
        };

        trace!("Sending chat request: {:?}", request);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ModelInvocation(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::ModelInvocation(format!(
                "API error {status}: {text}"
            )));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParse(format!("Failed to parse response: {e}")))?;

        debug!(
            model = %model,
            prompt_tokens = response.usage.as_ref().map_or(0, |u| u.prompt_tokens),
            completion_tokens = response.usage.as_ref().map_or(0, |u| u.completion_tokens),
            "chat response received"
        );

        Ok(response)
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("url", &self.url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,

    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatTool>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Requested response format.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

/// A message in the chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role("assistant", content)
    }

    fn with_role(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
        }
    }
}

/// Tool call in a response message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolCall {
    pub id: String,

    /// Always "function".
    #[serde(rename = "type")]
    pub call_type: String,

    pub function: ChatToolFunction,
}

/// Function details in a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolFunction {
    pub name: String,

    /// JSON-encoded arguments.
    pub arguments: String,
}

/// Tool definition for the API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTool {
    /// Always "function".
    #[serde(rename = "type")]
    pub tool_type: String,

    pub function: ChatToolDefinition,
}

impl ChatTool {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: ChatToolDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Function definition in a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ChatToolDefinition {
    pub name: String,

    pub description: String,

    /// JSON Schema for parameters.
    pub parameters: serde_json::Value,
}

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: String,

    pub choices: Vec<ChatChoice>,

    pub usage: Option<ChatUsage>,
}

impl ChatResponse {
    /// Get the first choice's message.
    pub fn message(&self) -> Option<&ResponseMessage> {
        self.choices.first().map(|c| &c.message)
    }

    /// Text content of the first choice, empty when absent.
    pub fn content(&self) -> &str {
        self.message()
            .and_then(|m| m.content.as_deref())
            .unwrap_or_default()
    }

    /// Tool calls of the first choice.
    pub fn tool_calls(&self) -> &[ChatToolCall] {
        self.message()
            .and_then(|m| m.tool_calls.as_deref())
            .unwrap_or_default()
    }

    /// `(prompt_tokens, completion_tokens)`, zero when the server omitted usage.
    pub fn token_usage(&self) -> (u64, u64) {
        self.usage.as_ref().map_or((0, 0), |u| {
            (u64::from(u.prompt_tokens), u64::from(u.completion_tokens))
        })
    }
}

/// A choice in the completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,

    pub message: ResponseMessage,

    /// Finish reason (stop, tool_calls, length, etc.).
    pub finish_reason: Option<String>,
}

/// Message in a completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: String,

    pub content: Option<String>,

    pub tool_calls: Option<Vec<ChatToolCall>>,
}

/// Token usage information.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    pub prompt_tokens: u32,

    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}
