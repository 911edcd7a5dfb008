//! Model-backed workers, one per pipeline role.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use crewline_core::{
    Phase, Role, RoleTemplate, TransportRole, Worker, WorkerError, WorkerOutput, WorkerRegistry,
    WorkerRequest,
};
use tracing::{debug, warn};

use crate::client::{ChatClient, ChatMessage, ChatResponse, ChatTool};
use crate::error::Result;
use crate::parse::{collect_files, files_tool_schema, parse_manager_reply, parse_verdict, FILES_TOOL};
use crate::prompts::system_prompt;

/// Text recorded when the manager call fails.
pub const MANAGER_FALLBACK_TEXT: &str =
    "An error occurred while analyzing the project. Please provide more details about what you want to build.";

/// A worker that performs one role by calling a chat model.
///
/// Model and transport failures never surface as errors: the worker returns
/// a fallback output with zero usage instead.
#[derive(Debug, Clone)]
pub struct LlmWorker {
    role: Role,
    client: Arc<ChatClient>,
}

impl LlmWorker {
    pub fn new(role: Role, client: Arc<ChatClient>) -> Self {
        Self { role, client }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    fn messages(&self, request: &WorkerRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.conversation.len() + 1);
        if let Some(prompt) = system_prompt(self.role) {
            messages.push(ChatMessage::system(prompt));
        }
        for turn in &request.conversation {
            messages.push(match turn.role {
                TransportRole::User => ChatMessage::user(&turn.content),
                TransportRole::Assistant => ChatMessage::assistant(&turn.content),
            });
        }
        // some endpoints reject a conversation that ends on an assistant turn
        if request
            .conversation
            .last()
            .map_or(true, |t| t.role == TransportRole::Assistant)
        {
            messages.push(ChatMessage::user(format!(
                "Continue as the {} with the task above.",
                self.role
            )));
        }
        messages
    }

    async fn invoke(&self, request: &WorkerRequest) -> Result<WorkerOutput> {
        let messages = self.messages(request);
        match self.role {
            Role::Manager => {
                let response = self.client.chat(&request.model, messages, None, true).await?;
                let reply = parse_manager_reply(response.content())?;
                let mut output = with_usage(WorkerOutput::text(&reply.text), &response)
                    .with_phase(reply.phase()?);
                if request.trigger == Phase::Init {
                    output.name = reply.name;
                    output.summary = reply.summary;
                }
                Ok(output)
            }
            Role::Implementer | Role::Tester => {
                let tools = vec![ChatTool::function(
                    FILES_TOOL,
                    "Create or update files. Give each file's full content.",
                    files_tool_schema(),
                )];
                let response = self
                    .client
                    .chat(&request.model, messages, Some(tools), false)
                    .await?;
                let mut output = with_usage(WorkerOutput::text(response.content()), &response);
                output.files = collect_files(response.tool_calls())?;
                if self.role == Role::Tester {
                    output.declared_phase = parse_verdict(response.content());
                }
                Ok(output)
            }
            _ => {
                let response = self.client.chat(&request.model, messages, None, false).await?;
                let title = RoleTemplate::for_role(self.role)
                    .artifact
                    .map_or(self.role.as_str(), |(_, title)| title);
                let document = response.content().trim().to_string();
                let mut output = with_usage(WorkerOutput::default(), &response);
                if !document.is_empty() {
                    output.files.insert(title.to_string(), document);
                }
                Ok(output)
            }
        }
    }

    fn fallback(&self) -> WorkerOutput {
        match self.role {
            Role::Manager => WorkerOutput::text(MANAGER_FALLBACK_TEXT)
                .with_phase(Phase::Analysis)
                .as_fallback(),
            _ => WorkerOutput::default().as_fallback(),
        }
    }
}

fn with_usage(output: WorkerOutput, response: &ChatResponse) -> WorkerOutput {
    let (input, output_tokens) = response.token_usage();
    output.with_usage(input, output_tokens)
}

#[async_trait]
impl Worker for LlmWorker {
    async fn run(&self, request: WorkerRequest) -> std::result::Result<WorkerOutput, WorkerError> {
        let started = Instant::now();
        let output = match self.invoke(&request).await {
            Ok(output) => {
                debug!(role = %self.role, model = %request.model, "worker call succeeded");
                output
            }
            Err(e) => {
                warn!(role = %self.role, model = %request.model, error = %e, "worker call failed, using fallback");
                self.fallback()
            }
        };
        Ok(output.with_time(started.elapsed().as_secs_f64()))
    }
}

/// Register an [`LlmWorker`] for every worker role.
pub fn llm_registry(client: Arc<ChatClient>) -> WorkerRegistry {
    RoleTemplate::standard_pipeline()
        .into_iter()
        .fold(WorkerRegistry::new(), |registry, template| {
            registry.with(
                template.role,
                Arc::new(LlmWorker::new(template.role, client.clone())),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentsConfig;
    use crewline_core::ConversationTurn;

    fn client() -> Arc<ChatClient> {
        let config = AgentsConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            timeout_secs: 2,
            ..AgentsConfig::default()
        };
        Arc::new(ChatClient::new(&config, "test-key").unwrap())
    }

    fn request(role: Role, conversation: Vec<ConversationTurn>) -> WorkerRequest {
        WorkerRequest {
            role,
            conversation,
            model: "gpt-5-mini".to_string(),
            trigger: Phase::Init,
            tdd_enabled: false,
        }
    }

    #[test]
    fn test_messages_start_with_system_prompt() {
        let worker = LlmWorker::new(Role::Analyst, client());
        let messages = worker.messages(&request(
            Role::Analyst,
            vec![ConversationTurn {
                role: TransportRole::User,
                content: "Context from agent end_user:\nbuild it\n\n".to_string(),
            }],
        ));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn test_messages_end_on_user_turn() {
        let worker = LlmWorker::new(Role::Deployer, client());
        let messages = worker.messages(&request(
            Role::Deployer,
            vec![ConversationTurn {
                role: TransportRole::Assistant,
                content: "Project: x\nSummary: y".to_string(),
            }],
        ));
        assert_eq!(messages.last().unwrap().role, "user");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_manager_fallback() {
        let worker = LlmWorker::new(Role::Manager, client());
        let output = worker.run(request(Role::Manager, vec![])).await.unwrap();
        assert!(output.fallback);
        assert_eq!(output.declared_phase, Some(Phase::Analysis));
        assert_eq!(output.text, MANAGER_FALLBACK_TEXT);
        assert_eq!(output.usage.input_tokens, 0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_empty_fallback() {
        let worker = LlmWorker::new(Role::Implementer, client());
        let output = worker.run(request(Role::Implementer, vec![])).await.unwrap();
        assert!(output.fallback);
        assert!(output.files.is_empty());
        assert!(output.declared_phase.is_none());
    }

    #[test]
    fn test_registry_covers_worker_roles() {
        let registry = llm_registry(client());
        assert_eq!(registry.roles().len(), 7);
        assert!(registry.get(Role::EndUser).is_err());
    }
}
