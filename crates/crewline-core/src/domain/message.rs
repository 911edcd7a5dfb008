//! Message log entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::phase::Phase;
use crate::domain::role::Role;

/// Token usage reported by a worker call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Kind of output a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Document,
    Code,
}

/// Artifact reference attached to a message: the raw file map a worker
/// produced on that step (not the merged view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub title: String,
    pub files: BTreeMap<String, String>,
}

/// Immutable log entry created after each worker call or user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,

    /// Position in the log, assigned by [`MessageLog::append`].
    pub seq: u64,

    pub role: Role,

    pub content: String,

    /// Declared next phase; `None` means no transition applies.
    pub phase: Option<Phase>,

    pub artifact: Option<ArtifactRef>,

    pub usage: Usage,

    pub time_taken_secs: f64,

    /// Model identifier the worker was invoked with.
    pub model: Option<String>,

    /// Human-readable notes about side effects of the step.
    #[serde(default)]
    pub events: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with no phase, artifact, usage, or events.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            seq: 0,
            role,
            content: content.into(),
            phase: None,
            artifact: None,
            usage: Usage::default(),
            time_taken_secs: 0.0,
            model: None,
            events: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_artifact(mut self, artifact: ArtifactRef) -> Self {
        self.artifact = Some(artifact);
        self
    }

    pub fn with_usage(mut self, usage: Usage, time_taken_secs: f64) -> Self {
        self.usage = usage;
        self.time_taken_secs = time_taken_secs;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_events(mut self, events: Vec<String>) -> Self {
        self.events = events;
        self
    }

    /// The `(producing role, declared phase)` routing cursor.
    pub fn cursor(&self) -> Option<(Role, Phase)> {
        self.phase.map(|phase| (self.role, phase))
    }
}

/// Aggregated usage across a message log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub time_taken_secs: f64,
    pub worker_messages: usize,
}

/// Append-only, creation-ordered message log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from persisted messages, ordered by sequence number.
    pub fn from_messages(mut messages: Vec<Message>) -> Self {
        messages.sort_by_key(|m| m.seq);
        Self { messages }
    }

    /// Append a message, assigning the next sequence number.
    pub fn append(&mut self, mut message: Message) -> &Message {
        message.seq = self.next_seq();
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    fn next_seq(&self) -> u64 {
        self.messages.last().map(|m| m.seq + 1).unwrap_or(0)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    /// File map of the most recent message from `role` that carried an artifact.
    pub fn latest_files(&self, role: Role) -> Option<&BTreeMap<String, String>> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == role)
            .find_map(|m| m.artifact.as_ref())
            .map(|a| &a.files)
    }

    /// Token and time totals over every message.
    pub fn usage_totals(&self) -> UsageTotals {
        self.messages
            .iter()
            .fold(UsageTotals::default(), |mut totals, m| {
                totals.input_tokens += m.usage.input_tokens;
                totals.output_tokens += m.usage.output_tokens;
                totals.time_taken_secs += m.time_taken_secs;
                if m.role != Role::EndUser {
                    totals.worker_messages += 1;
                }
                totals
            })
    }
}
