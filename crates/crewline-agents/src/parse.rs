//! Parsing of model replies into worker output fields.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crewline_core::Phase;
use regex::Regex;
use serde::Deserialize;

use crate::client::ChatToolCall;
use crate::error::{AgentError, Result};

/// Name of the file-writing tool offered to code-writing workers.
pub const FILES_TOOL: &str = "create_or_update_files";

/// The manager's structured reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManagerReply {
    #[serde(alias = "state")]
    pub phase: String,
    pub text: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl ManagerReply {
    /// The declared phase; only ANALYSIS, DESIGN, and CODE are accepted.
    pub fn phase(&self) -> Result<Phase> {
        let phase: Phase = self
            .phase
            .parse()
            .map_err(|e| AgentError::ResponseParse(format!("manager phase: {e}")))?;
        match phase {
            Phase::Analysis | Phase::Design | Phase::Code => Ok(phase),
            other => Err(AgentError::ResponseParse(format!(
                "manager may not declare {other}"
            ))),
        }
    }
}

/// Parse the manager's JSON reply, tolerating a Markdown code fence.
pub fn parse_manager_reply(content: &str) -> Result<ManagerReply> {
    let reply: ManagerReply = serde_json::from_str(strip_code_fence(content))?;
    reply.phase()?;
    Ok(reply)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (e.g. `json`) on the opening fence line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().trim_end_matches("```").trim()
}

#[derive(Deserialize)]
struct FilesArgs {
    files: Vec<FileArg>,
}

#[derive(Deserialize)]
struct FileArg {
    path: String,
    content: String,
}

/// Collect every `create_or_update_files` call into one file map.
///
/// Later calls overwrite earlier ones for the same path. Calls to other tools
/// are ignored.
pub fn collect_files(tool_calls: &[ChatToolCall]) -> Result<BTreeMap<String, String>> {
    let mut files = BTreeMap::new();
    for call in tool_calls.iter().filter(|c| c.function.name == FILES_TOOL) {
        let args: FilesArgs = serde_json::from_str(&call.function.arguments).map_err(|e| {
            AgentError::ResponseParse(format!("invalid {FILES_TOOL} arguments: {e}"))
        })?;
        for file in args.files {
            files.insert(file.path, file.content);
        }
    }
    Ok(files)
}

/// JSON schema for the `create_or_update_files` tool.
pub fn files_tool_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "files": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Path of the file, e.g. src/lib.rs"},
                        "content": {"type": "string", "description": "Full file content"}
                    },
                    "required": ["path", "content"]
                }
            }
        },
        "required": ["files"]
    })
}

fn verdict_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^\s*VERDICT:\s*(PASS|FAIL)\s*$").ok())
        .as_ref()
}

/// Phase declared by a tester verdict line, if any.
///
/// `VERDICT: PASS` ends the loop with DONE; `VERDICT: FAIL` sends the work
/// back to the implementer. The last verdict line wins.
pub fn parse_verdict(text: &str) -> Option<Phase> {
    let verdict = verdict_regex()?.captures_iter(text).last()?;
    match verdict[1].to_ascii_uppercase().as_str() {
        "PASS" => Some(Phase::Done),
        _ => Some(Phase::Code),
    }
}
