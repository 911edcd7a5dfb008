//! Renders a [`ProjectContext`] into an ordered conversation for a worker.

use std::collections::BTreeSet;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::context::merge::Artifact;
use crate::context::store::ProjectContext;
use crate::domain::role::{Role, TransportRole};

const NO_SUMMARY: &str = "No summary provided.";

/// One chat turn handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TransportRole,
    pub content: String,
}

/// Assemble the conversation for a worker.
///
/// The identity block leads whenever the project has a name. Role blocks
/// follow in artifact insertion order; a non-empty `role_filter` restricts
/// them to the listed roles. Output is byte-identical for identical input.
pub fn assemble(
    context: &ProjectContext,
    role_filter: Option<&BTreeSet<Role>>,
) -> Vec<ConversationTurn> {
    let filter = role_filter.filter(|roles| !roles.is_empty());
    let mut turns = Vec::new();

    if !context.name().is_empty() {
        turns.push(ConversationTurn {
            role: TransportRole::Assistant,
            content: render_identity(context),
        });
    }

    for (role, artifact) in context.artifacts() {
        if filter.is_some_and(|roles| !roles.contains(&role)) {
            continue;
        }
        turns.push(ConversationTurn {
            role: role.transport(),
            content: render_role_block(role, artifact),
        });
    }

    turns
}

fn render_identity(context: &ProjectContext) -> String {
    let summary = if context.summary().is_empty() {
        NO_SUMMARY
    } else {
        context.summary()
    };
    format!("Project: {}\nSummary: {}", context.name(), summary)
}

/// Render one role's artifact: its text, then every file as tagged lines.
pub fn render_role_block(role: Role, artifact: &Artifact) -> String {
    let mut out = format!("Context from agent {role}:\n{}\n\n", artifact.text);
    for (path, file) in &artifact.files {
        // writing into a String cannot fail
        let _ = writeln!(out, "From File {path}:");
        for (tag, line) in file.entries() {
            let _ = writeln!(out, "[{tag}] {line}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample() -> ProjectContext {
        ProjectContext::new()
            .update(Role::EndUser, "build a todo app", &BTreeMap::new())
            .update(Role::Manager, "routing to analysis", &BTreeMap::new())
            .update(
                Role::Implementer,
                "",
                &BTreeMap::from([("index.ts".to_string(), "a\nb".to_string())]),
            )
    }

    #[test]
    fn test_no_identity_block_without_name() {
        let turns = assemble(&sample(), None);
        assert_eq!(turns.len(), 3);
        assert!(turns[0].content.starts_with("Context from agent end_user:"));
    }

    #[test]
    fn test_identity_block_uses_summary_placeholder() {
        let ctx = sample().set_identity("todo", "");
        let turns = assemble(&ctx, Some(&BTreeSet::from([Role::Tester])));
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TransportRole::Assistant);
        assert_eq!(turns[0].content, "Project: todo\nSummary: No summary provided.");
    }

    #[test]
    fn test_role_block_format() {
        let turns = assemble(&sample(), Some(&BTreeSet::from([Role::Implementer])));
        assert_eq!(
            turns[0].content,
            "Context from agent implementer:\n\n\nFrom File index.ts:\n[ADDED] a\n[ADDED] b\n"
        );
    }

    #[test]
    fn test_transport_roles() {
        let turns = assemble(&sample(), None);
        assert_eq!(turns[0].role, TransportRole::User);
        assert_eq!(turns[1].role, TransportRole::Assistant);
        assert_eq!(turns[2].role, TransportRole::Assistant);
    }

    #[test]
    fn test_empty_filter_means_everything() {
        let ctx = sample();
        assert_eq!(assemble(&ctx, Some(&BTreeSet::new())), assemble(&ctx, None));
    }
}
