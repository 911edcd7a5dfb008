//! Per-session project context.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::context::merge::{merge_artifact, Artifact};
use crate::domain::error::CrewlineError;
use crate::domain::role::Role;

/// One role's slot in the context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleArtifact {
    pub role: Role,
    #[serde(flatten)]
    pub artifact: Artifact,
}

/// Durable state of one generation session: identity plus one merged
/// artifact per role that has produced output.
///
/// Artifacts iterate in the order their role first produced output.
/// Updates return a new context and leave `self` untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ContextRepr")]
pub struct ProjectContext {
    name: String,
    summary: String,
    artifacts: Vec<RoleArtifact>,
}

#[derive(Deserialize)]
struct ContextRepr {
    #[serde(default)]
    name: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    artifacts: Vec<RoleArtifact>,
}

impl TryFrom<ContextRepr> for ProjectContext {
    type Error = CrewlineError;

    fn try_from(repr: ContextRepr) -> Result<Self, Self::Error> {
        let mut seen = BTreeSet::new();
        for slot in &repr.artifacts {
            if !seen.insert(slot.role) {
                return Err(CrewlineError::DuplicateArtifact(slot.role));
            }
        }
        Ok(Self {
            name: repr.name,
            summary: repr.summary,
            artifacts: repr.artifacts,
        })
    }
}

impl ProjectContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn artifact(&self, role: Role) -> Option<&Artifact> {
        self.artifacts
            .iter()
            .find(|slot| slot.role == role)
            .map(|slot| &slot.artifact)
    }

    /// `(role, artifact)` pairs in insertion order.
    pub fn artifacts(&self) -> impl Iterator<Item = (Role, &Artifact)> {
        self.artifacts.iter().map(|slot| (slot.role, &slot.artifact))
    }

    pub fn roles(&self) -> Vec<Role> {
        self.artifacts.iter().map(|slot| slot.role).collect()
    }

    /// Merge `role`'s new output into its artifact.
    ///
    /// A role's first output appends a new slot; later outputs replace the
    /// slot in place.
    pub fn update(&self, role: Role, new_text: &str, new_files: &BTreeMap<String, String>) -> Self {
        let mut next = self.clone();
        match next.artifacts.iter_mut().find(|slot| slot.role == role) {
            Some(slot) => {
                slot.artifact = merge_artifact(Some(&slot.artifact), new_text, new_files);
            }
            None => next.artifacts.push(RoleArtifact {
                role,
                artifact: merge_artifact(None, new_text, new_files),
            }),
        }
        next
    }

    /// Replace the project identity. Last write wins.
    pub fn set_identity(&self, name: &str, summary: &str) -> Self {
        Self {
            name: name.to_string(),
            summary: summary.to_string(),
            artifacts: self.artifacts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::LineTag;

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect()
    }

    #[test]
    fn test_update_is_pure() {
        let empty = ProjectContext::new();
        let next = empty.update(Role::EndUser, "build a CLI", &BTreeMap::new());
        assert!(empty.artifact(Role::EndUser).is_none());
        assert_eq!(next.artifact(Role::EndUser).unwrap().text, "build a CLI");
    }

    #[test]
    fn test_insertion_order_is_first_output_order() {
        let ctx = ProjectContext::new()
            .update(Role::EndUser, "req", &BTreeMap::new())
            .update(Role::Manager, "plan", &BTreeMap::new())
            .update(Role::Analyst, "", &files(&[("Analysis Report", "r")]))
            .update(Role::Manager, "plan v2", &BTreeMap::new());

        assert_eq!(ctx.roles(), vec![Role::EndUser, Role::Manager, Role::Analyst]);
        assert_eq!(ctx.artifact(Role::Manager).unwrap().text, "plan v2");
    }

    #[test]
    fn test_index_ts_scenario() {
        let ctx = ProjectContext::new()
            .update(Role::Implementer, "", &files(&[("index.ts", "a\nb")]))
            .update(Role::Implementer, "", &files(&[("index.ts", "a\nb\nc")]));

        let merged = &ctx.artifact(Role::Implementer).unwrap().files["index.ts"];
        assert_eq!(merged.lines(), &["a", "b", "c"]);
        assert_eq!(
            merged.status(),
            &[LineTag::Unchanged, LineTag::Unchanged, LineTag::Added]
        );
    }

    #[test]
    fn test_set_identity_last_write_wins() {
        let ctx = ProjectContext::new()
            .set_identity("todo-cli", "first")
            .set_identity("todo-cli", "second");
        assert_eq!(ctx.name(), "todo-cli");
        assert_eq!(ctx.summary(), "second");
    }

    #[test]
    fn test_deserialize_rejects_duplicate_roles() {
        let json = r#"{
            "name": "x",
            "summary": "",
            "artifacts": [
                {"role": "manager", "text": "a", "files": {}},
                {"role": "manager", "text": "b", "files": {}}
            ]
        }"#;
        let err = serde_json::from_str::<ProjectContext>(json).unwrap_err();
        assert!(err.to_string().contains("manager"));
    }

    #[test]
    fn test_serde_round_trip_keeps_order() {
        let ctx = ProjectContext::new()
            .set_identity("demo", "a demo")
            .update(Role::Architect, "", &files(&[("System Architecture", "layers")]))
            .update(Role::EndUser, "go", &BTreeMap::new());
        let json = serde_json::to_value(&ctx).unwrap();
        let back: ProjectContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, ctx);
    }
}
