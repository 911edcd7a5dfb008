//! Static per-role behaviour: what each worker sees, how its next phase is
//! resolved, and how its output is recorded.

use std::collections::BTreeSet;

use crate::domain::message::ArtifactKind;
use crate::domain::phase::Phase;
use crate::domain::role::Role;
use crate::model::ModelPurpose;

/// How a worker's next phase is derived from its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhasePolicy {
    /// Use the phase the worker declared, else `fallback`.
    Declared { fallback: Phase },
    /// Always this phase.
    Fixed(Phase),
    /// Depends on whether test-driven mode is on.
    TestDriven { tdd: Phase, direct: Phase },
}

impl PhasePolicy {
    pub fn resolve(&self, declared: Option<Phase>, tdd_enabled: bool) -> Phase {
        match *self {
            PhasePolicy::Declared { fallback } => declared.unwrap_or(fallback),
            PhasePolicy::Fixed(phase) => phase,
            PhasePolicy::TestDriven { tdd, direct } => {
                if tdd_enabled {
                    tdd
                } else {
                    direct
                }
            }
        }
    }
}

/// Static definition of one role. Templates do not execute.
#[derive(Debug, Clone)]
pub struct RoleTemplate {
    pub role: Role,
    /// Upstream roles whose artifacts this worker is shown.
    pub sees: &'static [Role],
    pub purpose: ModelPurpose,
    pub phase_policy: PhasePolicy,
    /// Message content used when the worker returns no free text.
    pub handoff_note: &'static str,
    /// Kind and title of the artifact recorded when the worker emits files.
    pub artifact: Option<(ArtifactKind, &'static str)>,
    /// New files are overlaid on the previous file map instead of replacing it.
    pub accumulates_files: bool,
    /// Human-readable description (used in logs and CLI output).
    pub description: &'static str,
}

impl RoleTemplate {
    pub fn for_role(role: Role) -> RoleTemplate {
        use Role::*;
        match role {
            EndUser => RoleTemplate {
                role,
                sees: &[],
                purpose: ModelPurpose::Think,
                phase_policy: PhasePolicy::Declared {
                    fallback: Phase::Revise,
                },
                handoff_note: "",
                artifact: None,
                accumulates_files: false,
                description: "Submits the request and revisions",
            },
            Manager => RoleTemplate {
                role,
                sees: &Role::ALL,
                purpose: ModelPurpose::Think,
                phase_policy: PhasePolicy::Declared {
                    fallback: Phase::Analysis,
                },
                handoff_note: "@ba here's the request. Analyse the requirements.",
                artifact: None,
                accumulates_files: false,
                description: "Triages requests and routes them to the right stage",
            },
            Analyst => RoleTemplate {
                role,
                sees: &[EndUser, Manager, Analyst],
                purpose: ModelPurpose::Think,
                phase_policy: PhasePolicy::Fixed(Phase::Design),
                handoff_note: "@sys_arch here's the requirement. Design the system architecture and define the key modules.",
                artifact: Some((ArtifactKind::Document, "Analysis Report")),
                accumulates_files: false,
                description: "Turns the request into an analysis report",
            },
            Architect => RoleTemplate {
                role,
                sees: &[EndUser, Manager, Analyst, Architect],
                purpose: ModelPurpose::Think,
                phase_policy: PhasePolicy::TestDriven {
                    tdd: Phase::Test,
                    direct: Phase::Code,
                },
                handoff_note: "@dev here's the system design. Implement it as a complete package.",
                artifact: Some((ArtifactKind::Document, "System Architecture")),
                accumulates_files: false,
                description: "Designs the system architecture and key modules",
            },
            Tester => RoleTemplate {
                role,
                sees: &[EndUser, Manager, Architect, Implementer, Tester],
                purpose: ModelPurpose::Dev,
                phase_policy: PhasePolicy::Declared {
                    fallback: Phase::Code,
                },
                handoff_note: "@dev tests are ready. Implement the code so that they pass.",
                artifact: Some((ArtifactKind::Code, "Tests")),
                accumulates_files: false,
                description: "Writes and updates the test suite",
            },
            Implementer => RoleTemplate {
                role,
                sees: &[EndUser, Manager, Architect, Tester, Implementer],
                purpose: ModelPurpose::Dev,
                phase_policy: PhasePolicy::TestDriven {
                    tdd: Phase::Retest,
                    direct: Phase::Review,
                },
                handoff_note: "@security_engineer code is ready. Review for security issues and vulnerabilities.",
                artifact: Some((ArtifactKind::Code, "Code")),
                accumulates_files: true,
                description: "Implements the design as source files",
            },
            Reviewer => RoleTemplate {
                role,
                sees: &[EndUser, Manager, Architect, Tester, Implementer, Reviewer],
                purpose: ModelPurpose::Think,
                phase_policy: PhasePolicy::Declared {
                    fallback: Phase::Deploy,
                },
                handoff_note: "@devops review complete. Prepare the deployment.",
                artifact: Some((ArtifactKind::Document, "Review")),
                accumulates_files: false,
                description: "Reviews the code for security issues and vulnerabilities",
            },
            Deployer => RoleTemplate {
                role,
                sees: &[Manager, Architect, Implementer, Reviewer, Deployer],
                purpose: ModelPurpose::Think,
                phase_policy: PhasePolicy::Fixed(Phase::Done),
                handoff_note: "Deployment plan is ready.",
                artifact: Some((ArtifactKind::Document, "Deployment Plan")),
                accumulates_files: false,
                description: "Prepares the deployment plan",
            },
        }
    }

    /// Templates for every worker role (everything but the end user).
    pub fn standard_pipeline() -> Vec<RoleTemplate> {
        Role::ALL
            .into_iter()
            .filter(|role| *role != Role::EndUser)
            .map(RoleTemplate::for_role)
            .collect()
    }

    /// Message content for an empty worker reply that resolved to `phase`.
    ///
    /// The manager addresses whichever worker the phase routes to.
    pub fn handoff(&self, phase: Phase) -> &'static str {
        match (self.role, phase) {
            (Role::Manager, Phase::Design) => {
                "@sys_arch here's the request. Design the system architecture and define the key modules."
            }
            (Role::Manager, Phase::Code) => {
                "@dev here's the request. Implement it as a complete package."
            }
            (Role::Manager, Phase::Test) => "@tester here's the request. Write the tests first.",
            (Role::Manager, Phase::Review) => {
                "@security_engineer here's the request. Review the code for security issues and vulnerabilities."
            }
            (Role::Manager, Phase::Deploy) => "@devops here's the request. Prepare the deployment.",
            _ => self.handoff_note,
        }
    }

    pub fn include_filter(&self) -> BTreeSet<Role> {
        self.sees.iter().copied().collect()
    }
}
