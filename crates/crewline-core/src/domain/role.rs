//! Pipeline participants.

use serde::{Deserialize, Serialize};

use crate::domain::error::{CrewlineError, Result};

/// The fixed set of roles in a generation pipeline.
///
/// Ordering follows the declaration order and is only used for stable
/// iteration in sets and maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    EndUser,
    Manager,
    Analyst,
    Architect,
    Implementer,
    Tester,
    Reviewer,
    Deployer,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 8] = [
        Role::EndUser,
        Role::Manager,
        Role::Analyst,
        Role::Architect,
        Role::Implementer,
        Role::Tester,
        Role::Reviewer,
        Role::Deployer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::EndUser => "end_user",
            Role::Manager => "manager",
            Role::Analyst => "analyst",
            Role::Architect => "architect",
            Role::Implementer => "implementer",
            Role::Tester => "tester",
            Role::Reviewer => "reviewer",
            Role::Deployer => "deployer",
        }
    }

    /// Chat transport role used when this role's content is sent to a model.
    pub fn transport(self) -> TransportRole {
        match self {
            Role::EndUser => TransportRole::User,
            _ => TransportRole::Assistant,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = CrewlineError;

    /// Accepts the snake_case name, the kebab-case name, and `user` for
    /// [`Role::EndUser`].
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if normalized == "user" {
            return Ok(Role::EndUser);
        }
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| CrewlineError::UnknownRole(s.to_string()))
    }
}

/// Chat message role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportRole {
    User,
    Assistant,
}

impl TransportRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportRole::User => "user",
            TransportRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TransportRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
