//! Declared next stages.

use serde::{Deserialize, Serialize};

use crate::domain::error::{CrewlineError, Result};

/// A worker's declared next stage. Only ever used as a routing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Init,
    Revise,
    Analysis,
    Design,
    Code,
    Test,
    Retest,
    Review,
    Deploy,
    Done,
}

impl Phase {
    pub const ALL: [Phase; 10] = [
        Phase::Init,
        Phase::Revise,
        Phase::Analysis,
        Phase::Design,
        Phase::Code,
        Phase::Test,
        Phase::Retest,
        Phase::Review,
        Phase::Deploy,
        Phase::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Init => "INIT",
            Phase::Revise => "REVISE",
            Phase::Analysis => "ANALYSIS",
            Phase::Design => "DESIGN",
            Phase::Code => "CODE",
            Phase::Test => "TEST",
            Phase::Retest => "RETEST",
            Phase::Review => "REVIEW",
            Phase::Deploy => "DEPLOY",
            Phase::Done => "DONE",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = CrewlineError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == normalized)
            .ok_or_else(|| CrewlineError::UnknownPhase(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_parse_is_case_insensitive() {
        assert_eq!("design".parse::<Phase>().unwrap(), Phase::Design);
        assert_eq!(" RETEST ".parse::<Phase>().unwrap(), Phase::Retest);
        assert!("SHIP".parse::<Phase>().is_err());
    }

    #[test]
    fn test_phase_serde_uses_upper_case() {
        let json = serde_json::to_string(&Phase::Analysis).unwrap();
        assert_eq!(json, "\"ANALYSIS\"");
    }
}
