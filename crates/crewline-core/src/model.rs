//! Model selection by tier and purpose.

use serde::{Deserialize, Serialize};

use crate::domain::error::{CrewlineError, Result};

/// Quality tier requested for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelTier {
    High,
    #[default]
    Mid,
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelTier::High => write!(f, "HIGH"),
            ModelTier::Mid => write!(f, "MID"),
        }
    }
}

impl std::str::FromStr for ModelTier {
    type Err = CrewlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(ModelTier::High),
            "MID" => Ok(ModelTier::Mid),
            _ => Err(CrewlineError::UnknownTier(s.to_string())),
        }
    }
}

/// What a worker uses its model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelPurpose {
    /// Reasoning about requirements, design, and review.
    Think,
    /// Writing code and tests.
    Dev,
}

/// Model identifier for every `(tier, purpose)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelCatalog {
    pub high_think: String,
    pub high_dev: String,
    pub mid_think: String,
    pub mid_dev: String,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            high_think: "o4-mini".to_string(),
            high_dev: "gpt-5-mini".to_string(),
            mid_think: "gpt-5-mini".to_string(),
            mid_dev: "gpt-4.1-mini".to_string(),
        }
    }
}

impl ModelCatalog {
    pub fn model_for(&self, tier: ModelTier, purpose: ModelPurpose) -> &str {
        match (tier, purpose) {
            (ModelTier::High, ModelPurpose::Think) => &self.high_think,
            (ModelTier::High, ModelPurpose::Dev) => &self.high_dev,
            (ModelTier::Mid, ModelPurpose::Think) => &self.mid_think,
            (ModelTier::Mid, ModelPurpose::Dev) => &self.mid_dev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        let catalog = ModelCatalog::default();
        assert_eq!(catalog.model_for(ModelTier::High, ModelPurpose::Think), "o4-mini");
        assert_eq!(catalog.model_for(ModelTier::High, ModelPurpose::Dev), "gpt-5-mini");
        assert_eq!(catalog.model_for(ModelTier::Mid, ModelPurpose::Think), "gpt-5-mini");
        assert_eq!(catalog.model_for(ModelTier::Mid, ModelPurpose::Dev), "gpt-4.1-mini");
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("high".parse::<ModelTier>().unwrap(), ModelTier::High);
        assert!("LOW".parse::<ModelTier>().is_err());
    }
}
