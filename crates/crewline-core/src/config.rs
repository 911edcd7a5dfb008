//! Pipeline configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! tdd_enabled = true
//! tier = "HIGH"
//! max_steps = 24
//!
//! [models]
//! high_dev = "gpt-5"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::error::{CrewlineError, Result};
use crate::model::{ModelCatalog, ModelPurpose, ModelTier};

/// Default ceiling on automatic steps per chain.
pub const DEFAULT_MAX_STEPS: usize = 16;

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Route through the tester before and after implementation.
    pub tdd_enabled: bool,
    pub tier: ModelTier,
    pub max_steps: usize,
    pub models: ModelCatalog,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tdd_enabled: false,
            tier: ModelTier::default(),
            max_steps: DEFAULT_MAX_STEPS,
            models: ModelCatalog::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| CrewlineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(CrewlineError::InvalidConfig(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Model identifier for this config's tier.
    pub fn model_for(&self, purpose: ModelPurpose) -> &str {
        self.models.model_for(self.tier, purpose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
        assert!(!config.tdd_enabled);
    }

    #[test]
    fn test_partial_model_override() {
        let config = PipelineConfig::from_toml_str(
            r#"
            tdd_enabled = true
            tier = "HIGH"

            [models]
            high_dev = "gpt-5"
            "#,
        )
        .unwrap();
        assert!(config.tdd_enabled);
        assert_eq!(config.model_for(ModelPurpose::Dev), "gpt-5");
        assert_eq!(config.model_for(ModelPurpose::Think), "o4-mini");
    }

    #[test]
    fn test_zero_steps_rejected() {
        let err = PipelineConfig::from_toml_str("max_steps = 0").unwrap_err();
        assert!(matches!(err, CrewlineError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crewline.toml");
        std::fs::write(&path, "tier = \"MID\"\nmax_steps = 4\n").unwrap();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.max_steps, 4);
    }
}
