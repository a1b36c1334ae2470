//! Configuration for the analysis pipelines.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisResult;
use crate::strategy::StrategyConfig;
use crate::vision::VisionConfig;

/// Combined configuration for vision analysis and strategy advice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Vision analysis settings
    #[serde(default)]
    pub vision: VisionConfig,
    /// Strategy advice settings
    #[serde(default)]
    pub strategy: StrategyConfig,
}

impl AnalysisConfig {
    /// Load configuration from a YAML file.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn from_file(path: &PathBuf) -> AnalysisResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::AnalysisError::Config(e.to_string()))?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, preferring project config over user config.
    ///
    /// Looks at `config/analysis.yaml`, then
    /// `~/.blockpilot/config/analysis.yaml`, then falls back to defaults.
    pub fn load_with_hierarchy() -> AnalysisResult<Self> {
        let project = PathBuf::from("config/analysis.yaml");
        if project.exists() {
            return Self::from_file(&project);
        }

        if let Some(home) = dirs::home_dir() {
            let user = home.join(".blockpilot").join("config").join("analysis.yaml");
            if user.exists() {
                return Self::from_file(&user);
            }
        }

        Ok(Self::default())
    }
}
