use super::super::{EvolutionConfig, FeedbackConfig, ObservabilityConfig, OrchestratorConfig};
use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (history snapshots) - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub evolution: EvolutionConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let chromatica_dir = home.join(".chromatica");

        Self {
            data_dir: chromatica_dir.join("data"),
            config_path: chromatica_dir.join("config.toml"),
            evolution: EvolutionConfig::default(),
            feedback: FeedbackConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evolution
            .validate()
            .and_then(|()| self.feedback.validate())
            .and_then(|()| self.orchestrator.validate())
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }
}
