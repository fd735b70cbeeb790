use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Model used to expand a concept into a detailed prompt.
    #[serde(default = "default_prompt_model")]
    pub prompt_model: String,
    /// Image model id passed to the renderer.
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_prompt_temperature")]
    pub prompt_temperature: f64,
    /// Evolve once every N successful renders; 0 leaves cadence entirely to the caller.
    #[serde(default = "default_evolve_every")]
    pub evolve_every: u32,
    #[serde(default = "default_render_retries")]
    pub render_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_prompt_model() -> String {
    "anthropic/claude-sonnet-4-20250514".into()
}
fn default_image_model() -> String {
    "stability-ai/sdxl".into()
}
fn default_prompt_temperature() -> f64 {
    0.8
}
fn default_evolve_every() -> u32 {
    5
}
fn default_render_retries() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    500
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            prompt_model: default_prompt_model(),
            image_model: default_image_model(),
            prompt_temperature: default_prompt_temperature(),
            evolve_every: default_evolve_every(),
            render_retries: default_render_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.prompt_model.trim().is_empty() {
            anyhow::bail!("orchestrator.prompt_model must not be empty");
        }
        if self.image_model.trim().is_empty() {
            anyhow::bail!("orchestrator.image_model must not be empty");
        }
        if !(0.0..=2.0).contains(&self.prompt_temperature) {
            anyhow::bail!("orchestrator.prompt_temperature must be in [0.0, 2.0]");
        }
        if self.render_retries > 10 {
            anyhow::bail!("orchestrator.render_retries must be <= 10");
        }
        if self.retry_backoff_ms > 60_000 {
            anyhow::bail!("orchestrator.retry_backoff_ms must be <= 60000");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.evolve_every, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_model_is_rejected() {
        let cfg = OrchestratorConfig {
            image_model: "  ".into(),
            ..OrchestratorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn excessive_retries_are_rejected() {
        let cfg = OrchestratorConfig {
            render_retries: 50,
            ..OrchestratorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
