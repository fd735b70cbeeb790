use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Request handed to a prompt-expansion model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f64,
}

/// Input for a single image prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub status: PredictionStatus,
    /// Output asset locations, usually image URLs.
    #[serde(default)]
    pub output: Vec<String>,
}

impl Prediction {
    pub fn is_usable(&self) -> bool {
        self.status == PredictionStatus::Succeeded && !self.output.is_empty()
    }
}

/// A pre-normalized popularity reading from an external trend feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSignal {
    pub topic: String,
    /// Popularity in [0, 1].
    pub score: f64,
}

/// Expands a short creative brief into a detailed image prompt.
#[async_trait]
pub trait PromptExpander: Send + Sync {
    async fn get_completion(&self, spec: &PromptSpec) -> anyhow::Result<String>;
}

/// Runs image-generation predictions against a hosted model.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn run_prediction(
        &self,
        model_id: &str,
        input: &PredictionInput,
    ) -> anyhow::Result<Prediction>;
}

#[async_trait]
pub trait TrendSource: Send + Sync {
    async fn fetch_signals(&self) -> anyhow::Result<Vec<TrendSignal>>;
}
