use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Score added or removed per matched sentiment word.
    #[serde(default = "default_sentiment_step")]
    pub sentiment_step: f64,
    #[serde(default)]
    pub extra_positive_words: Vec<String>,
    #[serde(default)]
    pub extra_negative_words: Vec<String>,
    /// Trust weight given to each trend signal pulled from a trend source.
    #[serde(default = "default_trend_weight")]
    pub trend_weight: f64,
}

fn default_sentiment_step() -> f64 {
    0.1
}
fn default_trend_weight() -> f64 {
    0.3
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            sentiment_step: default_sentiment_step(),
            extra_positive_words: Vec::new(),
            extra_negative_words: Vec::new(),
            trend_weight: default_trend_weight(),
        }
    }
}

impl FeedbackConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.sentiment_step > 0.0 && self.sentiment_step <= 0.5) {
            anyhow::bail!(
                "feedback.sentiment_step must be in (0.0, 0.5], got {}",
                self.sentiment_step
            );
        }
        if !self.trend_weight.is_finite() || self.trend_weight <= 0.0 {
            anyhow::bail!(
                "feedback.trend_weight must be positive, got {}",
                self.trend_weight
            );
        }
        Ok(())
    }
}
