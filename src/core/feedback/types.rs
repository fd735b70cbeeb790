use serde::{Deserialize, Serialize};
use strum::Display;

// FeedbackSource: where an observation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeedbackSource {
    ExplicitRating,
    FreeTextSentiment,
    SocialSignal,
}

// RawFeedback: the observation as received, kept for auditing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFeedback {
    Number(f64),
    Text(String),
}

/// One scored observation. The normalized score is always derived by the
/// aggregator; callers cannot author it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSample {
    source: FeedbackSource,
    raw_value: RawFeedback,
    normalized_score: f64,
    weight: f64,
}

impl FeedbackSample {
    pub(crate) fn new(
        source: FeedbackSource,
        raw_value: RawFeedback,
        normalized_score: f64,
        weight: f64,
    ) -> Self {
        Self {
            source,
            raw_value,
            normalized_score: normalized_score.clamp(0.0, 1.0),
            weight,
        }
    }

    pub fn source(&self) -> FeedbackSource {
        self.source
    }

    pub fn raw_value(&self) -> &RawFeedback {
        &self.raw_value
    }

    pub fn normalized_score(&self) -> f64 {
        self.normalized_score
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Weighted mean of normalized scores; neutral 0.5 when there is nothing to average.
pub fn weighted_fitness(samples: &[FeedbackSample]) -> f64 {
    let (weighted_sum, weight_total) = samples
        .iter()
        .filter(|sample| sample.weight.is_finite() && sample.weight > 0.0)
        .fold((0.0, 0.0), |(sum, total), sample| {
            (
                sum + sample.normalized_score * sample.weight,
                total + sample.weight,
            )
        });

    if weight_total <= 0.0 {
        return 0.5;
    }
    (weighted_sum / weight_total).clamp(0.0, 1.0)
}
