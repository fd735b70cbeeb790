use std::collections::HashSet;

use super::types::{FeedbackSample, FeedbackSource, RawFeedback};
use crate::config::FeedbackConfig;
use crate::error::StyleError;

const NEUTRAL_SCORE: f64 = 0.5;
const RATING_WEIGHT: f64 = 1.0;
const TEXT_WEIGHT: f64 = 0.5;

const POSITIVE_WORDS: &[&str] = &[
    "amazing",
    "awesome",
    "beautiful",
    "brilliant",
    "excellent",
    "fantastic",
    "good",
    "gorgeous",
    "great",
    "love",
    "lovely",
    "perfect",
    "stunning",
    "wonderful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "awful",
    "bad",
    "boring",
    "dull",
    "hate",
    "horrible",
    "mediocre",
    "messy",
    "poor",
    "terrible",
    "ugly",
    "worst",
];

/// Turns heterogeneous raw feedback into [`FeedbackSample`]s.
///
/// Parsing is best-effort: malformed ratings degrade to a neutral sample with
/// half the usual weight instead of failing, so feedback can never stall the
/// evolution loop.
#[derive(Debug, Clone)]
pub struct FeedbackAggregator {
    sentiment_step: f64,
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl FeedbackAggregator {
    pub fn new(config: &FeedbackConfig) -> Self {
        let positive = POSITIVE_WORDS
            .iter()
            .map(|word| (*word).to_string())
            .chain(config.extra_positive_words.iter().map(|w| w.to_lowercase()))
            .collect();
        let negative = NEGATIVE_WORDS
            .iter()
            .map(|word| (*word).to_string())
            .chain(config.extra_negative_words.iter().map(|w| w.to_lowercase()))
            .collect();

        Self {
            sentiment_step: config.sentiment_step,
            positive,
            negative,
        }
    }

    /// Explicit rating `score` out of `out_of`, clamped to [0, 1].
    pub fn from_rating(&self, score: f64, out_of: f64) -> FeedbackSample {
        let raw = RawFeedback::Text(format!("{score}/{out_of}"));
        match normalize_ratio(score, out_of) {
            Some(normalized) => FeedbackSample::new(
                FeedbackSource::ExplicitRating,
                raw,
                normalized,
                RATING_WEIGHT,
            ),
            None => {
                tracing::warn!(score, out_of, "unusable rating; using neutral sample");
                neutral(FeedbackSource::ExplicitRating, raw, RATING_WEIGHT)
            }
        }
    }

    /// Free-text comment. An explicit "N out of M" or "N/M" wins over sentiment scanning.
    pub fn from_text(&self, comment: &str) -> FeedbackSample {
        let raw = RawFeedback::Text(comment.to_string());

        if let Some((score, out_of)) = extract_explicit_rating(comment) {
            return match normalize_ratio(score, out_of) {
                Some(normalized) => FeedbackSample::new(
                    FeedbackSource::FreeTextSentiment,
                    raw,
                    normalized,
                    TEXT_WEIGHT,
                ),
                None => {
                    tracing::warn!(score, out_of, "unusable rating in comment; using neutral sample");
                    neutral(FeedbackSource::FreeTextSentiment, raw, TEXT_WEIGHT)
                }
            };
        }

        let mut score = NEUTRAL_SCORE;
        for word in words(comment) {
            if self.positive.contains(&word) {
                score += self.sentiment_step;
            } else if self.negative.contains(&word) {
                score -= self.sentiment_step;
            }
        }

        FeedbackSample::new(
            FeedbackSource::FreeTextSentiment,
            raw,
            score.clamp(0.0, 1.0),
            TEXT_WEIGHT,
        )
    }

    /// Pre-normalized external trend/social score with a caller-chosen trust weight.
    pub fn from_social_signal(&self, value: f64, weight: f64) -> Result<FeedbackSample, StyleError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(StyleError::argument(format!(
                "social signal {value} lies outside [0, 1]"
            )));
        }
        if !weight.is_finite() || weight <= 0.0 {
            return Err(StyleError::argument(format!(
                "social signal weight must be positive, got {weight}"
            )));
        }
        Ok(FeedbackSample::new(
            FeedbackSource::SocialSignal,
            RawFeedback::Number(value),
            value,
            weight,
        ))
    }
}

impl Default for FeedbackAggregator {
    fn default() -> Self {
        Self::new(&FeedbackConfig::default())
    }
}

fn neutral(source: FeedbackSource, raw: RawFeedback, usual_weight: f64) -> FeedbackSample {
    FeedbackSample::new(source, raw, NEUTRAL_SCORE, usual_weight / 2.0)
}

fn normalize_ratio(score: f64, out_of: f64) -> Option<f64> {
    if !score.is_finite() || !out_of.is_finite() || out_of <= 0.0 {
        return None;
    }
    Some((score / out_of).clamp(0.0, 1.0))
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

fn parse_number(token: &str) -> Option<f64> {
    let trimmed = token
        .trim_matches(|c: char| !c.is_ascii_digit() && c != '.')
        .trim_end_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Finds the first "N out of M" or "N/M" in `text`.
pub(crate) fn extract_explicit_rating(text: &str) -> Option<(f64, f64)> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();

    for (index, token) in tokens.iter().enumerate() {
        if let Some((left, right)) = token.split_once('/')
            && let (Some(score), Some(out_of)) = (parse_number(left), parse_number(right))
        {
            return Some((score, out_of));
        }

        if let [score, out, of, out_of, ..] = &tokens[index..]
            && *out == "out"
            && *of == "of"
            && let (Some(score), Some(out_of)) = (parse_number(score), parse_number(out_of))
        {
            return Some((score, out_of));
        }
    }

    None
}
