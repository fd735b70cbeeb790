//! Pure style arithmetic: interpolation, mutation and scoring.
//!
//! Nothing here touches engine state. Randomness is always supplied by the
//! caller so a seeded generator reproduces a run exactly.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::types::{Lineage, ParamValue, Style};
use crate::core::feedback::{FeedbackSample, weighted_fitness};
use crate::error::StyleError;

const NEUTRAL: f64 = 0.5;
const FEEDBACK_SHARE: f64 = 0.5;
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;
// Largest population variance of values confined to [0, 1].
const MAX_UNIT_VARIANCE: f64 = 0.25;

static NO_TAGS: BTreeSet<String> = BTreeSet::new();

/// Relative weight of each structural metric. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructuralWeights {
    pub coherence: f64,
    pub stability: f64,
    pub compatibility: f64,
}

impl StructuralWeights {
    pub fn validate(&self) -> Result<(), StyleError> {
        let parts = [self.coherence, self.stability, self.compatibility];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(StyleError::argument(format!(
                "structural weights must be finite and non-negative, got {self:?}"
            )));
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(StyleError::argument(format!(
                "structural weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

impl Default for StructuralWeights {
    fn default() -> Self {
        Self {
            coherence: 0.4,
            stability: 0.3,
            compatibility: 0.3,
        }
    }
}

/// What a score is measured against: the style's lineage parent (if known)
/// and the caller's reference tag set.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub parent: Option<&'a Style>,
    pub reference_tags: &'a BTreeSet<String>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(reference_tags: &'a BTreeSet<String>) -> Self {
        Self {
            parent: None,
            reference_tags,
        }
    }

    pub fn with_parent(mut self, parent: Option<&'a Style>) -> Self {
        self.parent = parent;
        self
    }
}

impl Default for ScoringContext<'_> {
    fn default() -> Self {
        Self::new(&NO_TAGS)
    }
}

/// Every component that went into a blended score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub feedback: f64,
    pub coherence: f64,
    pub stability: f64,
    pub compatibility: f64,
    pub structural: f64,
    pub total: f64,
}

/// Blend `a` toward `b` by `t`.
///
/// Numeric keys present in both are lerped; keys present in only one side are
/// carried over; categorical (or mixed) keys take `a` below 0.5 and `b` from
/// 0.5 upward.
pub fn interpolate(a: &Style, b: &Style, t: f64) -> Result<Style, StyleError> {
    if !(0.0..=1.0).contains(&t) {
        return Err(StyleError::argument(format!(
            "interpolation ratio {t} lies outside [0, 1]"
        )));
    }
    a.ensure_finite()?;
    b.ensure_finite()?;

    let description = format!(
        "{:.0}% '{}' (v{}) / {:.0}% '{}' (v{})",
        (1.0 - t) * 100.0,
        a.name,
        a.version,
        t * 100.0,
        b.name,
        b.version
    );
    let mut blended = Style::derived(
        a.name.clone(),
        description,
        a.version.max(b.version).saturating_add(1),
        Lineage::pair(a.id.clone(), b.id.clone()),
    );

    for (key, left) in &a.parameters {
        let value = match (left, b.parameters.get(key)) {
            (
                ParamValue::Numeric { value: x, domain },
                Some(ParamValue::Numeric {
                    value: y,
                    domain: other_domain,
                }),
            ) => {
                let domain = if t < 0.5 { *domain } else { *other_domain };
                ParamValue::bounded(domain.clamp(lerp(*x, *y, t)), domain)
            }
            (_, Some(right)) if t >= 0.5 => right.clone(),
            _ => left.clone(),
        };
        blended.parameters.insert(key.clone(), value);
    }
    for (key, right) in &b.parameters {
        blended
            .parameters
            .entry(key.clone())
            .or_insert_with(|| right.clone());
    }

    blended.tags = a.tags.union(&b.tags).cloned().collect();
    Ok(blended)
}

// Endpoints return the exact inputs so boundary and idempotence hold bit-for-bit.
fn lerp(x: f64, y: f64, t: f64) -> f64 {
    if t <= 0.0 {
        x
    } else if t >= 1.0 {
        y
    } else {
        x + (y - x) * t
    }
}

/// Perturb every numeric parameter by up to `strength` of its domain width.
pub fn mutate<R: Rng>(style: &Style, strength: f64, rng: &mut R) -> Result<Style, StyleError> {
    if !strength.is_finite() || strength <= 0.0 || strength > 1.0 {
        return Err(StyleError::argument(format!(
            "mutation strength {strength} lies outside (0, 1]"
        )));
    }
    style.ensure_finite()?;

    let mut mutated = Style::derived(
        style.name.clone(),
        format!(
            "mutation of '{}' (v{}) at strength {strength:.2}",
            style.name, style.version
        ),
        style.version.saturating_add(1),
        Lineage::single(style.id.clone()),
    );
    mutated.tags = style.tags.clone();

    for (key, param) in &style.parameters {
        let value = match param {
            ParamValue::Numeric { value, domain } => {
                let delta = rng.random_range(-strength..=strength) * domain.width();
                ParamValue::bounded(domain.clamp(value + delta), *domain)
            }
            ParamValue::Categorical(_) => param.clone(),
        };
        mutated.parameters.insert(key.clone(), value);
    }

    Ok(mutated)
}

/// Blended fitness in [0, 1]: half feedback, half weighted structure.
pub fn score(
    style: &Style,
    feedback: &[FeedbackSample],
    weights: &StructuralWeights,
    ctx: ScoringContext<'_>,
) -> Result<f64, StyleError> {
    score_breakdown(style, feedback, weights, ctx).map(|breakdown| breakdown.total)
}

pub fn score_breakdown(
    style: &Style,
    feedback: &[FeedbackSample],
    weights: &StructuralWeights,
    ctx: ScoringContext<'_>,
) -> Result<ScoreBreakdown, StyleError> {
    weights.validate()?;

    let feedback = weighted_fitness(feedback);
    let coherence = coherence(style);
    let stability = stability(style, ctx.parent);
    let compatibility = compatibility(style, ctx.reference_tags);
    let structural = (weights.coherence * coherence
        + weights.stability * stability
        + weights.compatibility * compatibility)
        .clamp(0.0, 1.0);
    let total = (FEEDBACK_SHARE * feedback + (1.0 - FEEDBACK_SHARE) * structural).clamp(0.0, 1.0);

    Ok(ScoreBreakdown {
        feedback,
        coherence,
        stability,
        compatibility,
        structural,
        total,
    })
}

fn normalized_values(style: &Style) -> Vec<f64> {
    style
        .numeric_params()
        .filter(|(_, value, _)| value.is_finite())
        .map(|(_, value, domain)| domain.normalize(value))
        .collect()
}

/// Low spread of normalized numeric values scores high.
pub fn coherence(style: &Style) -> f64 {
    let values = normalized_values(style);
    if values.is_empty() {
        return NEUTRAL;
    }
    let count = count_f64(values.len());
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    (1.0 - variance / MAX_UNIT_VARIANCE).clamp(0.0, 1.0)
}

/// Small RMS distance from the lineage parent scores high; neutral without one.
pub fn stability(style: &Style, parent: Option<&Style>) -> f64 {
    let Some(parent) = parent else {
        return NEUTRAL;
    };

    let squared: Vec<f64> = style
        .numeric_params()
        .filter_map(|(key, value, domain)| {
            let other = parent.parameters.get(key)?;
            let (other_value, other_domain) = (other.as_f64()?, other.domain()?);
            if !value.is_finite() || !other_value.is_finite() {
                return None;
            }
            Some((domain.normalize(value) - other_domain.normalize(other_value)).powi(2))
        })
        .collect();

    if squared.is_empty() {
        return NEUTRAL;
    }
    let rms = (squared.iter().sum::<f64>() / count_f64(squared.len())).sqrt();
    (1.0 - rms).clamp(0.0, 1.0)
}

/// Jaccard overlap with the reference tags; neutral when there is no reference.
pub fn compatibility(style: &Style, reference_tags: &BTreeSet<String>) -> f64 {
    if reference_tags.is_empty() {
        return NEUTRAL;
    }
    let shared = style.tags.intersection(reference_tags).count();
    let union = style.tags.union(reference_tags).count();
    count_f64(shared) / count_f64(union)
}

#[allow(clippy::cast_precision_loss)]
fn count_f64(count: usize) -> f64 {
    count as f64
}
