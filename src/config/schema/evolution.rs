use crate::core::style::StructuralWeights;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Generations kept in history before oldest-first eviction.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_low_mutation_strength")]
    pub low_mutation_strength: f64,
    #[serde(default = "default_high_mutation_strength")]
    pub high_mutation_strength: f64,
    /// Blend ratio toward the partner style for the interpolation candidate.
    #[serde(default = "default_interpolation_ratio")]
    pub interpolation_ratio: f64,
    #[serde(default)]
    pub structural_weights: StructuralWeights,
    /// Tags the compatibility metric measures overlap against.
    #[serde(default)]
    pub reference_tags: BTreeSet<String>,
    /// Fixed seed for reproducible runs; random when unset.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_history_capacity() -> usize {
    50
}
fn default_low_mutation_strength() -> f64 {
    0.1
}
fn default_high_mutation_strength() -> f64 {
    0.3
}
fn default_interpolation_ratio() -> f64 {
    0.5
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            low_mutation_strength: default_low_mutation_strength(),
            high_mutation_strength: default_high_mutation_strength(),
            interpolation_ratio: default_interpolation_ratio(),
            structural_weights: StructuralWeights::default(),
            reference_tags: BTreeSet::new(),
            rng_seed: None,
        }
    }
}

fn validate_strength(label: &str, strength: f64) -> Result<()> {
    if !strength.is_finite() || strength <= 0.0 || strength > 1.0 {
        anyhow::bail!("evolution.{label} must be in (0.0, 1.0], got {strength}");
    }
    Ok(())
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            anyhow::bail!("evolution.history_capacity must be at least 1");
        }
        validate_strength("low_mutation_strength", self.low_mutation_strength)?;
        validate_strength("high_mutation_strength", self.high_mutation_strength)?;
        if !(0.0..=1.0).contains(&self.interpolation_ratio) {
            anyhow::bail!(
                "evolution.interpolation_ratio must be in [0.0, 1.0], got {}",
                self.interpolation_ratio
            );
        }
        self.structural_weights
            .validate()
            .map_err(|e| anyhow::anyhow!("evolution.structural_weights: {e}"))?;
        Ok(())
    }
}
