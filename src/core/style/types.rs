use crate::error::StyleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ParamDomain: closed numeric range a parameter is clamped to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamDomain {
    pub min: f64,
    pub max: f64,
}

impl ParamDomain {
    pub const UNIT: Self = Self { min: 0.0, max: 1.0 };

    pub fn new(min: f64, max: f64) -> Result<Self, StyleError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(StyleError::argument(format!(
                "invalid parameter domain [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Position of `value` inside the domain, mapped to [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        let width = self.width();
        if width <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / width).clamp(0.0, 1.0)
    }

    fn is_unit(&self) -> bool {
        self.min.to_bits() == 0.0_f64.to_bits() && self.max.to_bits() == 1.0_f64.to_bits()
    }
}

impl Default for ParamDomain {
    fn default() -> Self {
        Self::UNIT
    }
}

// ParamValue: numeric dials evolve, categorical descriptors ride along
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawParamValue", into = "RawParamValue")]
pub enum ParamValue {
    Numeric { value: f64, domain: ParamDomain },
    Categorical(String),
}

impl ParamValue {
    pub fn unit(value: f64) -> Self {
        Self::Numeric {
            value,
            domain: ParamDomain::UNIT,
        }
    }

    pub fn bounded(value: f64, domain: ParamDomain) -> Self {
        Self::Numeric { value, domain }
    }

    pub fn categorical(value: impl Into<String>) -> Self {
        Self::Categorical(value.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numeric { value, .. } => Some(*value),
            Self::Categorical(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Numeric { .. } => None,
            Self::Categorical(value) => Some(value),
        }
    }

    pub fn domain(&self) -> Option<ParamDomain> {
        match self {
            Self::Numeric { domain, .. } => Some(*domain),
            Self::Categorical(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric { .. })
    }
}

// Wire shape: `0.4`, `{ value = 1.2, min = 0.0, max = 2.0 }` or `"watercolor"`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawParamValue {
    Number(f64),
    Bounded {
        value: f64,
        #[serde(default = "unit_min")]
        min: f64,
        #[serde(default = "unit_max")]
        max: f64,
    },
    Text(String),
}

fn unit_min() -> f64 {
    0.0
}
fn unit_max() -> f64 {
    1.0
}

impl From<RawParamValue> for ParamValue {
    fn from(raw: RawParamValue) -> Self {
        match raw {
            RawParamValue::Number(value) => Self::unit(value),
            RawParamValue::Bounded { value, min, max } => Self::Numeric {
                value,
                domain: ParamDomain { min, max },
            },
            RawParamValue::Text(text) => Self::Categorical(text),
        }
    }
}

impl From<ParamValue> for RawParamValue {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Numeric { value, domain } if domain.is_unit() => Self::Number(value),
            ParamValue::Numeric { value, domain } => Self::Bounded {
                value,
                min: domain.min,
                max: domain.max,
            },
            ParamValue::Categorical(text) => Self::Text(text),
        }
    }
}

// Lineage: provenance pointers to the parent style(s)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    pub primary: String,
    #[serde(default)]
    pub secondary: Option<String>,
}

impl Lineage {
    pub fn single(parent: impl Into<String>) -> Self {
        Self {
            primary: parent.into(),
            secondary: None,
        }
    }

    pub fn pair(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: Some(secondary.into()),
        }
    }

    pub fn parents(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.secondary.as_deref())
    }
}

/// A named, versioned parameter vector. Derivation always builds a new value;
/// nothing in the crate edits a `Style` after it has been handed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(default = "new_style_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default = "initial_version")]
    pub version: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub lineage: Option<Lineage>,
}

pub(crate) fn new_style_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn initial_version() -> u32 {
    1
}

impl Style {
    /// Manually authored seed: version 1, no lineage.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_style_id(),
            name: name.into(),
            description: None,
            parameters: BTreeMap::new(),
            tags: BTreeSet::new(),
            version: initial_version(),
            created_at: now,
            modified_at: now,
            lineage: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Start a derived style: fresh id and timestamps, parameters filled by the caller.
    pub(crate) fn derived(
        name: String,
        description: String,
        version: u32,
        lineage: Lineage,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_style_id(),
            name,
            description: Some(description),
            parameters: BTreeMap::new(),
            tags: BTreeSet::new(),
            version,
            created_at: now,
            modified_at: now,
            lineage: Some(lineage),
        }
    }

    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).and_then(ParamValue::as_f64)
    }

    pub fn categorical(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(ParamValue::as_str)
    }

    /// Numeric parameters as `(key, value, domain)`.
    pub fn numeric_params(&self) -> impl Iterator<Item = (&str, f64, ParamDomain)> {
        self.parameters
            .iter()
            .filter_map(|(key, param)| match param {
                ParamValue::Numeric { value, domain } => Some((key.as_str(), *value, *domain)),
                ParamValue::Categorical(_) => None,
            })
    }

    /// Parameter equality ignoring bookkeeping fields (id, name, version, timestamps, lineage).
    pub fn parameters_equal(&self, other: &Self) -> bool {
        self.parameters == other.parameters
    }

    pub(crate) fn ensure_finite(&self) -> Result<(), StyleError> {
        for (key, value, _) in self.numeric_params() {
            if !value.is_finite() {
                return Err(StyleError::argument(format!(
                    "style '{}' parameter '{key}' is not finite ({value})",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Full well-formedness check used when a style enters the engine.
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.version == 0 {
            return Err(StyleError::argument(format!(
                "style '{}' has version 0; versions start at 1",
                self.name
            )));
        }
        self.ensure_finite()?;
        for (key, value, domain) in self.numeric_params() {
            ParamDomain::new(domain.min, domain.max)?;
            if !domain.contains(value) {
                return Err(StyleError::argument(format!(
                    "style '{}' parameter '{key}' = {value} lies outside [{}, {}]",
                    self.name, domain.min, domain.max
                )));
            }
        }
        Ok(())
    }
}

/// One step of the evolution loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: u64,
    pub style: Style,
    /// Absent until feedback or selection assigns a score.
    #[serde(default)]
    pub fitness: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_value_parses_plain_bounded_and_text_forms() {
        let doc = r#"
            name = "nocturne"
            tags = ["moody"]

            [parameters]
            brightness = 0.25
            saturation = { value = 1.5, min = 0.0, max = 2.0 }
            texture = "grainy"
        "#;
        let style: Style = toml::from_str(doc).expect("seed style should parse");

        assert_eq!(style.version, 1);
        assert!(style.lineage.is_none());
        assert_eq!(style.numeric("brightness"), Some(0.25));
        assert_eq!(
            style.parameters["saturation"].domain(),
            Some(ParamDomain { min: 0.0, max: 2.0 })
        );
        assert_eq!(style.categorical("texture"), Some("grainy"));
        assert!(style.tags.contains("moody"));
    }

    #[test]
    fn unit_domain_serializes_as_plain_number() {
        let style = Style::new("plain").with_param("contrast", ParamValue::unit(0.5));
        let json = serde_json::to_value(&style).unwrap();
        assert_eq!(json["parameters"]["contrast"], serde_json::json!(0.5));
    }

    #[test]
    fn validate_rejects_out_of_domain_values() {
        let style = Style::new("hot").with_param("brightness", ParamValue::unit(1.4));
        assert!(matches!(
            style.validate(),
            Err(StyleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn validate_rejects_non_finite_values() {
        let style = Style::new("nan").with_param("contrast", ParamValue::unit(f64::NAN));
        assert!(style.validate().is_err());
    }

    #[test]
    fn domain_rejects_inverted_bounds() {
        assert!(ParamDomain::new(1.0, 0.0).is_err());
        assert!(ParamDomain::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn normalize_handles_degenerate_domain() {
        let fixed = ParamDomain { min: 3.0, max: 3.0 };
        assert!((fixed.normalize(3.0) - 0.0).abs() < f64::EPSILON);
        let wide = ParamDomain::new(-1.0, 1.0).unwrap();
        assert!((wide.normalize(0.0) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn lineage_parents_lists_both_ids() {
        let lineage = Lineage::pair("a", "b");
        assert_eq!(lineage.parents().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(Lineage::single("a").parents().count(), 1);
    }
}
