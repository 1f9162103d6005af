//! Experiment Definition - variants, weights, and eligibility window

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One named alternative experience within an experiment.
///
/// Weights are relative: percentages are computed against the sum of all
/// weights in the definition, so they need not sum to 100 (the conventional
/// layout does, for readability). A weight of 0 is legal and makes the
/// variant unreachable under hashing - useful for disabling a variant
/// without removing it from the definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variant {
    key: String,
    weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Variant {
    /// Create a new variant with the given key and weight.
    #[must_use]
    pub fn new(key: impl Into<String>, weight: u32) -> Self {
        Self {
            key: key.into(),
            weight,
            description: None,
        }
    }

    /// Attach a human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Get the variant key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the variant weight.
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }

    /// Get the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Experiment Definition - the unit the registry holds.
///
/// Variants are an **ordered** sequence, never a map: declaration order is
/// part of the definition's identity. Two definitions with the same weights
/// but different variant order assign different visitors to different
/// variants, so reordering variants is a breaking change to a live
/// experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "DefinitionData")]
pub struct ExperimentDefinition {
    name: String,
    variants: Vec<Variant>,
    active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    audience: Vec<String>,
}

/// Wire shape for `ExperimentDefinition`; deserialization funnels through
/// `TryFrom` so the variant invariants hold on the serde path too.
#[derive(Deserialize)]
struct DefinitionData {
    name: String,
    variants: Vec<Variant>,
    active: bool,
    #[serde(default)]
    start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    audience: Vec<String>,
}

impl TryFrom<DefinitionData> for ExperimentDefinition {
    type Error = Error;

    fn try_from(data: DefinitionData) -> Result<Self> {
        validate_variants(&data.name, &data.variants)?;
        Ok(Self {
            name: data.name,
            variants: data.variants,
            active: data.active,
            start_date: data.start_date,
            end_date: data.end_date,
            audience: data.audience,
        })
    }
}

/// Definition invariants: at least one variant, at least one positive weight.
fn validate_variants(name: &str, variants: &[Variant]) -> Result<()> {
    if variants.is_empty() {
        return Err(Error::InvalidDefinition(format!(
            "experiment '{name}' has no variants"
        )));
    }
    if variants.iter().all(|v| v.weight() == 0) {
        return Err(Error::InvalidDefinition(format!(
            "experiment '{name}' has no variant with positive weight"
        )));
    }
    Ok(())
}

impl ExperimentDefinition {
    /// Create a builder for an experiment definition.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ExperimentDefinitionBuilder {
        ExperimentDefinitionBuilder::new(name)
    }

    /// Get the experiment name (unique key).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the variants in declaration order.
    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Get the key of the first declared variant.
    ///
    /// This is the fallback when cumulative weights never reach the bucket
    /// value (weights summing to less than 100). The builder guarantees at
    /// least one variant exists.
    #[must_use]
    pub fn first_variant_key(&self) -> &str {
        self.variants.first().map_or("", Variant::key)
    }

    /// Whether the experiment is switched on, independent of the date window.
    #[must_use]
    pub const fn active(&self) -> bool {
        self.active
    }

    /// Get the inclusive window start, if any.
    #[must_use]
    pub const fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Get the inclusive window end; absent means open-ended.
    #[must_use]
    pub const fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// Get the audience rule identifiers (opaque to this crate).
    #[must_use]
    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    /// Pure eligibility check: active AND inside the inclusive date window.
    ///
    /// No side effects; the caller supplies `now` so the check is a pure
    /// function of the definition and a timestamp.
    #[must_use]
    pub fn is_eligible_at(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.start_date.map_or(true, |start| now >= start)
            && self.end_date.map_or(true, |end| now <= end)
    }
}

/// Builder for `ExperimentDefinition`.
///
/// `build()` validates the definition invariants: at least one variant, and
/// at least one positive weight.
#[derive(Debug)]
pub struct ExperimentDefinitionBuilder {
    name: String,
    variants: Vec<Variant>,
    active: bool,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    audience: Vec<String>,
}

impl ExperimentDefinitionBuilder {
    /// Create a new builder. Definitions start active with no date window.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
            active: true,
            start_date: None,
            end_date: None,
            audience: Vec::new(),
        }
    }

    /// Append a variant. Declaration order is preserved and significant.
    #[must_use]
    pub fn variant(mut self, key: impl Into<String>, weight: u32) -> Self {
        self.variants.push(Variant::new(key, weight));
        self
    }

    /// Append a pre-built variant (for descriptions).
    #[must_use]
    pub fn push_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Set the active flag.
    #[must_use]
    pub const fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the inclusive window start.
    #[must_use]
    pub const fn start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    /// Set the inclusive window end.
    #[must_use]
    pub const fn end_date(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    /// Append an audience rule identifier.
    #[must_use]
    pub fn audience_rule(mut self, rule: impl Into<String>) -> Self {
        self.audience.push(rule.into());
        self
    }

    /// Build the definition, validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDefinition` if no variants were declared or
    /// every declared weight is zero.
    pub fn build(self) -> Result<ExperimentDefinition> {
        validate_variants(&self.name, &self.variants)?;
        Ok(ExperimentDefinition {
            name: self.name,
            variants: self.variants,
            active: self.active,
            start_date: self.start_date,
            end_date: self.end_date,
            audience: self.audience,
        })
    }
}
