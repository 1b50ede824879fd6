use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::constants::{CERTAINTY_MAX, CERTAINTY_MIN, GENERAL_DOMAIN, GRANULARITY_MAX, GRANULARITY_MIN};
use crate::tile::Axis;

/// Inclusive range of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Keyword that pins one axis of a query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordHint {
    pub axis: Axis,
    pub value: f64,
}

/// Severity of a risky claim pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Moderate,
    High,
    Critical,
}

/// A domain-specific claim pattern that the consistency check flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskyPattern {
    /// Regular expression, matched case-insensitively.
    pub pattern: String,
    pub claim_type: String,
    pub severity: Severity,
}

/// Declaration of one domain: its axis ranges, retrieval threshold and vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainSchema {
    pub code: String,
    pub name: String,
    pub certainty_range: AxisRange,
    pub granularity_range: AxisRange,
    pub verification_range: AxisRange,
    /// Tiles at or below this certainty are located by coarse bucket only.
    pub low_certainty_threshold: f64,
    pub keyword_map: BTreeMap<String, KeywordHint>,
    pub risky_patterns: Vec<RiskyPattern>,
}

impl DomainSchema {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            name: code.clone(),
            code,
            ..Self::default()
        }
    }

    pub fn range(&self, axis: Axis) -> AxisRange {
        match axis {
            Axis::Certainty => self.certainty_range,
            Axis::Granularity => self.granularity_range,
            Axis::Verification => self.verification_range,
        }
    }
}

impl Default for DomainSchema {
    fn default() -> Self {
        Self {
            code: GENERAL_DOMAIN.to_string(),
            name: "General".to_string(),
            certainty_range: AxisRange::new(CERTAINTY_MIN, CERTAINTY_MAX),
            granularity_range: AxisRange::new(GRANULARITY_MIN, GRANULARITY_MAX),
            verification_range: AxisRange::new(
                defaults::DEFAULT_VERIFICATION_MIN,
                defaults::DEFAULT_VERIFICATION_MAX,
            ),
            low_certainty_threshold: defaults::DEFAULT_LOW_CERTAINTY_THRESHOLD,
            keyword_map: BTreeMap::new(),
            risky_patterns: Vec::new(),
        }
    }
}

/// Weights of the default weighted-sum-then-clamp axis scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisWeights {
    /// Certainty start value for tiles that passed an initial review.
    pub initial_review: f64,
    /// Certainty start value for tiles that did not.
    pub unreviewed_start: f64,
    pub per_expert: f64,
    pub per_community: f64,
    /// Upper bound on what any single reviewer contributes.
    pub per_reviewer_cap: f64,
    pub per_external_source: f64,
    pub time_stability: f64,
    pub consensus: f64,
    pub verification_base: f64,
    pub verification_per_source: f64,
    pub verification_consensus: f64,
}

impl Default for AxisWeights {
    fn default() -> Self {
        Self {
            initial_review: defaults::DEFAULT_INITIAL_REVIEW_WEIGHT,
            unreviewed_start: defaults::DEFAULT_UNREVIEWED_START,
            per_expert: defaults::DEFAULT_PER_EXPERT_WEIGHT,
            per_community: defaults::DEFAULT_PER_COMMUNITY_WEIGHT,
            per_reviewer_cap: defaults::DEFAULT_PER_REVIEWER_CAP,
            per_external_source: defaults::DEFAULT_PER_SOURCE_WEIGHT,
            time_stability: defaults::DEFAULT_TIME_STABILITY_WEIGHT,
            consensus: defaults::DEFAULT_CONSENSUS_WEIGHT,
            verification_base: defaults::DEFAULT_VERIFICATION_BASE,
            verification_per_source: defaults::DEFAULT_VERIFICATION_PER_SOURCE,
            verification_consensus: defaults::DEFAULT_VERIFICATION_CONSENSUS,
        }
    }
}

/// Spatial index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Grid resolution per axis for precisely located tiles.
    pub cells_per_axis: u32,
    /// Fine cells per coarse bucket along each axis.
    pub coarse_factor: u32,
    /// Added to every coarse (low-certainty) distance.
    pub low_certainty_penalty: f64,
    /// Query point used when no keyword pins an axis.
    pub default_query_certainty: f64,
    pub default_query_verification: f64,
    pub weights: AxisWeights,
    pub domains: Vec<DomainSchema>,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            cells_per_axis: defaults::DEFAULT_CELLS_PER_AXIS,
            coarse_factor: defaults::DEFAULT_COARSE_FACTOR,
            low_certainty_penalty: defaults::DEFAULT_LOW_CERTAINTY_PENALTY,
            default_query_certainty: defaults::DEFAULT_QUERY_CERTAINTY,
            default_query_verification: defaults::DEFAULT_QUERY_VERIFICATION,
            weights: AxisWeights::default(),
            domains: vec![DomainSchema::default()],
        }
    }
}

impl SpatialConfig {
    pub fn domain(&self, code: &str) -> Option<&DomainSchema> {
        self.domains.iter().find(|d| d.code == code)
    }
}
