use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::Confidence;
use super::coordinates::Coordinates;
use super::id::TileId;
use super::mark::{VerificationEvent, VerificationMark};
use crate::errors::{TesseraError, TesseraResult};

/// Inputs the coordinate scorer recomputes from. Stored with the tile so that a
/// recompute never depends on the previously stored coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisInputs {
    /// Certainty start value assigned at creation.
    pub initial_certainty: f64,
    /// Whether the tile passed an initial review when it was created.
    pub initial_review: bool,
    /// Number of external sources backing the content.
    pub external_sources: u32,
    /// Temporal stability bonus factor in [0, 1].
    pub time_stability: f64,
}

impl Default for AxisInputs {
    fn default() -> Self {
        Self {
            initial_certainty: 0.0,
            initial_review: false,
            external_sources: 0,
            time_stability: 0.0,
        }
    }
}

/// The atomic stored unit of domain knowledge.
///
/// Owned exclusively by the container store; other components refer to it by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeTile {
    pub id: TileId,
    pub domain: String,
    pub topic: String,
    pub content: String,
    /// Ordered set: insertion order preserved, no duplicates.
    pub tags: Vec<String>,
    pub coordinates: Coordinates,
    pub confidence: Confidence,
    pub verification: VerificationMark,
    /// Distinct-reviewer history, oldest first.
    pub verification_history: Vec<VerificationEvent>,
    pub axis_inputs: AxisInputs,
    pub contributor_id: Option<String>,
    /// Starts at 1, bumped by exactly one on every successful update.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a tile that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTile {
    /// Explicit id; generated when absent.
    pub id: Option<TileId>,
    pub domain: String,
    pub topic: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Explicit certainty start value; derived from `initial_review` when absent.
    pub certainty: Option<f64>,
    /// Explicit granularity; derived from content length when absent.
    pub granularity: Option<f64>,
    pub initial_review: bool,
    pub external_sources: u32,
    pub time_stability: f64,
    pub confidence: Option<f64>,
    pub contributor_id: Option<String>,
}

impl KnowledgeTile {
    /// Build a version-1 tile from a draft and its computed coordinates.
    pub fn from_new(
        new: NewTile,
        coordinates: Coordinates,
        initial_certainty: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new.id.unwrap_or_else(TileId::generate),
            domain: new.domain,
            topic: new.topic,
            content: new.content,
            tags: Self::normalize_tags(new.tags),
            coordinates,
            confidence: new.confidence.map(Confidence::new).unwrap_or_default(),
            verification: VerificationMark::default(),
            verification_history: Vec::new(),
            axis_inputs: AxisInputs {
                initial_certainty,
                initial_review: new.initial_review,
                external_sources: new.external_sources,
                time_stability: new.time_stability.clamp(0.0, 1.0),
            },
            contributor_id: new.contributor_id,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Deduplicate tags while keeping first-seen order. Blank tags are dropped.
    pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        tags.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect()
    }

    /// Number of whitespace-separated words in the content.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// blake3 hash of the content, hex encoded.
    pub fn content_hash(&self) -> String {
        blake3::hash(self.content.as_bytes()).to_hex().to_string()
    }

    /// Distinct expert reviewer ids, in history order.
    pub fn expert_ids(&self) -> Vec<&str> {
        self.verification_history
            .iter()
            .filter(|e| e.is_expert)
            .map(|e| e.verifier_id.as_str())
            .collect()
    }

    /// Whether `verifier_id` already appears in the verification history.
    pub fn has_verifier(&self, verifier_id: &str) -> bool {
        self.verification_history
            .iter()
            .any(|e| e.verifier_id == verifier_id)
    }

    /// Check structural invariants that do not depend on domain configuration.
    pub fn validate(&self) -> TesseraResult<()> {
        let invalid = |reason: &str| TesseraError::InvalidTile {
            id: self.id.to_string(),
            reason: reason.to_string(),
        };
        if self.id.as_str().is_empty() {
            return Err(invalid("empty id"));
        }
        if self.id.as_str().len() > crate::constants::MAX_TILE_ID_LEN {
            return Err(invalid("id too long"));
        }
        if self.domain.trim().is_empty() {
            return Err(invalid("empty domain"));
        }
        if self.version == 0 {
            return Err(invalid("version must start at 1"));
        }
        if !self.coordinates.is_finite() {
            return Err(invalid("non-finite coordinate"));
        }
        let distinct: HashSet<&str> = self
            .verification_history
            .iter()
            .map(|e| e.verifier_id.as_str())
            .collect();
        if distinct.len() != self.verification_history.len() {
            return Err(invalid("duplicate verifier in history"));
        }
        Ok(())
    }
}
