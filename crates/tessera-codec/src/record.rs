//! Versioned on-disk record types.
//!
//! A record is the serde shape of a tile body. New schema versions add a new
//! record type and a dispatch arm in `payload`; fields added inside a version
//! must be optional with a default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tessera_core::tile::{
    AxisInputs, Confidence, Coordinates, KnowledgeTile, MarkKind, TileId, VerificationEvent,
    VerificationMark,
};

/// Schema version 1 tile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRecordV1 {
    pub id: String,
    pub domain: String,
    #[serde(default)]
    pub topic: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub coordinates: Coordinates,
    pub confidence: f64,
    pub mark: MarkKind,
    #[serde(default)]
    pub verifier_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verifier_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_history: Vec<VerificationEvent>,
    #[serde(default)]
    pub axis_inputs: AxisInputs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor_id: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&KnowledgeTile> for TileRecordV1 {
    fn from(tile: &KnowledgeTile) -> Self {
        Self {
            id: tile.id.to_string(),
            domain: tile.domain.clone(),
            topic: tile.topic.clone(),
            content: tile.content.clone(),
            tags: tile.tags.clone(),
            coordinates: tile.coordinates,
            confidence: tile.confidence.value(),
            mark: tile.verification.kind,
            verifier_count: tile.verification.verifier_count,
            last_verifier_id: tile.verification.last_verifier_id.clone(),
            last_verified_at: tile.verification.last_verified_at,
            verification_history: tile.verification_history.clone(),
            axis_inputs: tile.axis_inputs.clone(),
            contributor_id: tile.contributor_id.clone(),
            version: tile.version,
            created_at: tile.created_at,
            updated_at: tile.updated_at,
        }
    }
}

impl From<TileRecordV1> for KnowledgeTile {
    fn from(record: TileRecordV1) -> Self {
        Self {
            id: TileId::new(record.id),
            domain: record.domain,
            topic: record.topic,
            content: record.content,
            tags: record.tags,
            coordinates: record.coordinates,
            confidence: Confidence::new(record.confidence),
            verification: VerificationMark {
                kind: record.mark,
                verifier_count: record.verifier_count,
                last_verifier_id: record.last_verifier_id,
                last_verified_at: record.last_verified_at,
            },
            verification_history: record.verification_history,
            axis_inputs: record.axis_inputs,
            contributor_id: record.contributor_id,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_record_fills_optional_fields_with_defaults() {
        let json = r#"{
            "id": "t-1",
            "domain": "general",
            "content": "water boils at 100 C at sea level",
            "coordinates": {"certainty": 40.0, "granularity": 280.0, "verification": 50.0},
            "confidence": 0.5,
            "mark": "none",
            "version": 1,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }"#;
        let record: TileRecordV1 = serde_json::from_str(json).unwrap();
        let tile = KnowledgeTile::from(record);
        assert!(tile.tags.is_empty());
        assert!(tile.contributor_id.is_none());
        assert!(tile.verification_history.is_empty());
        assert_eq!(tile.axis_inputs, AxisInputs::default());
        assert_eq!(tile.verification.verifier_count, 0);
    }
}
