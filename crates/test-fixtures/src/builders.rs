//! Fluent builders for tiles in arbitrary states.

use chrono::{DateTime, Duration, TimeZone, Utc};

use tessera_core::tile::{
    AxisInputs, Confidence, Coordinates, KnowledgeTile, MarkKind, TileId, VerificationEvent,
    VerificationMark,
};

/// Builds a valid `KnowledgeTile` with deterministic defaults.
#[derive(Debug, Clone)]
pub struct TileBuilder {
    tile: KnowledgeTile,
}

/// Fixed instant used by builders so golden comparisons stay stable.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

impl TileBuilder {
    pub fn new(id: &str) -> Self {
        let now = fixed_now();
        Self {
            tile: KnowledgeTile {
                id: TileId::new(id),
                domain: "general".to_string(),
                topic: format!("topic {id}"),
                content: format!("Content of tile {id}."),
                tags: Vec::new(),
                coordinates: Coordinates::new(50.0, 100.0, 50.0),
                confidence: Confidence::default(),
                verification: VerificationMark::default(),
                verification_history: Vec::new(),
                axis_inputs: AxisInputs {
                    initial_certainty: 50.0,
                    ..AxisInputs::default()
                },
                contributor_id: None,
                version: 1,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.tile.domain = domain.to_string();
        self
    }

    pub fn topic(mut self, topic: &str) -> Self {
        self.tile.topic = topic.to_string();
        self
    }

    pub fn content(mut self, content: &str) -> Self {
        self.tile.content = content.to_string();
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tile.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn coordinates(mut self, certainty: f64, granularity: f64, verification: f64) -> Self {
        self.tile.coordinates = Coordinates::new(certainty, granularity, verification);
        self.tile.axis_inputs.initial_certainty = certainty;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.tile.confidence = Confidence::new(confidence);
        self
    }

    pub fn version(mut self, version: u64) -> Self {
        self.tile.version = version;
        self
    }

    pub fn contributor(mut self, contributor_id: &str) -> Self {
        self.tile.contributor_id = Some(contributor_id.to_string());
        self
    }

    pub fn external_sources(mut self, count: u32) -> Self {
        self.tile.axis_inputs.external_sources = count;
        self
    }

    /// Append a verification by a distinct reviewer and set the matching mark.
    pub fn verified_by(mut self, verifier_id: &str, is_expert: bool) -> Self {
        let at = self.tile.updated_at + Duration::minutes(1);
        self.tile.verification_history.push(VerificationEvent {
            verifier_id: verifier_id.to_string(),
            is_expert,
            verified_at: at,
        });
        let experts = self.tile.verification_history.iter().filter(|e| e.is_expert).count();
        let kind = match experts {
            0 => MarkKind::Community,
            1 => MarkKind::Expert,
            _ => MarkKind::MultiExpert,
        };
        self.tile.verification = VerificationMark {
            kind,
            verifier_count: self.tile.verification_history.len() as u32,
            last_verifier_id: Some(verifier_id.to_string()),
            last_verified_at: Some(at),
        };
        self.tile.updated_at = at;
        self
    }

    pub fn build(self) -> KnowledgeTile {
        self.tile
    }
}

/// `count` tiles in `domain` spread deterministically over the axis ranges.
pub fn spread_tiles(domain: &str, count: usize) -> Vec<KnowledgeTile> {
    (0..count)
        .map(|i| {
            let certainty = 31.0 + (i * 37 % 69) as f64;
            let granularity = 1.0 + (i * 113 % 999) as f64;
            let verification = (i * 53 % 101) as f64;
            TileBuilder::new(&format!("{domain}-{i:04}"))
                .domain(domain)
                .coordinates(certainty, granularity, verification)
                .build()
        })
        .collect()
}
