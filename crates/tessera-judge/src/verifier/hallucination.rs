//! Hallucination risk of an advanced-lane candidate relative to its context.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use tessera_core::traits::ContextTile;

static UNCERTAINTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(may|might|could|possibly|probably|likely|unlikely|uncertain|approximately|about|around|suggests?|generally|typically|often|usually)\b")
        .unwrap()
});

const FACTUAL_FAILED: f64 = 0.5;
const CONSISTENCY_FAILED: f64 = 0.3;
const RISKY_CLAIMS: f64 = 0.2;
const LOW_SELF_CONFIDENCE: f64 = 0.1;
const NO_UNCERTAINTY_MARKERS: f64 = 0.05;
const NO_TILE_CITED: f64 = 0.1;
/// Provider self-confidence below which the candidate is penalized.
const SELF_CONFIDENCE_FLOOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.1 {
            Self::VeryLow
        } else if score < 0.3 {
            Self::Low
        } else if score < 0.6 {
            Self::Moderate
        } else if score < 0.8 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HallucinationRisk {
    /// In [0, 1].
    pub score: f64,
    pub level: RiskLevel,
}

/// Inputs to the risk estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSignals {
    pub factual_passed: bool,
    pub consistency_passed: bool,
    pub risky_claims: bool,
    pub self_confidence: Option<f64>,
    pub uncertainty_markers: bool,
    pub cites_context: bool,
}

pub fn has_uncertainty_markers(candidate: &str) -> bool {
    UNCERTAINTY_RE.is_match(candidate)
}

/// Whether the candidate names any context tile by id or topic, or mentions
/// one of its facts.
pub fn cites_context(candidate: &str, context: &[ContextTile], facts_mentioned: usize) -> bool {
    if facts_mentioned > 0 {
        return true;
    }
    let lowered = candidate.to_lowercase();
    context.iter().any(|tile| {
        lowered.contains(&tile.tile_id.as_str().to_lowercase())
            || (!tile.topic.trim().is_empty() && lowered.contains(&tile.topic.to_lowercase()))
    })
}

pub fn assess(signals: RiskSignals) -> HallucinationRisk {
    let mut score = 0.0;
    if !signals.factual_passed {
        score += FACTUAL_FAILED;
    }
    if !signals.consistency_passed {
        score += CONSISTENCY_FAILED;
    }
    if signals.risky_claims {
        score += RISKY_CLAIMS;
    }
    if signals
        .self_confidence
        .is_some_and(|c| c < SELF_CONFIDENCE_FLOOR)
    {
        score += LOW_SELF_CONFIDENCE;
    }
    if !signals.uncertainty_markers {
        score += NO_UNCERTAINTY_MARKERS;
    }
    if !signals.cites_context {
        score += NO_TILE_CITED;
    }
    let score: f64 = score.min(1.0);
    HallucinationRisk {
        score,
        level: RiskLevel::from_score(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean() -> RiskSignals {
        RiskSignals {
            factual_passed: true,
            consistency_passed: true,
            risky_claims: false,
            self_confidence: Some(0.9),
            uncertainty_markers: true,
            cites_context: true,
        }
    }

    #[test]
    fn clean_candidate_is_very_low() {
        let risk = assess(clean());
        assert_eq!(risk.score, 0.0);
        assert_eq!(risk.level, RiskLevel::VeryLow);
    }

    #[test]
    fn failed_facts_without_citation() {
        let risk = assess(RiskSignals {
            factual_passed: false,
            uncertainty_markers: false,
            cites_context: false,
            ..clean()
        });
        assert!((risk.score - 0.65).abs() < 1e-9);
        assert_eq!(risk.level, RiskLevel::High);
    }

    #[test]
    fn everything_wrong_caps_at_one() {
        let risk = assess(RiskSignals {
            factual_passed: false,
            consistency_passed: false,
            risky_claims: true,
            self_confidence: Some(0.1),
            uncertainty_markers: false,
            cites_context: false,
        });
        assert_eq!(risk.score, 1.0);
        assert_eq!(risk.level, RiskLevel::VeryHigh);
    }

    #[test]
    fn missing_self_confidence_is_not_penalized() {
        let risk = assess(RiskSignals {
            self_confidence: None,
            ..clean()
        });
        assert_eq!(risk.score, 0.0);
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(RiskLevel::from_score(0.05), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_score(0.1), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.3), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0.6), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.8), RiskLevel::VeryHigh);
    }

    #[test]
    fn citation_by_topic() {
        let context = [ContextTile {
            tile_id: "med-001".into(),
            topic: "Beta blockers".into(),
            content: String::new(),
            certainty: 70.0,
        }];
        assert!(cites_context("beta blockers lower heart rate", &context, 0));
        assert!(cites_context("see MED-001", &context, 0));
        assert!(!cites_context("rest helps", &context, 0));
    }
}
