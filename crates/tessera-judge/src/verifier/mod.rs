//! Candidate verification.
//!
//! The basic lane scores consistency only. The advanced lane adds a factual
//! score against the retrieved tiles, combines both into a confidence, and
//! estimates hallucination risk.

pub mod consistency;
pub mod factual;
pub mod hallucination;

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use tessera_core::config::{DomainSchema, JudgeConfig, Severity};
use tessera_core::traits::ContextTile;

pub use consistency::RiskyPatterns;
pub use hallucination::{HallucinationRisk, RiskLevel, RiskSignals};

use crate::result::Lane;

/// Verification dimension a problem is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Factual,
    Consistency,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Factual => "factual",
            Self::Consistency => "consistency",
        }
    }
}

/// One problem found in a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub dimension: Dimension,
    pub kind: String,
    pub detail: String,
    pub severity: Severity,
}

/// Scores and verdict for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub lane: Lane,
    pub factual: Option<f64>,
    pub consistency: f64,
    /// In [0, 1].
    pub confidence: f64,
    pub risk: Option<HallucinationRisk>,
    pub issues: Vec<Issue>,
    /// Dimensions to address on correction. Empty when passed.
    pub failed: Vec<Dimension>,
    pub passed: bool,
}

impl Verification {
    pub fn issues_for(&self, dimension: Dimension) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.dimension == dimension)
    }

    pub fn score_for(&self, dimension: Dimension) -> Option<f64> {
        match dimension {
            Dimension::Factual => self.factual,
            Dimension::Consistency => Some(self.consistency),
        }
    }
}

/// Applies the configured thresholds to the individual checks.
///
/// Risky-claim patterns are compiled on first use per domain code and
/// recompiled only when that domain's pattern list changes.
#[derive(Debug, Clone)]
pub struct Verifier {
    config: JudgeConfig,
    risky: DashMap<String, Arc<RiskyPatterns>>,
}

impl Verifier {
    pub fn new(config: JudgeConfig) -> Self {
        Self {
            config,
            risky: DashMap::new(),
        }
    }

    /// Compiled risky patterns for `schema`.
    pub fn risky_patterns(&self, schema: &DomainSchema) -> Arc<RiskyPatterns> {
        if let Some(cached) = self.risky.get(&schema.code) {
            if cached.compiled_from(&schema.risky_patterns) {
                return cached.value().clone();
            }
        }
        let compiled = Arc::new(RiskyPatterns::compile(&schema.risky_patterns));
        self.risky.insert(schema.code.clone(), Arc::clone(&compiled));
        compiled
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    pub fn verify(
        &self,
        lane: Lane,
        candidate: &str,
        schema: &DomainSchema,
        context: &[ContextTile],
        self_confidence: Option<f64>,
    ) -> Verification {
        match lane {
            Lane::Basic => self.verify_basic(candidate, schema),
            Lane::Advanced => self.verify_advanced(candidate, schema, context, self_confidence),
        }
    }

    pub fn verify_basic(&self, candidate: &str, schema: &DomainSchema) -> Verification {
        let report = consistency::check_with(candidate, &self.risky_patterns(schema));
        let confidence = report.score.clamp(0.0, 1.0);
        let passed = report.score >= self.config.min_consistency
            && confidence >= self.config.pass_threshold;
        Verification {
            lane: Lane::Basic,
            factual: None,
            consistency: report.score,
            confidence,
            risk: None,
            issues: report.issues,
            failed: if passed {
                Vec::new()
            } else {
                vec![Dimension::Consistency]
            },
            passed,
        }
    }

    pub fn verify_advanced(
        &self,
        candidate: &str,
        schema: &DomainSchema,
        context: &[ContextTile],
        self_confidence: Option<f64>,
    ) -> Verification {
        let consistency_report =
            consistency::check_with(candidate, &self.risky_patterns(schema));
        let factual_report = factual::check(candidate, context);
        let factual = factual_report.score.unwrap_or(self.config.neutral_factual);
        let consistency = consistency_report.score;

        let confidence = (self.config.factual_weight * factual
            + self.config.consistency_weight * consistency)
            .clamp(0.0, 1.0);

        let factual_ok = factual >= self.config.min_factual;
        let consistency_ok = consistency >= self.config.min_consistency;

        let risk = hallucination::assess(RiskSignals {
            factual_passed: factual_ok,
            consistency_passed: consistency_ok,
            risky_claims: consistency_report.risky_claims,
            self_confidence,
            uncertainty_markers: hallucination::has_uncertainty_markers(candidate),
            cites_context: hallucination::cites_context(
                candidate,
                context,
                factual_report.mentioned,
            ),
        });
        let risk_ok = risk.score < self.config.max_hallucination_risk;

        let passed =
            factual_ok && consistency_ok && risk_ok && confidence >= self.config.pass_threshold;

        let mut failed = Vec::new();
        if !passed {
            if !factual_ok || !risk_ok {
                failed.push(Dimension::Factual);
            }
            if !consistency_ok {
                failed.push(Dimension::Consistency);
            }
            if failed.is_empty() {
                // Each dimension cleared its floor but the blend did not.
                failed.push(if factual <= consistency {
                    Dimension::Factual
                } else {
                    Dimension::Consistency
                });
            }
        }

        let mut issues = factual_report.issues;
        issues.extend(consistency_report.issues);

        Verification {
            lane: Lane::Advanced,
            factual: Some(factual),
            consistency,
            confidence,
            risk: Some(risk),
            issues,
            failed,
            passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::config::RiskyPattern;
    use tessera_core::tile::TileId;

    fn context() -> Vec<ContextTile> {
        vec![ContextTile {
            tile_id: TileId::new("med-aspirin"),
            topic: "aspirin dosing".into(),
            content: "The usual adult dose of aspirin is 300 mg per day.".into(),
            certainty: 80.0,
        }]
    }

    fn verifier() -> Verifier {
        Verifier::new(JudgeConfig::default())
    }

    #[test]
    fn basic_lane_uses_consistency_only() {
        let v = verifier().verify_basic("Aspirin relieves mild pain.", &DomainSchema::default());
        assert!(v.passed);
        assert_eq!(v.factual, None);
        assert_eq!(v.confidence, v.consistency);
        assert!(v.risk.is_none());
    }

    #[test]
    fn basic_lane_fails_on_empty_answer() {
        let v = verifier().verify_basic("", &DomainSchema::default());
        assert!(!v.passed);
        assert_eq!(v.failed, vec![Dimension::Consistency]);
        assert_eq!(v.confidence, 0.0);
    }

    #[test]
    fn advanced_lane_passes_agreeing_answer() {
        let v = verifier().verify_advanced(
            "The usual adult dose of aspirin is 300 mg per day, though it may vary.",
            &DomainSchema::default(),
            &context(),
            None,
        );
        assert!(v.passed, "{v:?}");
        assert_eq!(v.factual, Some(1.0));
        assert_eq!(v.confidence, 1.0);
        assert_eq!(v.risk.map(|r| r.level), Some(RiskLevel::VeryLow));
    }

    #[test]
    fn advanced_lane_fails_contradicting_answer() {
        let v = verifier().verify_advanced(
            "The usual adult dose of aspirin is 900 mg per day.",
            &DomainSchema::default(),
            &context(),
            None,
        );
        assert!(!v.passed);
        assert_eq!(v.factual, Some(0.0));
        assert!((v.confidence - 0.4).abs() < 1e-9);
        assert_eq!(v.failed, vec![Dimension::Factual]);
        assert_eq!(v.issues_for(Dimension::Factual).count(), 1);
    }

    #[test]
    fn unmentioned_context_scores_neutral() {
        let v = verifier().verify_advanced(
            "Rest and fluids usually help.",
            &DomainSchema::default(),
            &context(),
            None,
        );
        assert_eq!(v.factual, Some(JudgeConfig::default().neutral_factual));
        assert!(v.confidence >= 0.0 && v.confidence <= 1.0);
    }

    #[test]
    fn risky_patterns_compile_once_per_domain() {
        let verifier = verifier();
        let mut schema = DomainSchema::new("medical");
        schema.risky_patterns.push(RiskyPattern {
            pattern: "no side effects".into(),
            claim_type: "safety_claim".into(),
            severity: Severity::Critical,
        });
        let first = verifier.risky_patterns(&schema);
        let again = verifier.risky_patterns(&schema);
        assert!(Arc::ptr_eq(&first, &again));

        schema.risky_patterns.push(RiskyPattern {
            pattern: "cures".into(),
            claim_type: "efficacy_claim".into(),
            severity: Severity::High,
        });
        let changed = verifier.risky_patterns(&schema);
        assert!(!Arc::ptr_eq(&first, &changed));
        assert_eq!(changed.len(), 2);

        let v = verifier.verify_basic("It cures everything.", &schema);
        assert!(v.issues.iter().any(|i| i.kind == "efficacy_claim"));
    }
}
