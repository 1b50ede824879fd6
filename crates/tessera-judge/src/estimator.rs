//! Heuristic question complexity and domain fit.

use std::sync::LazyLock;

use regex::Regex;

use tessera_core::config::DomainSchema;
use tessera_core::traits::{ComplexityEstimate, IComplexityEstimator};

static COMPARISON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(compare[ds]?|comparison|versus|vs\.?|difference|differ|better|worse|rather than|more than|less than|trade-?offs?)\b")
        .unwrap()
});

static CAUSAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(why|because|cause[ds]?|effects?|leads? to|results? in|mechanism|due to|consequences?|implications?)\b")
        .unwrap()
});

static CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[,;:]|\b(and|but|while|whereas|although|if|when|unless)\b").unwrap()
});

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(\.\d+)?").unwrap());

/// Words at which the length signal saturates.
const LENGTH_SATURATION: f64 = 60.0;
const CLAUSE_SATURATION: f64 = 4.0;
const MARKER_SATURATION: f64 = 2.0;
const NUMBER_SATURATION: f64 = 3.0;

const LENGTH_WEIGHT: f64 = 0.35;
const CLAUSE_WEIGHT: f64 = 0.2;
const MARKER_WEIGHT: f64 = 0.3;
const NUMBER_WEIGHT: f64 = 0.15;

/// Keyword hits at which `domain_fit` reaches 1.
const FIT_SATURATION: f64 = 2.0;

/// Default estimator: length, clause count, comparison/causal markers and
/// numeric tokens, each saturating and weighted.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicComplexityEstimator;

impl HeuristicComplexityEstimator {
    pub fn new() -> Self {
        Self
    }
}

fn saturate(count: usize, at: f64) -> f64 {
    (count as f64 / at).min(1.0)
}

impl IComplexityEstimator for HeuristicComplexityEstimator {
    fn estimate(&self, question: &str, domain: &DomainSchema) -> ComplexityEstimate {
        let words = question.split_whitespace().count();
        if words == 0 {
            return ComplexityEstimate {
                complexity: 0.0,
                domain_fit: 0.0,
            };
        }

        let clauses = CLAUSE_RE.find_iter(question).count();
        let markers =
            COMPARISON_RE.find_iter(question).count() + CAUSAL_RE.find_iter(question).count();
        let numbers = NUMBER_RE.find_iter(question).count();

        let complexity = LENGTH_WEIGHT * saturate(words, LENGTH_SATURATION)
            + CLAUSE_WEIGHT * saturate(clauses, CLAUSE_SATURATION)
            + MARKER_WEIGHT * saturate(markers, MARKER_SATURATION)
            + NUMBER_WEIGHT * saturate(numbers, NUMBER_SATURATION);

        let lowered = question.to_lowercase();
        let hits = domain
            .keyword_map
            .keys()
            .filter(|k| lowered.contains(&k.to_lowercase()))
            .count();

        ComplexityEstimate {
            complexity: complexity.clamp(0.0, 1.0),
            domain_fit: saturate(hits, FIT_SATURATION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::config::KeywordHint;
    use tessera_core::tile::Axis;

    fn schema() -> DomainSchema {
        let mut schema = DomainSchema::new("medical");
        schema.keyword_map.insert(
            "guideline".into(),
            KeywordHint {
                axis: Axis::Certainty,
                value: 85.0,
            },
        );
        schema.keyword_map.insert(
            "overview".into(),
            KeywordHint {
                axis: Axis::Granularity,
                value: 120.0,
            },
        );
        schema
    }

    #[test]
    fn empty_question_is_trivial() {
        let e = HeuristicComplexityEstimator.estimate("   ", &schema());
        assert_eq!(e.complexity, 0.0);
        assert_eq!(e.domain_fit, 0.0);
    }

    #[test]
    fn short_lookup_is_simple() {
        let e = HeuristicComplexityEstimator.estimate("What is aspirin?", &schema());
        assert!(e.complexity < 0.2, "got {}", e.complexity);
    }

    #[test]
    fn comparative_causal_question_is_complex() {
        let q = "Why does drug A lead to fewer relapses than drug B in patients over 65, \
                 and how do the side effects compare when the dose exceeds 200 mg, \
                 given that renal function differs between the two cohorts?";
        let e = HeuristicComplexityEstimator.estimate(q, &schema());
        assert!(e.complexity >= 0.5, "got {}", e.complexity);
        assert!(e.complexity <= 1.0);
    }

    #[test]
    fn domain_fit_counts_keyword_hits() {
        let none = HeuristicComplexityEstimator.estimate("What is aspirin?", &schema());
        let one = HeuristicComplexityEstimator.estimate("Guideline for aspirin?", &schema());
        let two =
            HeuristicComplexityEstimator.estimate("Guideline overview for aspirin?", &schema());
        assert_eq!(none.domain_fit, 0.0);
        assert!((one.domain_fit - 0.5).abs() < 1e-9);
        assert!((two.domain_fit - 1.0).abs() < 1e-9);
    }
}
