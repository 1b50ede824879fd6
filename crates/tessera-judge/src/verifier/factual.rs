//! Agreement of a candidate with the anchor facts of the retrieved tiles.

use std::sync::LazyLock;

use regex::Regex;

use tessera_core::config::Severity;
use tessera_core::tile::TileId;
use tessera_core::traits::ContextTile;

use super::consistency::sentences;
use super::{Dimension, Issue};

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d*\.\d+|\d+").unwrap());

/// Anchor facts taken from each tile.
pub const MAX_FACTS_PER_TILE: usize = 5;
/// Characters of a statement kept as a fact.
const MAX_FACT_CHARS: usize = 200;
/// Statements shorter than this are not facts.
const MIN_FACT_CHARS: usize = 10;
/// Fraction of a fact's keywords the candidate must contain to mention it.
const MENTION_RATIO: f64 = 0.5;
/// Relative deviation above which a figure contradicts the fact.
const NUMERIC_TOLERANCE: f64 = 0.1;

/// A checkable statement extracted from tile content.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorFact {
    pub tile_id: TileId,
    pub statement: String,
    pub has_numbers: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactualReport {
    /// `None` when no fact was mentioned; the caller substitutes its neutral score.
    pub score: Option<f64>,
    pub mentioned: usize,
    pub contradicted: usize,
    pub issues: Vec<Issue>,
}

/// Split tile content into up to [`MAX_FACTS_PER_TILE`] statements.
pub fn extract_anchor_facts(tile: &ContextTile) -> Vec<AnchorFact> {
    sentences(&tile.content)
        .filter(|s| s.chars().count() > MIN_FACT_CHARS && s.split_whitespace().count() >= 3)
        .take(MAX_FACTS_PER_TILE)
        .map(|s| {
            let statement: String = s.chars().take(MAX_FACT_CHARS).collect();
            AnchorFact {
                tile_id: tile.tile_id.clone(),
                has_numbers: NUMBER_RE.is_match(&statement),
                statement,
            }
        })
        .collect()
}

fn keywords(fact: &str) -> Vec<String> {
    fact.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| w.chars().count() > 2)
        .collect()
}

/// Whether more than half of the fact's keywords occur in the candidate.
pub fn is_mentioned(fact: &str, lowered_candidate: &str) -> bool {
    let keywords = keywords(fact);
    if keywords.is_empty() {
        return false;
    }
    let hits = keywords
        .iter()
        .filter(|k| lowered_candidate.contains(k.as_str()))
        .count();
    hits as f64 / keywords.len() as f64 > MENTION_RATIO
}

fn numbers(text: &str) -> Vec<f64> {
    NUMBER_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Whether every figure in the candidate deviates from the fact's first
/// figure by more than the tolerance. A candidate without figures does not
/// contradict.
pub fn contradicts_numerically(fact: &str, candidate: &str) -> bool {
    let Some(&expected) = numbers(fact).first() else {
        return false;
    };
    let found = numbers(candidate);
    if found.is_empty() {
        return false;
    }
    let scale = expected.abs().max(0.001);
    found
        .iter()
        .all(|v| (v - expected).abs() / scale > NUMERIC_TOLERANCE)
}

/// Check the candidate against every tile's anchor facts.
pub fn check(candidate: &str, context: &[ContextTile]) -> FactualReport {
    let lowered = candidate.to_lowercase();
    let mut mentioned = 0;
    let mut contradicted = 0;
    let mut issues = Vec::new();

    for fact in context.iter().flat_map(extract_anchor_facts) {
        if !is_mentioned(&fact.statement, &lowered) {
            continue;
        }
        mentioned += 1;
        if fact.has_numbers && contradicts_numerically(&fact.statement, candidate) {
            contradicted += 1;
            issues.push(Issue {
                dimension: Dimension::Factual,
                kind: "numerical_contradiction".to_string(),
                detail: format!("{} (tile {})", fact.statement, fact.tile_id),
                severity: Severity::High,
            });
        }
    }

    let score = (mentioned > 0).then(|| 1.0 - contradicted as f64 / mentioned as f64);
    FactualReport {
        score,
        mentioned,
        contradicted,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(id: &str, content: &str) -> ContextTile {
        ContextTile {
            tile_id: TileId::new(id),
            topic: "aspirin".into(),
            content: content.into(),
            certainty: 80.0,
        }
    }

    #[test]
    fn extracts_at_most_five_statements() {
        let content = (1..=8)
            .map(|i| format!("Statement number {i} is a fact"))
            .collect::<Vec<_>>()
            .join(". ");
        let facts = extract_anchor_facts(&tile("t", &content));
        assert_eq!(facts.len(), MAX_FACTS_PER_TILE);
        assert!(facts.iter().all(|f| f.has_numbers));
    }

    #[test]
    fn short_fragments_are_not_facts() {
        let facts = extract_anchor_facts(&tile("t", "Yes. No. Maybe so."));
        assert!(facts.is_empty());
    }

    #[test]
    fn mention_requires_majority_of_keywords() {
        let fact = "Aspirin irreversibly inhibits cyclooxygenase enzymes";
        assert!(is_mentioned(fact, "aspirin irreversibly inhibits platelets"));
        assert!(!is_mentioned(fact, "aspirin is a drug"));
    }

    #[test]
    fn numeric_deviation_over_ten_percent_contradicts() {
        let fact = "The usual adult dose is 300 mg";
        assert!(contradicts_numerically(fact, "The usual adult dose is 900 mg"));
        assert!(!contradicts_numerically(fact, "The usual adult dose is 320 mg"));
        assert!(!contradicts_numerically(fact, "The usual adult dose varies"));
        assert!(!contradicts_numerically("No figures here at all", "42"));
    }

    #[test]
    fn unmentioned_facts_yield_no_score() {
        let report = check(
            "Rest and fluids.",
            &[tile("t", "The usual adult dose of aspirin is 300 mg per day")],
        );
        assert_eq!(report.score, None);
        assert_eq!(report.mentioned, 0);
    }

    #[test]
    fn contradiction_lowers_score() {
        let context = [
            tile("a", "The usual adult dose of aspirin is 300 mg per day"),
            tile("b", "Aspirin irreversibly inhibits platelet cyclooxygenase"),
        ];
        let report = check(
            "The usual adult dose of aspirin is 900 mg per day. \
             Aspirin irreversibly inhibits platelet cyclooxygenase.",
            &context,
        );
        assert_eq!(report.mentioned, 2);
        assert_eq!(report.contradicted, 1);
        assert_eq!(report.score, Some(0.5));
        assert_eq!(report.issues[0].kind, "numerical_contradiction");
        assert!(report.issues[0].detail.contains("tile a"));
    }
}
