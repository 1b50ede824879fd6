//! Internal coherence of a candidate answer. Needs no tile content.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use tessera_core::config::{DomainSchema, RiskyPattern, Severity};

use super::{Dimension, Issue};

static NEGATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(not|no|never|cannot|can't|doesn't|don't|isn't|aren't|won't|wasn't|weren't)\b")
        .unwrap()
});

static FALSE_DICHOTOMY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(only two (options|choices|possibilities|outcomes)|no other (option|choice|alternative)s?|either\b[^.!?]{1,80}\bor nothing)\b",
    )
    .unwrap()
});

static ABSOLUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(always|guaranteed|certainly|without exception|in all cases|impossible|every single)\b|\b100\s?%",
    )
    .unwrap()
});

const EMPTY_ANSWER_SCORE: f64 = 0.0;
const SELF_NEGATION_PENALTY: f64 = 0.4;
const FALSE_DICHOTOMY_PENALTY: f64 = 0.2;
const ABSOLUTE_CLAIM_PENALTY: f64 = 0.05;
const ABSOLUTE_CLAIM_CAP: f64 = 0.2;
const REPEATED_SENTENCE_PENALTY: f64 = 0.15;
/// Sentences shorter than this are not checked for repetition.
const MIN_REPEAT_WORDS: usize = 4;

fn risky_penalty(severity: Severity) -> f64 {
    match severity {
        Severity::Moderate => 0.2,
        Severity::High => 0.35,
        Severity::Critical => 0.6,
    }
}

/// A domain's risky-claim patterns, compiled case-insensitively.
#[derive(Debug, Clone)]
pub struct RiskyPatterns {
    source: Vec<RiskyPattern>,
    compiled: Vec<(Regex, RiskyPattern)>,
}

impl RiskyPatterns {
    /// Invalid patterns are skipped with a warning.
    pub fn compile(patterns: &[RiskyPattern]) -> Self {
        let compiled = patterns
            .iter()
            .filter_map(|pattern| {
                match RegexBuilder::new(&pattern.pattern)
                    .case_insensitive(true)
                    .build()
                {
                    Ok(re) => Some((re, pattern.clone())),
                    Err(_) => {
                        tracing::warn!(pattern = %pattern.pattern, "skipping invalid risky pattern");
                        None
                    }
                }
            })
            .collect();
        Self {
            source: patterns.to_vec(),
            compiled,
        }
    }

    /// Whether these were compiled from exactly `patterns`.
    pub fn compiled_from(&self, patterns: &[RiskyPattern]) -> bool {
        self.source == patterns
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

/// Result of the consistency check.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencyReport {
    /// In [0, 1].
    pub score: f64,
    pub issues: Vec<Issue>,
    /// Whether any domain risky-claim pattern matched.
    pub risky_claims: bool,
}

pub(crate) fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn normalize(sentence: &str) -> String {
    sentence
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sentence with its negation words removed, plus whether it had any.
fn polarity(sentence: &str) -> (String, bool) {
    let negated = NEGATION_RE.is_match(sentence);
    let core = NEGATION_RE.replace_all(sentence, " ");
    (normalize(&core), negated)
}

fn issue(kind: &str, detail: impl Into<String>, severity: Severity) -> Issue {
    Issue {
        dimension: Dimension::Consistency,
        kind: kind.to_string(),
        detail: detail.into(),
        severity,
    }
}

/// Score a candidate's internal coherence against the domain's risky patterns.
pub fn check(text: &str, schema: &DomainSchema) -> ConsistencyReport {
    check_with(text, &RiskyPatterns::compile(&schema.risky_patterns))
}

/// As [`check`], with the domain's patterns already compiled.
pub fn check_with(text: &str, risky: &RiskyPatterns) -> ConsistencyReport {
    if text.trim().is_empty() {
        return ConsistencyReport {
            score: EMPTY_ANSWER_SCORE,
            issues: vec![issue("empty_answer", "the answer is empty", Severity::Critical)],
            risky_claims: false,
        };
    }

    let mut penalty = 0.0;
    let mut issues = Vec::new();

    // Same statement asserted and negated.
    let mut polarities: HashMap<String, (bool, bool, &str)> = HashMap::new();
    for sentence in sentences(text) {
        let (core, negated) = polarity(sentence);
        if core.is_empty() {
            continue;
        }
        let entry = polarities.entry(core).or_insert((false, false, sentence));
        if negated {
            entry.1 = true;
        } else {
            entry.0 = true;
        }
    }
    let mut negations: Vec<&str> = polarities
        .values()
        .filter(|(pos, neg, _)| *pos && *neg)
        .map(|(_, _, s)| *s)
        .collect();
    negations.sort_unstable();
    for sentence in negations {
        penalty += SELF_NEGATION_PENALTY;
        issues.push(issue(
            "self_negation",
            format!("asserts and negates: \"{sentence}\""),
            Severity::High,
        ));
    }

    if let Some(m) = FALSE_DICHOTOMY_RE.find(text) {
        penalty += FALSE_DICHOTOMY_PENALTY;
        issues.push(issue("false_dichotomy", m.as_str(), Severity::Moderate));
    }

    let absolutes: Vec<&str> = ABSOLUTE_RE.find_iter(text).map(|m| m.as_str()).collect();
    if !absolutes.is_empty() {
        penalty += (ABSOLUTE_CLAIM_PENALTY * absolutes.len() as f64).min(ABSOLUTE_CLAIM_CAP);
        issues.push(issue(
            "absolute_claim",
            absolutes.join(", "),
            Severity::Moderate,
        ));
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    for sentence in sentences(text) {
        let normalized = normalize(sentence);
        if normalized.split(' ').count() < MIN_REPEAT_WORDS {
            continue;
        }
        let count = seen.entry(normalized).or_insert(0);
        *count += 1;
        if *count == 2 {
            penalty += REPEATED_SENTENCE_PENALTY;
            issues.push(issue(
                "repeated_sentence",
                sentence.to_string(),
                Severity::Moderate,
            ));
        }
    }

    let mut risky_claims = false;
    for (re, pattern) in &risky.compiled {
        if let Some(m) = re.find(text) {
            risky_claims = true;
            penalty += risky_penalty(pattern.severity);
            issues.push(issue(
                &pattern.claim_type,
                format!("risky claim: \"{}\"", m.as_str()),
                pattern.severity,
            ));
        }
    }

    ConsistencyReport {
        score: (1.0 - penalty).clamp(0.0, 1.0),
        issues,
        risky_claims,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medical() -> DomainSchema {
        let mut schema = DomainSchema::new("medical");
        schema.risky_patterns.push(RiskyPattern {
            pattern: "no side effects".into(),
            claim_type: "safety_claim".into(),
            severity: Severity::Critical,
        });
        schema
    }

    #[test]
    fn coherent_answer_scores_full() {
        let r = check(
            "Aspirin inhibits platelet aggregation. It may cause stomach irritation.",
            &medical(),
        );
        assert_eq!(r.score, 1.0);
        assert!(r.issues.is_empty());
        assert!(!r.risky_claims);
    }

    #[test]
    fn empty_answer_scores_zero() {
        let r = check("  \n ", &medical());
        assert_eq!(r.score, 0.0);
        assert_eq!(r.issues[0].kind, "empty_answer");
    }

    #[test]
    fn self_negation_detected() {
        let r = check(
            "Aspirin is safe in pregnancy. Aspirin is not safe in pregnancy.",
            &medical(),
        );
        assert!(r.issues.iter().any(|i| i.kind == "self_negation"));
        assert!((r.score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn false_dichotomy_detected() {
        let r = check("There are only two options here: surgery or death.", &medical());
        assert!(r.issues.iter().any(|i| i.kind == "false_dichotomy"));
    }

    #[test]
    fn absolute_claims_are_capped() {
        let r = check(
            "It always works. It is guaranteed. Failure is impossible. It works 100% of the time. \
             Certainly the best. In all cases effective.",
            &medical(),
        );
        let absolute = r.issues.iter().find(|i| i.kind == "absolute_claim");
        assert!(absolute.is_some());
        assert!((r.score - (1.0 - ABSOLUTE_CLAIM_CAP)).abs() < 1e-9);
    }

    #[test]
    fn repeated_sentence_detected_once() {
        let r = check(
            "Rest and fluids help recovery. Rest and fluids help recovery. Rest and fluids help recovery.",
            &medical(),
        );
        let repeats = r.issues.iter().filter(|i| i.kind == "repeated_sentence").count();
        assert_eq!(repeats, 1);
    }

    #[test]
    fn risky_pattern_flags_and_penalizes() {
        let r = check("This drug has No Side Effects at all.", &medical());
        assert!(r.risky_claims);
        assert_eq!(r.issues[0].kind, "safety_claim");
        assert_eq!(r.issues[0].severity, Severity::Critical);
        assert!((r.score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn invalid_patterns_are_dropped_at_compile_time() {
        let mut schema = medical();
        schema.risky_patterns.push(RiskyPattern {
            pattern: "(unclosed".into(),
            claim_type: "broken".into(),
            severity: Severity::High,
        });
        let risky = RiskyPatterns::compile(&schema.risky_patterns);
        assert_eq!(risky.len(), 1);
        assert!(risky.compiled_from(&schema.risky_patterns));
        assert!(!risky.compiled_from(&medical().risky_patterns));

        let r = check_with("No side effects (unclosed", &risky);
        assert_eq!(r.issues.len(), 1);
        assert_eq!(r.issues[0].kind, "safety_claim");
    }
}
