//! Mark derivation rules.

use std::collections::HashSet;

use tessera_core::config::MarksConfig;
use tessera_core::tile::{MarkKind, VerificationEvent};

/// Number of distinct verifiers in a history.
pub fn distinct_verifiers(history: &[VerificationEvent]) -> usize {
    history
        .iter()
        .map(|e| e.verifier_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// The highest mark a verification history justifies.
///
/// `multi_expert` needs `quorum` distinct experts, `expert` one, and
/// `community` any reviewer at all.
pub fn derive_mark(history: &[VerificationEvent], quorum: usize) -> MarkKind {
    let experts: HashSet<&str> = history
        .iter()
        .filter(|e| e.is_expert)
        .map(|e| e.verifier_id.as_str())
        .collect();
    match experts.len() {
        n if n >= quorum.max(2) => MarkKind::MultiExpert,
        n if n >= 1 => MarkKind::Expert,
        _ if !history.is_empty() => MarkKind::Community,
        _ => MarkKind::None,
    }
}

/// Minimum confidence a mark grants.
pub fn confidence_floor(kind: MarkKind, config: &MarksConfig) -> f64 {
    match kind {
        MarkKind::None => 0.0,
        MarkKind::Community => config.community_confidence,
        MarkKind::Expert => config.expert_confidence,
        MarkKind::MultiExpert => config.multi_expert_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(id: &str, is_expert: bool) -> VerificationEvent {
        VerificationEvent {
            verifier_id: id.to_string(),
            is_expert,
            verified_at: Utc::now(),
        }
    }

    #[test]
    fn empty_history_has_no_mark() {
        assert_eq!(derive_mark(&[], 2), MarkKind::None);
    }

    #[test]
    fn community_reviewers_never_reach_expert() {
        let history: Vec<_> = (0..10).map(|i| event(&format!("c{i}"), false)).collect();
        assert_eq!(derive_mark(&history, 2), MarkKind::Community);
    }

    #[test]
    fn expert_counts_are_distinct() {
        let history = vec![event("dr-a", true), event("dr-a", true), event("c1", false)];
        assert_eq!(derive_mark(&history, 2), MarkKind::Expert);
        assert_eq!(distinct_verifiers(&history), 2);
    }

    #[test]
    fn quorum_of_distinct_experts_is_multi_expert() {
        let history = vec![event("dr-a", true), event("dr-b", true)];
        assert_eq!(derive_mark(&history, 2), MarkKind::MultiExpert);
        assert_eq!(derive_mark(&history, 3), MarkKind::Expert);
    }

    #[test]
    fn floors_follow_configuration() {
        let config = MarksConfig::default();
        assert_eq!(confidence_floor(MarkKind::None, &config), 0.0);
        assert_eq!(confidence_floor(MarkKind::Community, &config), 0.7);
        assert_eq!(confidence_floor(MarkKind::Expert, &config), 0.9);
        assert_eq!(confidence_floor(MarkKind::MultiExpert, &config), 0.95);
    }
}
