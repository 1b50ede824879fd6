//! Corrective instructions for the next generation attempt.

use std::fmt::Write;

use crate::verifier::{Dimension, Verification};

/// Issues listed per failed dimension.
pub const MAX_ISSUES_PER_DIMENSION: usize = 2;

/// Describe what failed in `verification` so the provider can fix it.
pub fn build_instruction(question: &str, verification: &Verification) -> String {
    let mut out = String::from("The previous answer failed verification.\n");
    for &dimension in &verification.failed {
        let score = verification
            .score_for(dimension)
            .map(|s| format!("{s:.2}"))
            .unwrap_or_else(|| "n/a".to_string());
        let _ = writeln!(out, "[{}] score {score}", dimension.as_str());

        let mut listed = 0;
        for issue in verification
            .issues_for(dimension)
            .take(MAX_ISSUES_PER_DIMENSION)
        {
            let _ = writeln!(out, "- {}: {}", issue.kind, issue.detail);
            listed += 1;
        }
        if listed == 0 {
            let _ = writeln!(out, "- {}", generic_hint(dimension));
        }
    }
    let _ = write!(
        out,
        "Answer the original question again, fixing the points above: {question}"
    );
    out
}

fn generic_hint(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Factual => "stay closer to the cited knowledge and do not add unsupported claims",
        Dimension::Consistency => "make the answer internally coherent and avoid absolute claims",
    }
}
