use serde::{Deserialize, Serialize};

use crate::config::DomainSchema;

/// Routing signals computed from the question alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityEstimate {
    /// In [0, 1].
    pub complexity: f64,
    /// In [0, 1]: how strongly the question matches the domain vocabulary.
    pub domain_fit: f64,
}

/// Scores how hard a question is. Independent of any tile content.
pub trait IComplexityEstimator: Send + Sync {
    fn estimate(&self, question: &str, domain: &DomainSchema) -> ComplexityEstimate;
}
