use serde::{Deserialize, Serialize};

use super::defaults;

/// Verification mark configuration: the confidence floor each mark grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarksConfig {
    pub community_confidence: f64,
    pub expert_confidence: f64,
    pub multi_expert_confidence: f64,
    /// Distinct experts needed for `multi_expert`.
    pub multi_expert_quorum: usize,
}

impl Default for MarksConfig {
    fn default() -> Self {
        Self {
            community_confidence: defaults::DEFAULT_COMMUNITY_CONFIDENCE,
            expert_confidence: defaults::DEFAULT_EXPERT_CONFIDENCE,
            multi_expert_confidence: defaults::DEFAULT_MULTI_EXPERT_CONFIDENCE,
            multi_expert_quorum: defaults::DEFAULT_MULTI_EXPERT_QUORUM,
        }
    }
}
