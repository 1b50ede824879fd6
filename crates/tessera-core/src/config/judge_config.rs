use serde::{Deserialize, Serialize};

use super::defaults;

/// Judge pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Upper bound on generation provider calls per request.
    pub max_attempts: u32,
    /// Complexity at or above which the advanced lane is selected.
    pub complexity_threshold: f64,
    /// Tiles retrieved for the advanced lane.
    pub retrieval_k: usize,
    pub generation_timeout_ms: u64,
    /// Minimum combined confidence to pass.
    pub pass_threshold: f64,
    pub min_factual: f64,
    pub min_consistency: f64,
    pub factual_weight: f64,
    pub consistency_weight: f64,
    /// Advanced-lane candidates at or above this risk fail verification.
    pub max_hallucination_risk: f64,
    /// Factual score when no retrieved fact is mentioned by the candidate.
    pub neutral_factual: f64,
    /// Fall back to the basic lane when the provider times out in the advanced lane.
    pub downgrade_on_timeout: bool,
    /// Upper bound on streamed chunks consumed per generation.
    pub max_chunks: usize,
    /// Concurrent requests in the worker pool.
    pub worker_pool_size: usize,
    /// Characters of each tile's content passed to the provider.
    pub max_context_chars: usize,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::DEFAULT_MAX_ATTEMPTS,
            complexity_threshold: defaults::DEFAULT_COMPLEXITY_THRESHOLD,
            retrieval_k: defaults::DEFAULT_RETRIEVAL_K,
            generation_timeout_ms: defaults::DEFAULT_GENERATION_TIMEOUT_MS,
            pass_threshold: defaults::DEFAULT_PASS_THRESHOLD,
            min_factual: defaults::DEFAULT_MIN_FACTUAL,
            min_consistency: defaults::DEFAULT_MIN_CONSISTENCY,
            factual_weight: defaults::DEFAULT_FACTUAL_WEIGHT,
            consistency_weight: defaults::DEFAULT_CONSISTENCY_WEIGHT,
            max_hallucination_risk: defaults::DEFAULT_MAX_HALLUCINATION_RISK,
            neutral_factual: defaults::DEFAULT_NEUTRAL_FACTUAL,
            downgrade_on_timeout: defaults::DEFAULT_DOWNGRADE_ON_TIMEOUT,
            max_chunks: defaults::DEFAULT_MAX_CHUNKS,
            worker_pool_size: defaults::DEFAULT_WORKER_POOL_SIZE,
            max_context_chars: defaults::DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}
