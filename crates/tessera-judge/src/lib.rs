//! # tessera-judge
//!
//! Per-question judge pipeline: route by complexity, generate through an
//! external provider, verify the candidate, and correct a bounded number of
//! times before returning a verdict.
//!
//! ## Lanes
//! - **Basic**: no retrieval, consistency-only verification.
//! - **Advanced**: retrieval-augmented, the candidate is checked against the
//!   anchor facts of the retrieved tiles and scored for hallucination risk.
//!
//! Verification failure never surfaces as an error. It ends in
//! [`Verdict::Exhausted`] with the last candidate and its low confidence.

pub mod corrections;
pub mod estimator;
pub mod pipeline;
pub mod pool;
pub mod result;
pub mod trace;
pub mod verifier;

pub use estimator::HeuristicComplexityEstimator;
pub use pipeline::JudgePipeline;
pub use pool::{JudgeHandle, JudgePool};
pub use result::{CitedTile, JudgeResult, Lane, Verdict};
pub use trace::{PipelineState, PipelineTrace, TraceStep};
pub use verifier::{
    Dimension, HallucinationRisk, Issue, RiskLevel, RiskyPatterns, Verification, Verifier,
};
