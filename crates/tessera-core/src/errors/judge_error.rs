/// Judge pipeline errors.
///
/// Verification failure is never an error: it ends in an `exhausted` verdict.
/// Only cancellation and collaborator failures surface here.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("request cancelled during {stage}")]
    Cancelled { stage: String },

    #[error("generation provider timed out after {timeout_ms}ms")]
    GenerationTimeout { timeout_ms: u64 },

    #[error("generation provider failed: {reason}")]
    ProviderFailed { reason: String },

    #[error("retrieval failed: {reason}")]
    RetrievalFailed { reason: String },

    #[error("worker pool closed")]
    PoolClosed,

    #[error("worker task failed: {reason}")]
    WorkerFailed { reason: String },
}
