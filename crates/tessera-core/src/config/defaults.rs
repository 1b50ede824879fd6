// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_CONTAINER_PATH: &str = "tessera.tess";
pub const DEFAULT_DOMAIN_CODE: &str = "general";
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;
pub const DEFAULT_FSYNC_ON_WRITE: bool = false;
pub const DEFAULT_HOT_CACHE_CAPACITY: u64 = 1_024;
pub const DEFAULT_TRUNCATE_TORN_TAIL: bool = false;
pub const DEFAULT_MAX_TILE_BYTES: usize = 4 * 1024 * 1024; // 4 MB

// --- Spatial ---
pub const DEFAULT_CELLS_PER_AXIS: u32 = 16;
pub const DEFAULT_COARSE_FACTOR: u32 = 4;
pub const DEFAULT_LOW_CERTAINTY_PENALTY: f64 = 0.0;
pub const DEFAULT_LOW_CERTAINTY_THRESHOLD: f64 = 30.0;
pub const DEFAULT_VERIFICATION_MIN: f64 = 0.0;
pub const DEFAULT_VERIFICATION_MAX: f64 = 100.0;
pub const DEFAULT_QUERY_CERTAINTY: f64 = 50.0;
pub const DEFAULT_QUERY_VERIFICATION: f64 = 50.0;

// --- Axis scoring weights ---
pub const DEFAULT_INITIAL_REVIEW_WEIGHT: f64 = 30.0;
pub const DEFAULT_UNREVIEWED_START: f64 = 10.0;
pub const DEFAULT_PER_EXPERT_WEIGHT: f64 = 20.0;
pub const DEFAULT_PER_COMMUNITY_WEIGHT: f64 = 5.0;
pub const DEFAULT_PER_REVIEWER_CAP: f64 = 20.0;
pub const DEFAULT_PER_SOURCE_WEIGHT: f64 = 10.0;
pub const DEFAULT_TIME_STABILITY_WEIGHT: f64 = 15.0;
pub const DEFAULT_CONSENSUS_WEIGHT: f64 = 25.0;
pub const DEFAULT_VERIFICATION_BASE: f64 = 50.0;
pub const DEFAULT_VERIFICATION_PER_SOURCE: f64 = 5.0;
pub const DEFAULT_VERIFICATION_CONSENSUS: f64 = 20.0;

// --- Judge ---
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_COMPLEXITY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_RETRIEVAL_K: usize = 5;
pub const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.6;
pub const DEFAULT_MIN_FACTUAL: f64 = 0.5;
pub const DEFAULT_MIN_CONSISTENCY: f64 = 0.5;
pub const DEFAULT_FACTUAL_WEIGHT: f64 = 0.6;
pub const DEFAULT_CONSISTENCY_WEIGHT: f64 = 0.4;
pub const DEFAULT_MAX_HALLUCINATION_RISK: f64 = 0.6;
pub const DEFAULT_NEUTRAL_FACTUAL: f64 = 0.5;
pub const DEFAULT_DOWNGRADE_ON_TIMEOUT: bool = true;
pub const DEFAULT_MAX_CHUNKS: usize = 4_096;
pub const DEFAULT_WORKER_POOL_SIZE: usize = 8;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 500;

// --- Marks ---
pub const DEFAULT_COMMUNITY_CONFIDENCE: f64 = 0.7;
pub const DEFAULT_EXPERT_CONFIDENCE: f64 = 0.9;
pub const DEFAULT_MULTI_EXPERT_CONFIDENCE: f64 = 0.95;
pub const DEFAULT_MULTI_EXPERT_QUORUM: usize = 2;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
