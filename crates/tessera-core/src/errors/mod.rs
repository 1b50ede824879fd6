//! Error handling for Tessera.
//! One error enum per subsystem, `thiserror` only, aggregated by [`TesseraError`].

mod codec_error;
mod config_error;
mod judge_error;
mod spatial_error;
mod storage_error;
mod verification_error;

pub use codec_error::CodecError;
pub use config_error::ConfigError;
pub use judge_error::JudgeError;
pub use spatial_error::SpatialError;
pub use storage_error::StorageError;
pub use verification_error::VerificationError;

/// Workspace-wide result alias.
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Top-level error type. Subsystem errors convert into it via `From`.
#[derive(Debug, thiserror::Error)]
pub enum TesseraError {
    #[error("tile not found: {id}")]
    TileNotFound { id: String },

    #[error("domain not found: {domain}")]
    DomainNotFound { domain: String },

    #[error("concurrency conflict on tile {tile_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        tile_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("invalid tile {id}: {reason}")]
    InvalidTile { id: String, reason: String },

    #[error("codec error: {0}")]
    CodecError(#[from] CodecError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("spatial index error: {0}")]
    SpatialError(#[from] SpatialError),

    #[error("judge pipeline error: {0}")]
    JudgeError(#[from] JudgeError),

    #[error("verification error: {0}")]
    VerificationError(#[from] VerificationError),

    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TesseraError {
    /// Whether this error means the container bytes are structurally corrupt.
    ///
    /// Format errors are fatal at open time: the store refuses to serve reads.
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::CodecError(e) => e.is_format_error(),
            Self::StorageError(StorageError::Corrupt { .. }) => true,
            _ => false,
        }
    }

    /// Whether this error is a missing tile or domain.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TileNotFound { .. } | Self::DomainNotFound { .. })
    }

    /// Whether this error is an optimistic-concurrency version mismatch.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }

    pub fn tile_not_found(id: impl Into<String>) -> Self {
        Self::TileNotFound { id: id.into() }
    }

    pub fn domain_not_found(domain: impl Into<String>) -> Self {
        Self::DomainNotFound {
            domain: domain.into(),
        }
    }
}
