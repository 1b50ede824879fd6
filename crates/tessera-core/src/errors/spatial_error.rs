/// Spatial index errors.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    #[error("coordinate axis {axis} value {value} outside [{min}, {max}]")]
    OutOfRange {
        axis: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("coordinate axis {axis} is not finite")]
    NotFinite { axis: String },

    #[error("domain {domain} is already registered")]
    DuplicateDomain { domain: String },

    #[error("tile {tile_id} belongs to domain {actual}, not {expected}")]
    DomainMismatch {
        tile_id: String,
        expected: String,
        actual: String,
    },

    #[error("lock poisoned: {lock}")]
    LockPoisoned { lock: String },
}
