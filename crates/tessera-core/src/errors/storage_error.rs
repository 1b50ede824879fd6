/// Container store errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("container corrupt: {details}")]
    Corrupt { details: String },

    #[error("container I/O failed during {operation}: {message}")]
    Io { operation: String, message: String },

    #[error("container already exists at {path}")]
    AlreadyExists { path: String },

    #[error("store is closed")]
    Closed,

    #[error("tile {id} already exists")]
    DuplicateTile { id: String },

    #[error("tile body of {size} bytes exceeds the {limit}-byte limit")]
    TileTooLarge { size: usize, limit: usize },

    #[error("lock poisoned: {lock}")]
    LockPoisoned { lock: String },
}

impl StorageError {
    pub fn corrupt(details: impl Into<String>) -> Self {
        Self::Corrupt {
            details: details.into(),
        }
    }

    pub fn io(operation: &str, err: &std::io::Error) -> Self {
        Self::Io {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }

    pub fn poisoned(lock: &str) -> Self {
        Self::LockPoisoned {
            lock: lock.to_string(),
        }
    }
}
