use serde::{Deserialize, Serialize};

use super::defaults;

/// Container store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the container file.
    pub container_path: String,
    /// Domain code written into the header of newly created containers.
    pub domain_code: String,
    /// zstd level for tile bodies and the metadata block.
    pub compression_level: i32,
    /// fsync after every appended tile body.
    pub fsync_on_write: bool,
    /// Maximum number of decoded tiles kept in the hot cache.
    pub hot_cache_capacity: u64,
    /// Truncate a torn final body frame on open instead of refusing to open.
    pub truncate_torn_tail: bool,
    /// Upper bound on one encoded tile body.
    pub max_tile_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            container_path: defaults::DEFAULT_CONTAINER_PATH.to_string(),
            domain_code: defaults::DEFAULT_DOMAIN_CODE.to_string(),
            compression_level: defaults::DEFAULT_COMPRESSION_LEVEL,
            fsync_on_write: defaults::DEFAULT_FSYNC_ON_WRITE,
            hot_cache_capacity: defaults::DEFAULT_HOT_CACHE_CAPACITY,
            truncate_torn_tail: defaults::DEFAULT_TRUNCATE_TORN_TAIL,
            max_tile_bytes: defaults::DEFAULT_MAX_TILE_BYTES,
        }
    }
}
