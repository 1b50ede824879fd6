use serde::{Deserialize, Serialize};

/// Point-in-time space accounting for a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub tile_count: usize,
    /// Size of the body region.
    pub body_bytes: u64,
    /// Bytes of frames holding the latest version of a tile.
    pub live_bytes: u64,
    /// Bytes of superseded frames, reclaimable by compaction.
    pub dead_bytes: u64,
    /// Bytes appended since the index block was last written.
    pub unflushed_bytes: u64,
    pub dirty: bool,
    /// Bumped each time flush or compaction swaps in a new file.
    pub generation: u64,
    pub cached_tiles: u64,
}

impl StoreStats {
    /// Fraction of the body region that compaction would reclaim.
    pub fn dead_ratio(&self) -> f64 {
        if self.body_bytes == 0 {
            return 0.0;
        }
        self.dead_bytes as f64 / self.body_bytes as f64
    }
}
