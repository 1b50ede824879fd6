//! # tessera-storage
//!
//! Single-file container store for knowledge tiles.
//!
//! - Header, metadata and index up front; framed tile bodies after.
//! - Appends never rewrite existing bytes; the index is persisted by `flush`.
//! - `compact` drops superseded bodies by writing a new file and renaming it into place.
//! - Corruption detected at open is fatal.

pub mod engine;
pub mod format;
mod io;
pub mod recovery;
mod segment;
pub mod stats;
mod writer;

pub use engine::ContainerStore;
pub use format::ContainerMetadata;
pub use stats::StoreStats;
