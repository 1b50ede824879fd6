//! # tessera-core
//!
//! Foundation crate for the Tessera tile store.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tile;
pub mod tracing_setup;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::TesseraConfig;
pub use errors::{TesseraError, TesseraResult};
pub use tile::{
    AxisInputs, Confidence, Coordinates, KnowledgeTile, MarkKind, NewTile, TileId,
    VerificationEvent, VerificationMark,
};
