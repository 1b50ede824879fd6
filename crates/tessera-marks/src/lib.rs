//! # tessera-marks
//!
//! Verification mark manager. Marks are derived from a tile's id-based
//! verification history, only ever advance, and every mutation of one tile's
//! mark is serialized through a per-tile lock.

pub mod derivation;
pub mod locks;
pub mod manager;

pub use derivation::{confidence_floor, derive_mark, distinct_verifiers};
pub use locks::{TileLease, TileLocks};
pub use manager::{VerificationManager, VerificationOutcome};
