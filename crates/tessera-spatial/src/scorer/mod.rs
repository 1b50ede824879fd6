//! Coordinate scoring.
//!
//! The scoring function is pluggable through [`IAxisScorer`]; [`WeightedAxisScorer`]
//! is the default weighted-sum-then-clamp implementation.

mod granularity;
mod placement;
mod weighted;

pub use granularity::granularity_for_words;
pub use placement::{place_new_tile, recompute_coordinates, regranulate};
pub use weighted::{consensus, WeightedAxisScorer};

pub use tessera_core::traits::IAxisScorer;
