//! # tessera-spatial
//!
//! Places tiles in the 3-axis semantic space and answers nearest-neighbor
//! queries, one independent index per domain.
//!
//! - `scorer`: pluggable coordinate scoring and placement of new tiles.
//! - `query`: maps a question to a query point.
//! - `grid`: fine and coarse bucket grids.
//! - `index`: the per-domain indexes behind one reader/writer lock.

pub mod domain_index;
pub mod grid;
pub mod index;
pub mod query;
pub mod scorer;

pub use domain_index::{DomainIndex, Neighbor};
pub use index::SpatialIndex;
pub use query::QueryMapper;
pub use scorer::{place_new_tile, recompute_coordinates, WeightedAxisScorer};
