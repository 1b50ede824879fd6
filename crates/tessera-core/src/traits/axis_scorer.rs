use crate::config::AxisRange;
use crate::tile::{AxisInputs, KnowledgeTile};

/// Computes a tile's coordinate from its content, axis inputs and verification history.
///
/// Implementations must be deterministic: the same tile always maps to the same point.
pub trait IAxisScorer: Send + Sync {
    /// Certainty start value for a new tile.
    fn initial_certainty(&self, explicit: Option<f64>, inputs: &AxisInputs, range: AxisRange) -> f64;

    /// Granularity derived from content length.
    fn granularity(&self, content: &str, range: AxisRange) -> f64;

    /// Certainty after accumulating the tile's verification history.
    /// Never lower than the tile's current certainty.
    fn certainty(&self, tile: &KnowledgeTile, range: AxisRange) -> f64;

    /// Verification-axis value from external sources and reviewer consensus.
    fn verification(&self, tile: &KnowledgeTile, range: AxisRange) -> f64;
}
