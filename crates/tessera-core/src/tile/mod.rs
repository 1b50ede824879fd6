//! Knowledge tile model: identity, coordinates, confidence, and verification marks.

mod base;
mod confidence;
mod coordinates;
mod id;
mod mark;

pub use base::{AxisInputs, KnowledgeTile, NewTile};
pub use confidence::Confidence;
pub use coordinates::{Axis, Coordinates};
pub use id::TileId;
pub use mark::{MarkKind, VerificationEvent, VerificationMark};
