//! On-disk container layout.
//!
//! ```text
//! Header | MetadataBlock | IndexBlock | body region
//! ```
//!
//! The body region is a sequence of framed tile payloads. Index offsets are
//! relative to the start of the body region and point at the payload inside a
//! frame. Frames appended after the last index flush (`flushed_body_len`) are
//! recovered by tail replay at open.

pub mod frame;
pub mod header;
pub mod index;
pub mod metadata;

pub use frame::{encode_frame, parse_frame, FrameRef, FRAME_FIXED_LEN};
pub use header::ContainerHeader;
pub use index::{decode_index, encode_index, validate_index, IndexEntry};
pub use metadata::ContainerMetadata;
