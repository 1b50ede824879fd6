//! # tessera-codec
//!
//! Pure in-memory encoding of knowledge tiles into self-describing,
//! checksummed, compressed payloads. No I/O.
//!
//! Payload layout (little-endian):
//!
//! ```text
//! magic "TILE" | schema u16 | compression u8 | body_len u32 | checksum [u8; 8] | body
//! ```
//!
//! The checksum is the first 8 bytes of the blake3 hash of `body` (the compressed bytes).

pub mod bytes;
pub mod compression;
pub mod payload;
pub mod record;

pub use compression::Compression;
pub use payload::{peek_schema_version, verify_payload, PayloadHeader, TileCodec, PAYLOAD_HEADER_LEN};
pub use record::TileRecordV1;
