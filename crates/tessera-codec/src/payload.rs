//! Tile payload framing: encode, decode and cheap integrity checks.

use tessera_core::constants::{TILE_MAGIC, TILE_SCHEMA_VERSION};
use tessera_core::errors::CodecError;
use tessera_core::tile::KnowledgeTile;

use crate::bytes::{short_checksum, ByteReader, ByteWriter};
use crate::compression::{self, Compression};
use crate::record::TileRecordV1;

/// magic(4) + schema(2) + compression(1) + body_len(4) + checksum(8)
pub const PAYLOAD_HEADER_LEN: usize = 19;

const SECTION: &str = "tile payload";

/// Parsed fixed-size prefix of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadHeader {
    pub schema_version: u16,
    pub compression_id: u8,
    pub body_len: u32,
    pub checksum: [u8; 8],
}

impl PayloadHeader {
    /// Total payload length this header describes.
    pub fn payload_len(&self) -> usize {
        PAYLOAD_HEADER_LEN + self.body_len as usize
    }
}

/// Encodes and decodes tiles. Stateless apart from the compression setting.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileCodec {
    compression: Compression,
}

impl TileCodec {
    pub fn new(compression: Compression) -> Self {
        Self { compression }
    }

    pub fn with_zstd_level(level: i32) -> Self {
        Self::new(Compression::zstd(level))
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Encode `tile` into a self-describing payload at the current schema version.
    pub fn encode(&self, tile: &KnowledgeTile) -> Result<Vec<u8>, CodecError> {
        if !tile.coordinates.is_finite() {
            return Err(CodecError::Encoding {
                reason: format!("tile {} has a non-finite coordinate", tile.id),
            });
        }
        let record = TileRecordV1::from(tile);
        let json = serde_json::to_vec(&record).map_err(|e| CodecError::Encoding {
            reason: e.to_string(),
        })?;
        let (compression_id, body) = self.compression.compress(&json)?;
        let body_len = u32::try_from(body.len()).map_err(|_| CodecError::Encoding {
            reason: format!("body of {} bytes exceeds u32", body.len()),
        })?;

        let mut w = ByteWriter::with_capacity(PAYLOAD_HEADER_LEN + body.len());
        w.put_bytes(&TILE_MAGIC);
        w.put_u16(TILE_SCHEMA_VERSION);
        w.put_u8(compression_id);
        w.put_u32(body_len);
        w.put_bytes(&short_checksum(&body));
        w.put_bytes(&body);
        Ok(w.into_inner())
    }

    /// Decode a payload produced by `encode`.
    pub fn decode(&self, bytes: &[u8]) -> Result<KnowledgeTile, CodecError> {
        decode(bytes)
    }
}

/// Decode a payload produced by any supported schema version.
pub fn decode(bytes: &[u8]) -> Result<KnowledgeTile, CodecError> {
    let header = verify_payload(bytes)?;
    let body = &bytes[PAYLOAD_HEADER_LEN..header.payload_len()];
    let raw = compression::decompress(header.compression_id, body)?;

    match header.schema_version {
        1 => {
            let record: TileRecordV1 = serde_json::from_slice(&raw)
                .map_err(|e| CodecError::malformed("tile record", e.to_string()))?;
            Ok(record.into())
        }
        other => Err(CodecError::malformed(
            "tile record",
            format!("no decoder for schema version {other}"),
        )),
    }
}

/// Check framing, version, compression id and checksum without decompressing.
///
/// The payload must be exactly as long as its header says.
pub fn verify_payload(bytes: &[u8]) -> Result<PayloadHeader, CodecError> {
    let mut r = ByteReader::new(bytes, SECTION);
    r.expect_magic(TILE_MAGIC)?;
    let schema_version = r.u16()?;
    if schema_version > TILE_SCHEMA_VERSION {
        return Err(CodecError::VersionUnsupported {
            found: schema_version,
            supported: TILE_SCHEMA_VERSION,
        });
    }
    if schema_version == 0 {
        return Err(CodecError::malformed(SECTION, "schema version 0"));
    }
    let compression_id = r.u8()?;
    compression::check_id(compression_id)?;
    let body_len = r.u32()?;
    let checksum: [u8; 8] = r.take_array()?;
    let body = r.take(body_len as usize)?;
    if !r.is_exhausted() {
        return Err(CodecError::malformed(
            SECTION,
            format!("{} trailing bytes after body", r.remaining()),
        ));
    }
    if short_checksum(body) != checksum {
        return Err(CodecError::ChecksumMismatch {
            section: SECTION.to_string(),
        });
    }
    Ok(PayloadHeader {
        schema_version,
        compression_id,
        body_len,
        checksum,
    })
}

/// Read the declared schema version without validating the rest of the payload.
pub fn peek_schema_version(bytes: &[u8]) -> Result<u16, CodecError> {
    let mut r = ByteReader::new(bytes, SECTION);
    r.expect_magic(TILE_MAGIC)?;
    r.u16()
}
