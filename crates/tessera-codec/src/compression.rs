//! Compression algorithms addressable by a one-byte id.

use serde::{Deserialize, Serialize};

use tessera_core::constants::{COMPRESSION_NONE, COMPRESSION_ZSTD};
use tessera_core::errors::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "algorithm")]
pub enum Compression {
    None,
    Zstd { level: i32 },
}

impl Compression {
    pub fn zstd(level: i32) -> Self {
        Self::Zstd { level }
    }

    /// On-disk id of the algorithm.
    pub fn id(self) -> u8 {
        match self {
            Compression::None => COMPRESSION_NONE,
            Compression::Zstd { .. } => COMPRESSION_ZSTD,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Zstd { .. } => "zstd",
        }
    }

    /// Compress `raw`. Falls back to storing raw bytes when compression does not save space;
    /// the returned id reflects what was actually written.
    pub fn compress(self, raw: &[u8]) -> Result<(u8, Vec<u8>), CodecError> {
        match self {
            Compression::None => Ok((COMPRESSION_NONE, raw.to_vec())),
            Compression::Zstd { level } => {
                let compressed = zstd::encode_all(raw, level).map_err(|e| CodecError::Encoding {
                    reason: format!("zstd: {e}"),
                })?;
                if compressed.len() >= raw.len() {
                    return Ok((COMPRESSION_NONE, raw.to_vec()));
                }
                Ok((COMPRESSION_ZSTD, compressed))
            }
        }
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self::Zstd { level: 3 }
    }
}

/// Undo `Compression::compress` given the id stored beside the bytes.
pub fn decompress(id: u8, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    match id {
        COMPRESSION_NONE => Ok(bytes.to_vec()),
        COMPRESSION_ZSTD => zstd::decode_all(bytes).map_err(|e| CodecError::Decompression {
            reason: e.to_string(),
        }),
        other => Err(CodecError::UnknownCompression { id: other }),
    }
}

/// Reject an unknown id without touching the data.
pub fn check_id(id: u8) -> Result<(), CodecError> {
    match id {
        COMPRESSION_NONE | COMPRESSION_ZSTD => Ok(()),
        other => Err(CodecError::UnknownCompression { id: other }),
    }
}
