use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tessera_codec::Compression;
use tessera_core::constants::{CONTAINER_FORMAT_VERSION, TILE_SCHEMA_VERSION};
use tessera_core::errors::CodecError;

/// Descriptive fields stored zstd-compressed after the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    pub created_at: DateTime<Utc>,
    pub domain_code: String,
    /// Compression used for tile bodies.
    pub compression: Compression,
    pub format_version: u16,
    pub tile_schema_version: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_compacted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl ContainerMetadata {
    pub fn new(domain_code: &str, compression: Compression, created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            domain_code: domain_code.to_string(),
            compression,
            format_version: CONTAINER_FORMAT_VERSION,
            tile_schema_version: TILE_SCHEMA_VERSION,
            last_compacted_at: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let json = serde_json::to_vec(self).map_err(|e| CodecError::Encoding {
            reason: e.to_string(),
        })?;
        zstd::encode_all(json.as_slice(), 3).map_err(|e| CodecError::Encoding {
            reason: format!("zstd: {e}"),
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let json = zstd::decode_all(bytes).map_err(|e| CodecError::Decompression {
            reason: format!("metadata block: {e}"),
        })?;
        serde_json::from_slice(&json).map_err(|e| CodecError::malformed("metadata block", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_round_trips() {
        let mut meta = ContainerMetadata::new("legal", Compression::zstd(5), Utc::now());
        meta.extra.insert("owner".into(), "records team".into());
        let decoded = ContainerMetadata::decode(&meta.encode().unwrap()).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn garbage_is_a_decompression_error() {
        assert!(matches!(
            ContainerMetadata::decode(b"definitely not zstd"),
            Err(CodecError::Decompression { .. })
        ));
    }
}
