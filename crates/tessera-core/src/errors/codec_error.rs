/// Tile payload encode/decode errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("bad magic bytes: expected {expected:?}, found {found:?}")]
    BadMagic { expected: [u8; 4], found: Vec<u8> },

    #[error("checksum mismatch in {section}")]
    ChecksumMismatch { section: String },

    #[error("truncated {section}: need {needed} bytes, have {available}")]
    Truncated {
        section: String,
        needed: usize,
        available: usize,
    },

    #[error("schema version {found} is newer than supported version {supported}")]
    VersionUnsupported { found: u16, supported: u16 },

    #[error("unknown compression algorithm id {id}")]
    UnknownCompression { id: u8 },

    #[error("decompression failed: {reason}")]
    Decompression { reason: String },

    #[error("malformed {section}: {reason}")]
    Malformed { section: String, reason: String },

    #[error("encoding failed: {reason}")]
    Encoding { reason: String },
}

impl CodecError {
    /// Structural corruption (as opposed to a version the decoder is too old for).
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::BadMagic { .. }
                | Self::ChecksumMismatch { .. }
                | Self::Truncated { .. }
                | Self::UnknownCompression { .. }
                | Self::Decompression { .. }
                | Self::Malformed { .. }
        )
    }

    pub fn truncated(section: &str, needed: usize, available: usize) -> Self {
        Self::Truncated {
            section: section.to_string(),
            needed,
            available,
        }
    }

    pub fn malformed(section: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            section: section.to_string(),
            reason: reason.into(),
        }
    }
}
