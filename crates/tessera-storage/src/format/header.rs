use std::io::Read;

use tessera_codec::bytes::{ByteReader, ByteWriter};
use tessera_core::constants::{CONTAINER_FORMAT_VERSION, CONTAINER_MAGIC};
use tessera_core::errors::{CodecError, TesseraResult};

const SECTION: &str = "container header";

/// magic(4) + version(2) + domain length prefix(2)
const PREFIX_LEN: usize = 8;
/// tile_count(4) + metadata_len(4) + index_len(4) + flushed_body_len(8) + checksum(32)
const SUFFIX_LEN: usize = 52;

/// Fixed container header. The checksum covers every header field before it
/// plus the metadata and index blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub format_version: u16,
    pub domain_code: String,
    pub tile_count: u32,
    pub metadata_len: u32,
    pub index_len: u32,
    /// Length of the body region covered by the index block.
    pub flushed_body_len: u64,
    pub checksum: [u8; 32],
}

impl ContainerHeader {
    /// Build a header for the given blocks, computing the checksum.
    pub fn new(
        domain_code: &str,
        tile_count: u32,
        metadata: &[u8],
        index: &[u8],
        flushed_body_len: u64,
    ) -> TesseraResult<Self> {
        let mut header = Self {
            format_version: CONTAINER_FORMAT_VERSION,
            domain_code: domain_code.to_string(),
            tile_count,
            metadata_len: block_len(metadata.len(), "metadata block")?,
            index_len: block_len(index.len(), "index block")?,
            flushed_body_len,
            checksum: [0; 32],
        };
        header.checksum = header.compute_checksum(metadata, index)?;
        Ok(header)
    }

    /// Serialized length of this header.
    pub fn encoded_len(&self) -> u64 {
        (PREFIX_LEN + self.domain_code.len() + SUFFIX_LEN) as u64
    }

    /// Offset of the body region from the start of the file.
    pub fn body_start(&self) -> u64 {
        self.encoded_len() + self.metadata_len as u64 + self.index_len as u64
    }

    fn fields(&self) -> Result<ByteWriter, CodecError> {
        let mut w = ByteWriter::with_capacity(PREFIX_LEN + self.domain_code.len() + SUFFIX_LEN);
        w.put_bytes(&CONTAINER_MAGIC);
        w.put_u16(self.format_version);
        w.put_str16(&self.domain_code)?;
        w.put_u32(self.tile_count);
        w.put_u32(self.metadata_len);
        w.put_u32(self.index_len);
        w.put_u64(self.flushed_body_len);
        Ok(w)
    }

    fn compute_checksum(&self, metadata: &[u8], index: &[u8]) -> Result<[u8; 32], CodecError> {
        let fields = self.fields()?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(fields.as_slice());
        hasher.update(metadata);
        hasher.update(index);
        Ok(*hasher.finalize().as_bytes())
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut w = self.fields()?;
        w.put_bytes(&self.checksum);
        Ok(w.into_inner())
    }

    /// Read and structurally validate a header from the start of `reader`.
    ///
    /// Magic and version are checked before anything else is trusted.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let prefix = read_exact_section(reader, PREFIX_LEN, SECTION)?;
        let mut r = ByteReader::new(&prefix, SECTION);
        r.expect_magic(CONTAINER_MAGIC)?;
        let format_version = r.u16()?;
        if format_version > CONTAINER_FORMAT_VERSION {
            return Err(CodecError::VersionUnsupported {
                found: format_version,
                supported: CONTAINER_FORMAT_VERSION,
            });
        }
        if format_version == 0 {
            return Err(CodecError::malformed(SECTION, "format version 0"));
        }
        let domain_len = r.u16()? as usize;

        let rest = read_exact_section(reader, domain_len + SUFFIX_LEN, SECTION)?;
        let mut r = ByteReader::new(&rest, SECTION);
        let domain_code = std::str::from_utf8(r.take(domain_len)?)
            .map_err(|e| CodecError::malformed(SECTION, e.to_string()))?
            .to_string();
        Ok(Self {
            format_version,
            domain_code,
            tile_count: r.u32()?,
            metadata_len: r.u32()?,
            index_len: r.u32()?,
            flushed_body_len: r.u64()?,
            checksum: r.take_array()?,
        })
    }

    /// Verify the checksum against the blocks that follow the header.
    pub fn verify(&self, metadata: &[u8], index: &[u8]) -> Result<(), CodecError> {
        if self.compute_checksum(metadata, index)? != self.checksum {
            return Err(CodecError::ChecksumMismatch {
                section: "container header/metadata/index".to_string(),
            });
        }
        Ok(())
    }
}

/// Read exactly `len` bytes, reporting a short read as truncation.
pub(crate) fn read_exact_section<R: Read>(
    reader: &mut R,
    len: usize,
    section: &str,
) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(len);
    reader
        .by_ref()
        .take(len as u64)
        .read_to_end(&mut buf)
        .map_err(|e| CodecError::malformed(section, e.to_string()))?;
    if buf.len() < len {
        return Err(CodecError::truncated(section, len, buf.len()));
    }
    Ok(buf)
}

fn block_len(len: usize, what: &str) -> TesseraResult<u32> {
    u32::try_from(len).map_err(|_| {
        CodecError::Encoding {
            reason: format!("{what} of {len} bytes exceeds u32"),
        }
        .into()
    })
}
