//! Body frames: `"TBDY" | id str16 | payload_len u32 | payload`.

use tessera_codec::bytes::{ByteReader, ByteWriter};
use tessera_core::constants::BODY_FRAME_MAGIC;
use tessera_core::errors::CodecError;

/// magic(4) + id length prefix(2) + payload length(4)
pub const FRAME_FIXED_LEN: usize = 10;

/// A frame parsed from a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRef<'a> {
    pub tile_id: &'a str,
    /// Offset of the payload from the start of the frame.
    pub payload_offset: usize,
    pub payload: &'a [u8],
}

impl FrameRef<'_> {
    /// Total bytes occupied by the frame.
    pub fn frame_len(&self) -> usize {
        self.payload_offset + self.payload.len()
    }
}

/// Frame `payload` for `tile_id`. Returns the frame bytes and the payload offset within it.
pub fn encode_frame(tile_id: &str, payload: &[u8]) -> Result<(Vec<u8>, usize), CodecError> {
    let payload_len = u32::try_from(payload.len()).map_err(|_| CodecError::Encoding {
        reason: format!("payload of {} bytes exceeds u32", payload.len()),
    })?;
    let mut w = ByteWriter::with_capacity(FRAME_FIXED_LEN + tile_id.len() + payload.len());
    w.put_bytes(&BODY_FRAME_MAGIC);
    w.put_str16(tile_id)?;
    w.put_u32(payload_len);
    let payload_offset = w.len();
    w.put_bytes(payload);
    Ok((w.into_inner(), payload_offset))
}

/// Parse one frame from the start of `buf`.
pub fn parse_frame(buf: &[u8]) -> Result<FrameRef<'_>, CodecError> {
    let mut r = ByteReader::new(buf, "body frame");
    r.expect_magic(BODY_FRAME_MAGIC)?;
    let tile_id = r.str16()?;
    let payload_len = r.u32()? as usize;
    let payload_offset = r.position();
    let payload = r.take(payload_len)?;
    Ok(FrameRef {
        tile_id,
        payload_offset,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips() {
        let (bytes, offset) = encode_frame("tile-7", b"payload").unwrap();
        let frame = parse_frame(&bytes).unwrap();
        assert_eq!(frame.tile_id, "tile-7");
        assert_eq!(frame.payload, b"payload");
        assert_eq!(frame.payload_offset, offset);
        assert_eq!(frame.frame_len(), bytes.len());
    }

    #[test]
    fn partial_frame_is_truncated() {
        let (bytes, _) = encode_frame("tile-7", b"payload").unwrap();
        assert!(matches!(
            parse_frame(&bytes[..bytes.len() - 3]),
            Err(CodecError::Truncated { .. })
        ));
    }
}
