//! Replay of body frames appended after the last index flush.

use tessera_codec::verify_payload;
use tessera_core::constants::MAX_TILE_ID_LEN;
use tessera_core::tile::TileId;

use crate::format::{parse_frame, IndexEntry};

/// Outcome of scanning the unflushed tail of the body region.
#[derive(Debug, Default)]
pub struct TailReplay {
    /// Recovered entries in append order; later entries supersede earlier ones.
    pub entries: Vec<(TileId, IndexEntry)>,
    /// Bytes of the tail made of complete, verified frames.
    pub valid_len: u64,
    /// Bytes after the last valid frame.
    pub torn_len: u64,
}

impl TailReplay {
    pub fn is_torn(&self) -> bool {
        self.torn_len > 0
    }
}

/// Scan `tail`, which starts at body offset `base`. Stops at the first frame
/// that is incomplete or fails payload verification.
pub fn replay_tail(tail: &[u8], base: u64) -> TailReplay {
    let mut replay = TailReplay::default();
    let mut pos = 0usize;
    while pos < tail.len() {
        let frame = match parse_frame(&tail[pos..]) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(offset = base + pos as u64, error = %e, "tail frame unreadable");
                break;
            }
        };
        if frame.tile_id.is_empty() || frame.tile_id.len() > MAX_TILE_ID_LEN {
            break;
        }
        if let Err(e) = verify_payload(frame.payload) {
            tracing::debug!(offset = base + pos as u64, error = %e, "tail payload failed verification");
            break;
        }
        replay.entries.push((
            TileId::new(frame.tile_id),
            IndexEntry {
                offset: base + (pos + frame.payload_offset) as u64,
                length: frame.payload.len() as u32,
            },
        ));
        pos += frame.frame_len();
    }
    replay.valid_len = pos as u64;
    replay.torn_len = (tail.len() - pos) as u64;
    replay
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::encode_frame;
    use tessera_codec::TileCodec;
    use tessera_core::tile::{Coordinates, KnowledgeTile, NewTile};

    fn payload(id: &str) -> Vec<u8> {
        let tile = KnowledgeTile::from_new(
            NewTile {
                id: Some(TileId::new(id)),
                domain: "general".into(),
                content: format!("content {id}"),
                ..Default::default()
            },
            Coordinates::new(10.0, 1.0, 50.0),
            10.0,
            chrono::Utc::now(),
        );
        TileCodec::default().encode(&tile).unwrap()
    }

    #[test]
    fn complete_frames_are_recovered_in_order() {
        let (a, _) = encode_frame("a", &payload("a")).unwrap();
        let (b, b_off) = encode_frame("b", &payload("b")).unwrap();
        let tail = [a.clone(), b].concat();
        let replay = replay_tail(&tail, 100);
        assert_eq!(replay.entries.len(), 2);
        assert_eq!(replay.entries[1].0.as_str(), "b");
        assert_eq!(replay.entries[1].1.offset, 100 + (a.len() + b_off) as u64);
        assert!(!replay.is_torn());
    }

    #[test]
    fn torn_final_frame_is_reported() {
        let (a, _) = encode_frame("a", &payload("a")).unwrap();
        let (b, _) = encode_frame("b", &payload("b")).unwrap();
        let tail = [a.clone(), b[..b.len() / 2].to_vec()].concat();
        let replay = replay_tail(&tail, 0);
        assert_eq!(replay.entries.len(), 1);
        assert_eq!(replay.valid_len, a.len() as u64);
        assert_eq!(replay.torn_len, (b.len() / 2) as u64);
    }
}
