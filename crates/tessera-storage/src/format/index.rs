use std::collections::BTreeMap;

use tessera_codec::bytes::{ByteReader, ByteWriter};
use tessera_core::constants::MAX_TILE_ID_LEN;
use tessera_core::errors::{CodecError, StorageError, TesseraResult};
use tessera_core::tile::TileId;

const SECTION: &str = "index block";

/// Location of a tile payload inside the body region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    /// Offset of the payload, relative to the body region start.
    pub offset: u64,
    pub length: u32,
}

impl IndexEntry {
    pub fn end(&self) -> u64 {
        self.offset + self.length as u64
    }
}

/// Encode `count u32 | (id str16, offset u64, length u32)*` in id order.
pub fn encode_index(entries: &BTreeMap<TileId, IndexEntry>) -> Result<Vec<u8>, CodecError> {
    let mut w = ByteWriter::with_capacity(4 + entries.len() * 48);
    let count = u32::try_from(entries.len()).map_err(|_| CodecError::Encoding {
        reason: "more than u32::MAX index entries".to_string(),
    })?;
    w.put_u32(count);
    for (id, entry) in entries {
        w.put_str16(id.as_str())?;
        w.put_u64(entry.offset);
        w.put_u32(entry.length);
    }
    Ok(w.into_inner())
}

pub fn decode_index(bytes: &[u8]) -> Result<BTreeMap<TileId, IndexEntry>, CodecError> {
    let mut r = ByteReader::new(bytes, SECTION);
    let count = r.u32()? as usize;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let id = r.str16()?;
        if id.is_empty() || id.len() > MAX_TILE_ID_LEN {
            return Err(CodecError::malformed(SECTION, format!("invalid tile id length {}", id.len())));
        }
        let entry = IndexEntry {
            offset: r.u64()?,
            length: r.u32()?,
        };
        if entries.insert(TileId::new(id), entry).is_some() {
            return Err(CodecError::malformed(SECTION, format!("duplicate tile id {id}")));
        }
    }
    if !r.is_exhausted() {
        return Err(CodecError::malformed(
            SECTION,
            format!("{} trailing bytes", r.remaining()),
        ));
    }
    Ok(entries)
}

/// Every entry must lie inside `[0, body_len)` and no two entries may overlap.
pub fn validate_index<'a, I>(entries: I, body_len: u64) -> TesseraResult<()>
where
    I: IntoIterator<Item = (&'a TileId, &'a IndexEntry)>,
{
    let mut ranges: Vec<(u64, u64, &TileId)> = Vec::new();
    for (id, entry) in entries {
        if entry.length == 0 {
            return Err(StorageError::corrupt(format!("index entry for {id} has zero length")).into());
        }
        let end = entry
            .offset
            .checked_add(entry.length as u64)
            .ok_or_else(|| StorageError::corrupt(format!("index entry for {id} overflows")))?;
        if end > body_len {
            return Err(StorageError::corrupt(format!(
                "index entry for {id} ends at {end}, past body region of {body_len} bytes"
            ))
            .into());
        }
        ranges.push((entry.offset, end, id));
    }
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        let (_, prev_end, prev_id) = pair[0];
        let (start, _, id) = pair[1];
        if start < prev_end {
            return Err(StorageError::corrupt(format!(
                "index entries for {prev_id} and {id} overlap"
            ))
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, u64, u32)]) -> BTreeMap<TileId, IndexEntry> {
        pairs
            .iter()
            .map(|(id, offset, length)| {
                (
                    TileId::new(*id),
                    IndexEntry {
                        offset: *offset,
                        length: *length,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn index_round_trips_in_id_order() {
        let map = entries(&[("b", 40, 10), ("a", 0, 30)]);
        let decoded = decode_index(&encode_index(&map).unwrap()).unwrap();
        assert_eq!(decoded, map);
        assert_eq!(decoded.keys().next().unwrap().as_str(), "a");
    }

    #[test]
    fn overlapping_entries_are_corrupt() {
        let map = entries(&[("a", 0, 30), ("b", 20, 10)]);
        let err = validate_index(&map, 100).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn entries_past_body_are_corrupt() {
        let map = entries(&[("a", 90, 20)]);
        assert!(validate_index(&map, 100).is_err());
        assert!(validate_index(&map, 110).is_ok());
    }

    #[test]
    fn truncated_index_is_rejected() {
        let bytes = encode_index(&entries(&[("a", 0, 30)])).unwrap();
        assert!(matches!(
            decode_index(&bytes[..bytes.len() - 2]),
            Err(CodecError::Truncated { .. })
        ));
    }
}
