use tessera_codec::{verify_payload, Compression, TileCodec, PAYLOAD_HEADER_LEN};
use tessera_core::errors::CodecError;
use test_fixtures::TileBuilder;

fn sample() -> tessera_core::KnowledgeTile {
    TileBuilder::new("med-001")
        .domain("medical")
        .topic("troponin")
        .content("Troponin rises within 3 hours.\nPeak at 24 hours.\nRemains elevated for 10 days.")
        .tags(&["zeta", "alpha", "mu"])
        .coordinates(37.123456789012345, 412.0, 0.1 + 0.2)
        .confidence(0.7300000000000001)
        .contributor("dr-who")
        .verified_by("dr-a", true)
        .verified_by("nurse-b", false)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Round-trip
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn decode_inverts_encode_field_for_field() {
    let tile = sample();
    let codec = TileCodec::default();
    let decoded = codec.decode(&codec.encode(&tile).unwrap()).unwrap();
    assert_eq!(decoded, tile);
    // Tag order is preserved, not sorted.
    assert_eq!(decoded.tags, vec!["zeta", "alpha", "mu"]);
    assert_eq!(decoded.coordinates.verification.to_bits(), (0.1f64 + 0.2).to_bits());
}

#[test]
fn uncompressed_codec_round_trips() {
    let tile = sample();
    let codec = TileCodec::new(Compression::None);
    let bytes = codec.encode(&tile).unwrap();
    assert_eq!(bytes[6], 0, "compression id none");
    assert_eq!(codec.decode(&bytes).unwrap(), tile);
}

#[test]
fn large_content_is_compressed() {
    let tile = TileBuilder::new("big")
        .content(&"repetitive clinical guidance line\n".repeat(500))
        .build();
    let bytes = TileCodec::with_zstd_level(3).encode(&tile).unwrap();
    assert!(bytes.len() < tile.content.len() / 4);
    assert_eq!(bytes[6], 1, "compression id zstd");
}

// ═══════════════════════════════════════════════════════════════════════════
// Corruption
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn flipped_body_byte_is_checksum_mismatch() {
    let codec = TileCodec::default();
    let mut bytes = codec.encode(&sample()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    let err = codec.decode(&bytes).unwrap_err();
    assert!(matches!(err, CodecError::ChecksumMismatch { .. }));
    assert!(err.is_format_error());
}

#[test]
fn bad_magic_is_rejected() {
    let codec = TileCodec::default();
    let mut bytes = codec.encode(&sample()).unwrap();
    bytes[0] = b'X';
    assert!(matches!(codec.decode(&bytes), Err(CodecError::BadMagic { .. })));
}

#[test]
fn truncated_payload_is_rejected() {
    let codec = TileCodec::default();
    let bytes = codec.encode(&sample()).unwrap();
    for cut in [0, 3, PAYLOAD_HEADER_LEN - 1, bytes.len() - 1] {
        let err = codec.decode(&bytes[..cut]).unwrap_err();
        assert!(
            matches!(err, CodecError::Truncated { .. }),
            "cut at {cut}: {err:?}"
        );
    }
}

#[test]
fn unknown_compression_id_is_rejected() {
    let codec = TileCodec::default();
    let mut bytes = codec.encode(&sample()).unwrap();
    bytes[6] = 42;
    assert!(matches!(
        verify_payload(&bytes),
        Err(CodecError::UnknownCompression { id: 42 })
    ));
}
