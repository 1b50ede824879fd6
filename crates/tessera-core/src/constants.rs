/// Tessera system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Magic bytes at the start of every container file.
pub const CONTAINER_MAGIC: [u8; 4] = *b"TSRA";

/// Container format version written by this build.
pub const CONTAINER_FORMAT_VERSION: u16 = 1;

/// Magic bytes at the start of every encoded tile payload.
pub const TILE_MAGIC: [u8; 4] = *b"TILE";

/// Newest tile schema version this build can decode.
pub const TILE_SCHEMA_VERSION: u16 = 1;

/// Magic bytes framing each tile body inside the body region.
pub const BODY_FRAME_MAGIC: [u8; 4] = *b"TBDY";

/// Compression algorithm ids recorded in payloads and the metadata block.
pub const COMPRESSION_NONE: u8 = 0;
pub const COMPRESSION_ZSTD: u8 = 1;

/// Axis bounds shared by every domain.
pub const CERTAINTY_MIN: f64 = 0.0;
pub const CERTAINTY_MAX: f64 = 100.0;
pub const GRANULARITY_MIN: f64 = 1.0;
pub const GRANULARITY_MAX: f64 = 1000.0;

/// Hard cap on generation attempts regardless of configuration.
pub const MAX_ATTEMPTS_CEILING: u32 = 8;

/// Maximum tile id length in bytes (ids are length-prefixed with a u16).
pub const MAX_TILE_ID_LEN: usize = 256;

/// Maximum page size for `list_tiles`.
pub const MAX_PAGE_SIZE: usize = 500;

/// Name of the domain that always exists.
pub const GENERAL_DOMAIN: &str = "general";
