//! Span definitions per operation: container I/O, spatial queries, verification, judging.

/// Create a container operation span.
#[macro_export]
macro_rules! container_span {
    ($operation:expr, $path:expr) => {
        tracing::info_span!("tessera.container", operation = %$operation, path = %$path)
    };
}

/// Create a spatial query span.
#[macro_export]
macro_rules! spatial_span {
    ($domain:expr, $k:expr) => {
        tracing::debug_span!("tessera.spatial", domain = %$domain, k = $k)
    };
}

/// Create a verification span.
#[macro_export]
macro_rules! verification_span {
    ($tile_id:expr, $verifier_id:expr) => {
        tracing::info_span!("tessera.verification", tile_id = %$tile_id, verifier_id = %$verifier_id)
    };
}

/// Create a judge pipeline span.
#[macro_export]
macro_rules! judge_span {
    ($request_id:expr, $domain:expr) => {
        tracing::info_span!("tessera.judge", request_id = %$request_id, domain = %$domain)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const CONTAINER: &str = "tessera.container";
    pub const SPATIAL: &str = "tessera.spatial";
    pub const VERIFICATION: &str = "tessera.verification";
    pub const JUDGE: &str = "tessera.judge";
}
