//! Test support for the Tessera workspace: golden fixture loading, tile builders
//! and scripted stand-ins for the external collaborators.

pub mod builders;
pub mod mocks;

use serde::de::DeserializeOwned;
use std::path::PathBuf;

use tessera_core::config::DomainSchema;
use tessera_core::tile::NewTile;

pub use builders::{fixed_now, spread_tiles, TileBuilder};
pub use mocks::{
    CountingRetriever, FixedComplexity, MemoryTileStorage, ScriptStep, ScriptedProvider,
    StaticReviewerProvider,
};

/// Root directory of the golden data shipped with this crate.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Check that a fixture file exists.
pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// Domain schemas used across integration tests (`medical`, `legal`).
pub fn golden_domains() -> Vec<DomainSchema> {
    load_fixture("domains.json")
}

/// Sample tile drafts for the golden domains.
pub fn golden_tiles() -> Vec<NewTile> {
    load_fixture("sample_tiles.json")
}
