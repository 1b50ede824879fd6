use crate::errors::TesseraResult;
use crate::tile::{KnowledgeTile, TileId};

/// Mutation applied to a tile inside an optimistic update.
pub type TileMutator<'a> = dyn FnMut(&mut KnowledgeTile) -> TesseraResult<()> + 'a;

/// Persistent tile storage: lookup, append, optimistic update.
pub trait ITileStorage: Send + Sync {
    // --- Read ---
    fn get(&self, id: &TileId) -> TesseraResult<KnowledgeTile>;
    fn contains(&self, id: &TileId) -> TesseraResult<bool>;
    fn ids(&self) -> TesseraResult<Vec<TileId>>;

    // --- Write ---
    /// Store a tile that does not exist yet.
    fn put(&self, tile: &KnowledgeTile) -> TesseraResult<()>;

    /// Apply `mutator` if the stored version still equals `expected_version`.
    /// Returns the stored tile with its version bumped by one.
    fn update_dyn(
        &self,
        id: &TileId,
        expected_version: u64,
        mutator: &mut TileMutator<'_>,
    ) -> TesseraResult<KnowledgeTile>;
}
