use std::sync::Arc;

use tessera_core::errors::TesseraResult;
use tessera_core::traits::{ITileRetriever, ITileStorage, Retrieval, RetrievedTile};
use tessera_spatial::{QueryMapper, SpatialIndex};

/// Maps a question into a domain's space, asks the index for the nearest
/// tiles and loads them from storage.
pub struct SpatialRetriever {
    storage: Arc<dyn ITileStorage>,
    spatial: Arc<SpatialIndex>,
    mapper: QueryMapper,
}

impl SpatialRetriever {
    pub fn new(storage: Arc<dyn ITileStorage>, spatial: Arc<SpatialIndex>, mapper: QueryMapper) -> Self {
        Self {
            storage,
            spatial,
            mapper,
        }
    }
}

impl ITileRetriever for SpatialRetriever {
    fn retrieve(&self, question: &str, domain: &str, k: usize) -> TesseraResult<Retrieval> {
        let schema = self.spatial.schema(domain)?;
        let query_point = self.mapper.map(question, &schema);
        let neighbors = self.spatial.nearest(&query_point, k, domain)?;

        let mut tiles = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            match self.storage.get(&neighbor.tile_id) {
                Ok(tile) => tiles.push(RetrievedTile {
                    tile,
                    distance: neighbor.distance,
                }),
                // Indexed but no longer stored.
                Err(e) if e.is_not_found() => {
                    tracing::warn!(tile_id = %neighbor.tile_id, "indexed tile missing from store");
                }
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(domain, query = %query_point, hits = tiles.len(), "retrieved");
        Ok(Retrieval { query_point, tiles })
    }
}

impl std::fmt::Debug for SpatialRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialRetriever")
            .field("mapper", &self.mapper)
            .finish_non_exhaustive()
    }
}
