use serde::{Deserialize, Serialize};

use crate::errors::TesseraResult;
use crate::tile::{Coordinates, KnowledgeTile};

/// A tile returned by a proximity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedTile {
    pub tile: KnowledgeTile,
    pub distance: f64,
}

/// Result of mapping a question into a domain and querying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retrieval {
    pub query_point: Coordinates,
    /// Nearest first.
    pub tiles: Vec<RetrievedTile>,
}

/// Maps a question to a query point and returns the nearest tiles of a domain.
pub trait ITileRetriever: Send + Sync {
    fn retrieve(&self, question: &str, domain: &str, k: usize) -> TesseraResult<Retrieval>;
}
