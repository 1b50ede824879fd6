use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::errors::JudgeError;
use crate::tile::TileId;

/// A retrieved tile as handed to the generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextTile {
    pub tile_id: TileId,
    pub topic: String,
    /// Content, truncated to the configured context budget.
    pub content: String,
    pub certainty: f64,
}

/// One call into the generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub domain: String,
    /// Empty in the basic lane.
    pub context: Vec<ContextTile>,
    /// Set on correction iterations; describes what failed last time.
    pub corrective_instruction: Option<String>,
    /// 1-based provider call number within the request.
    pub attempt: u32,
}

/// Finite, producer-driven sequence of text chunks.
pub struct ChunkStream {
    inner: Box<dyn Iterator<Item = String> + Send>,
}

impl ChunkStream {
    pub fn new<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send + 'static,
    {
        Self {
            inner: Box::new(chunks.into_iter()),
        }
    }

    /// A single-chunk stream.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(std::iter::once(text.into()))
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }
}

impl Iterator for ChunkStream {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }
}

impl fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkStream").finish_non_exhaustive()
    }
}

/// What the provider returns: streamed text plus optional self-assessment.
#[derive(Debug)]
pub struct GenerationOutput {
    pub chunks: ChunkStream,
    /// Provider's own confidence in [0, 1], if it reports one.
    pub self_confidence: Option<f64>,
}

impl GenerationOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            chunks: ChunkStream::from_text(text),
            self_confidence: None,
        }
    }
}

/// External text generator. The only suspension point of the judge pipeline.
pub trait IGenerationProvider: Send + Sync {
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = Result<GenerationOutput, JudgeError>> + Send;
}
