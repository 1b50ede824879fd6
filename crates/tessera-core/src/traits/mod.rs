//! Seams between subsystems and toward external collaborators.

mod axis_scorer;
mod cancellation;
mod complexity;
mod generation;
mod retriever;
mod reviewer;
mod storage;

pub use axis_scorer::IAxisScorer;
pub use cancellation::{Cancellable, CancellationToken};
pub use complexity::{ComplexityEstimate, IComplexityEstimator};
pub use generation::{ChunkStream, ContextTile, GenerationOutput, GenerationRequest, IGenerationProvider};
pub use retriever::{ITileRetriever, Retrieval, RetrievedTile};
pub use reviewer::{IReviewerProvider, VerifierIdentity};
pub use storage::{ITileStorage, TileMutator};
