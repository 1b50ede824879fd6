//! Scripted stand-ins for the external collaborators of the judge pipeline
//! and the mark manager.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tessera_core::config::DomainSchema;
use tessera_core::errors::{JudgeError, TesseraError, TesseraResult, VerificationError};
use tessera_core::tile::{Coordinates, KnowledgeTile, TileId};
use tessera_core::traits::{
    ChunkStream, ComplexityEstimate, GenerationOutput, GenerationRequest, IComplexityEstimator,
    IGenerationProvider, IReviewerProvider, ITileRetriever, ITileStorage, Retrieval, RetrievedTile,
    TileMutator, VerifierIdentity,
};

/// One scripted provider response.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Return `text` split on whitespace into chunks.
    Answer { text: String, self_confidence: Option<f64> },
    /// Sleep for `delay` before answering.
    Slow { delay: Duration, text: String },
    /// Report a provider-side timeout.
    Timeout,
    /// Fail with a provider error.
    Fail(String),
}

impl ScriptStep {
    pub fn answer(text: &str) -> Self {
        Self::Answer {
            text: text.to_string(),
            self_confidence: None,
        }
    }
}

/// Generation provider that replays a script. The last step repeats once the
/// script runs out.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<ScriptStep>>,
    last: Mutex<Option<ScriptStep>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Self::default()
        }
    }

    /// Always answers with `text`.
    pub fn always(text: &str) -> Self {
        Self::new(vec![ScriptStep::answer(text)])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_step(&self) -> ScriptStep {
        let popped = self.steps.lock().ok().and_then(|mut s| s.pop_front());
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match popped {
            Some(step) => {
                *last = Some(step.clone());
                step
            }
            None => last
                .clone()
                .unwrap_or_else(|| ScriptStep::Fail("empty script".to_string())),
        }
    }
}

fn chunked(text: &str) -> ChunkStream {
    let chunks: Vec<String> = text
        .split_inclusive(' ')
        .map(|s| s.to_string())
        .collect();
    ChunkStream::new(chunks)
}

impl IGenerationProvider for ScriptedProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        match self.next_step() {
            ScriptStep::Answer {
                text,
                self_confidence,
            } => Ok(GenerationOutput {
                chunks: chunked(&text),
                self_confidence,
            }),
            ScriptStep::Slow { delay, text } => {
                tokio::time::sleep(delay).await;
                Ok(GenerationOutput {
                    chunks: chunked(&text),
                    self_confidence: None,
                })
            }
            ScriptStep::Timeout => Err(JudgeError::GenerationTimeout { timeout_ms: 0 }),
            ScriptStep::Fail(reason) => Err(JudgeError::ProviderFailed { reason }),
        }
    }
}

/// Retriever that returns a fixed tile list and counts calls.
#[derive(Debug, Default)]
pub struct CountingRetriever {
    tiles: Vec<KnowledgeTile>,
    calls: AtomicUsize,
}

impl CountingRetriever {
    pub fn new(tiles: Vec<KnowledgeTile>) -> Self {
        Self {
            tiles,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ITileRetriever for CountingRetriever {
    fn retrieve(&self, _question: &str, domain: &str, k: usize) -> TesseraResult<Retrieval> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tiles = self
            .tiles
            .iter()
            .filter(|t| t.domain == domain)
            .take(k)
            .enumerate()
            .map(|(i, tile)| RetrievedTile {
                tile: tile.clone(),
                distance: i as f64,
            })
            .collect();
        Ok(Retrieval {
            query_point: Coordinates::new(50.0, 50.0, 50.0),
            tiles,
        })
    }
}

/// Complexity estimator that ignores the question.
#[derive(Debug, Clone, Copy)]
pub struct FixedComplexity(pub f64);

impl IComplexityEstimator for FixedComplexity {
    fn estimate(&self, _question: &str, _domain: &DomainSchema) -> ComplexityEstimate {
        ComplexityEstimate {
            complexity: self.0,
            domain_fit: 1.0,
        }
    }
}

/// Reviewer provider backed by a fixed caller table.
#[derive(Debug, Default, Clone)]
pub struct StaticReviewerProvider {
    callers: HashMap<String, VerifierIdentity>,
}

impl StaticReviewerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expert(mut self, caller: &str) -> Self {
        self.callers
            .insert(caller.to_string(), VerifierIdentity::expert(caller));
        self
    }

    pub fn with_community(mut self, caller: &str) -> Self {
        self.callers
            .insert(caller.to_string(), VerifierIdentity::community(caller));
        self
    }
}

impl IReviewerProvider for StaticReviewerProvider {
    fn resolve(&self, caller: &str, _domain: &str) -> Result<VerifierIdentity, VerificationError> {
        self.callers
            .get(caller)
            .cloned()
            .ok_or_else(|| VerificationError::Unauthenticated {
                caller: caller.to_string(),
            })
    }
}

/// In-memory tile storage with the same optimistic-update contract as the
/// container store.
#[derive(Debug, Default)]
pub struct MemoryTileStorage {
    tiles: Mutex<HashMap<TileId, KnowledgeTile>>,
}

impl MemoryTileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tiles(tiles: Vec<KnowledgeTile>) -> Self {
        Self {
            tiles: Mutex::new(tiles.into_iter().map(|t| (t.id.clone(), t)).collect()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TileId, KnowledgeTile>> {
        match self.tiles.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ITileStorage for MemoryTileStorage {
    fn get(&self, id: &TileId) -> TesseraResult<KnowledgeTile> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| TesseraError::tile_not_found(id.as_str()))
    }

    fn contains(&self, id: &TileId) -> TesseraResult<bool> {
        Ok(self.lock().contains_key(id))
    }

    fn ids(&self) -> TesseraResult<Vec<TileId>> {
        let mut ids: Vec<TileId> = self.lock().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn put(&self, tile: &KnowledgeTile) -> TesseraResult<()> {
        let mut tiles = self.lock();
        if tiles.contains_key(&tile.id) {
            return Err(TesseraError::InvalidTile {
                id: tile.id.to_string(),
                reason: "duplicate".to_string(),
            });
        }
        tiles.insert(tile.id.clone(), tile.clone());
        Ok(())
    }

    fn update_dyn(
        &self,
        id: &TileId,
        expected_version: u64,
        mutator: &mut TileMutator<'_>,
    ) -> TesseraResult<KnowledgeTile> {
        let mut tiles = self.lock();
        let current = tiles
            .get(id)
            .cloned()
            .ok_or_else(|| TesseraError::tile_not_found(id.as_str()))?;
        if current.version != expected_version {
            return Err(TesseraError::ConcurrencyConflict {
                tile_id: id.to_string(),
                expected: expected_version,
                actual: current.version,
            });
        }
        let mut next = current.clone();
        mutator(&mut next)?;
        if next.verification.kind < current.verification.kind {
            return Err(VerificationError::MarkRegression {
                tile_id: id.to_string(),
                current: current.verification.kind,
                proposed: next.verification.kind,
            }
            .into());
        }
        next.version = current.version + 1;
        tiles.insert(id.clone(), next.clone());
        Ok(next)
    }
}
