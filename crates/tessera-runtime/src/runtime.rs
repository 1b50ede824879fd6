//! TesseraRuntime: owns the store, index, mark manager and judge pool.
//!
//! Constructed once at startup and passed by reference. `shutdown` flushes
//! the container index and stops admitting judge requests.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use tessera_core::config::{DomainSchema, TesseraConfig};
use tessera_core::errors::{TesseraError, TesseraResult};
use tessera_core::tile::{KnowledgeTile, NewTile, TileId};
use tessera_core::traits::{
    CancellationToken, IAxisScorer, IComplexityEstimator, IGenerationProvider, IReviewerProvider,
    ITileStorage, VerifierIdentity,
};
use tessera_judge::{HeuristicComplexityEstimator, JudgePipeline, JudgePool};
use tessera_marks::{VerificationManager, VerificationOutcome};
use tessera_spatial::scorer::regranulate;
use tessera_spatial::{place_new_tile, QueryMapper, SpatialIndex, WeightedAxisScorer};
use tessera_storage::{ContainerStore, StoreStats};

use crate::ask::{answer_draft, AskOptions, AskOutcome};
use crate::export::{CountingWriter, ExportFormat, ExportSummary};
use crate::listing::{Page, PageRequest, TileFilter};
use crate::retriever::SpatialRetriever;

pub struct TesseraRuntime<P> {
    config: TesseraConfig,
    store: Arc<ContainerStore>,
    spatial: Arc<SpatialIndex>,
    scorer: Arc<dyn IAxisScorer>,
    marks: VerificationManager,
    judge: JudgePool<P>,
    reviewers: Arc<dyn IReviewerProvider>,
}

impl<P> TesseraRuntime<P>
where
    P: IGenerationProvider + 'static,
{
    /// Open the container named by `config.storage.container_path` (creating
    /// it if absent) and index every stored tile.
    pub fn open(
        config: TesseraConfig,
        provider: Arc<P>,
        reviewers: Arc<dyn IReviewerProvider>,
    ) -> TesseraResult<Self> {
        Self::open_with_estimator(
            config,
            provider,
            reviewers,
            Arc::new(HeuristicComplexityEstimator::new()),
        )
    }

    pub fn open_with_estimator(
        config: TesseraConfig,
        provider: Arc<P>,
        reviewers: Arc<dyn IReviewerProvider>,
        estimator: Arc<dyn IComplexityEstimator>,
    ) -> TesseraResult<Self> {
        config.validate()?;
        let path = Path::new(&config.storage.container_path);
        let _span = tracing::info_span!("runtime_open", path = %path.display()).entered();

        let store = Arc::new(ContainerStore::open_or_create(path, &config.storage)?);
        let spatial = Arc::new(SpatialIndex::new(&config.spatial)?);
        let scorer: Arc<dyn IAxisScorer> =
            Arc::new(WeightedAxisScorer::new(config.spatial.weights.clone()));

        let tiles = store.scan()?;
        let indexed = spatial.rebuild_all(&tiles)?;

        let storage: Arc<dyn ITileStorage> = store.clone();
        let mapper = QueryMapper::new(Arc::clone(&scorer), &config.spatial);
        let retriever = SpatialRetriever::new(Arc::clone(&storage), Arc::clone(&spatial), mapper);
        let pipeline = JudgePipeline::new(provider, Arc::new(retriever), estimator, config.judge.clone());
        let judge = JudgePool::new(Arc::new(pipeline));
        let marks = VerificationManager::new(
            storage,
            Arc::clone(&spatial),
            Arc::clone(&scorer),
            config.marks.clone(),
        );

        tracing::info!(tiles = tiles.len(), indexed, "runtime opened");
        Ok(Self {
            config,
            store,
            spatial,
            scorer,
            marks,
            judge,
            reviewers,
        })
    }

    /// Stop admitting judge requests, flush the index and close the store.
    pub fn shutdown(&self) -> TesseraResult<()> {
        self.judge.close();
        self.store.close()?;
        tracing::info!(path = %self.store.path().display(), "runtime shut down");
        Ok(())
    }

    pub fn config(&self) -> &TesseraConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ContainerStore> {
        &self.store
    }

    pub fn spatial(&self) -> &Arc<SpatialIndex> {
        &self.spatial
    }

    pub fn marks(&self) -> &VerificationManager {
        &self.marks
    }

    pub fn judge(&self) -> &JudgePool<P> {
        &self.judge
    }

    pub fn schema(&self, domain: &str) -> TesseraResult<DomainSchema> {
        self.spatial.schema(domain)
    }

    // --- Tiles ---

    pub fn get_tile(&self, id: &TileId) -> TesseraResult<KnowledgeTile> {
        self.store.get(id)
    }

    /// Tiles of `domain` matching `filter`, ordered by id.
    pub fn list_tiles(
        &self,
        domain: &str,
        filter: &TileFilter,
        page: PageRequest,
    ) -> TesseraResult<Page<KnowledgeTile>> {
        if !self.spatial.has_domain(domain) {
            return Err(TesseraError::domain_not_found(domain));
        }
        let mut matching: Vec<KnowledgeTile> = self
            .store
            .scan()?
            .into_iter()
            .filter(|t| t.domain == domain && filter.matches(t))
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Page::from_sorted(matching, page))
    }

    /// Place, store and index a new tile.
    pub fn create_tile(&self, draft: NewTile) -> TesseraResult<KnowledgeTile> {
        let schema = self.spatial.schema(&draft.domain)?;
        let tile = place_new_tile(self.scorer.as_ref(), draft, &schema, Utc::now());
        self.store.put(&tile)?;
        self.spatial.upsert(&tile)?;
        tracing::info!(tile_id = %tile.id, domain = %tile.domain, coordinates = %tile.coordinates, "tile created");
        Ok(tile)
    }

    /// Create a tile, or replace an existing tile's content.
    ///
    /// A new tile records `verifier` as its contributor. An edit counts as
    /// `verifier`'s verification, re-derives granularity from the new content
    /// and lands as a single version bump.
    pub fn put_or_update_tile(
        &self,
        id: Option<TileId>,
        mut draft: NewTile,
        verifier: &VerifierIdentity,
    ) -> TesseraResult<KnowledgeTile> {
        let existing = match &id {
            Some(id) if self.store.contains(id)? => Some(id.clone()),
            _ => None,
        };
        let Some(id) = existing else {
            draft.id = id.or(draft.id);
            draft.contributor_id = Some(verifier.verifier_id.clone());
            return self.create_tile(draft);
        };

        let current = self.store.get(&id)?;
        if !draft.domain.is_empty() && draft.domain != current.domain {
            return Err(TesseraError::InvalidTile {
                id: id.to_string(),
                reason: format!("cannot move from domain {} to {}", current.domain, draft.domain),
            });
        }
        let schema = self.spatial.schema(&current.domain)?;
        let granularity = regranulate(self.scorer.as_ref(), &draft.content, &schema);
        let outcome = self.marks.apply_edit(&id, verifier, |tile| {
            tile.content = draft.content.clone();
            if !draft.topic.is_empty() {
                tile.topic = draft.topic.clone();
            }
            if !draft.tags.is_empty() {
                tile.tags = draft.tags.clone();
            }
            tile.coordinates.granularity = granularity;
            Ok(())
        })?;
        tracing::info!(
            tile_id = %id,
            version = outcome.tile.version,
            mark = outcome.tile.verification.kind.as_str(),
            "tile edited"
        );
        Ok(outcome.tile)
    }

    /// Record `caller`'s verification, resolved through the reviewer provider.
    pub fn verify_tile(&self, id: &TileId, caller: &str) -> TesseraResult<VerificationOutcome> {
        self.marks
            .apply_verification_for_caller(id, caller, self.reviewers.as_ref())
    }

    // --- Questions ---

    /// Judge a question in `domain` on the worker pool.
    pub async fn ask(
        &self,
        question: &str,
        domain: &str,
        options: &AskOptions,
        cancel: &CancellationToken,
    ) -> TesseraResult<AskOutcome> {
        let schema = self.spatial.schema(domain)?;
        let result = self
            .judge
            .submit_with_token(question, schema, cancel.clone())
            .wait()
            .await?;

        let persisted = match answer_draft(question, &result, options) {
            Some(draft) => Some(self.create_tile(draft)?.id),
            None => None,
        };
        Ok(AskOutcome { result, persisted })
    }

    // --- Maintenance ---

    pub fn export<W: Write>(&self, format: ExportFormat, out: &mut W) -> TesseraResult<ExportSummary> {
        let mut counter = CountingWriter::new(out);
        let tiles = match format {
            ExportFormat::Container => {
                // Exported copy carries a current index block.
                self.store.flush()?;
                self.store.export_container(&mut counter)?;
                None
            }
            ExportFormat::JsonLines => Some(self.store.export_json_lines(&mut counter)?),
        };
        counter.flush()?;
        let summary = ExportSummary {
            format,
            bytes: counter.written(),
            tiles,
        };
        tracing::info!(format = ?format, bytes = summary.bytes, "exported");
        Ok(summary)
    }

    pub fn compact(&self) -> TesseraResult<StoreStats> {
        self.store.compact()?;
        self.store.stats()
    }

    pub fn stats(&self) -> TesseraResult<StoreStats> {
        self.store.stats()
    }
}

impl<P> std::fmt::Debug for TesseraRuntime<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TesseraRuntime")
            .field("store", &self.store)
            .field("judge", &self.judge)
            .finish_non_exhaustive()
    }
}
