//! Applies verifications to stored tiles and keeps the spatial index in step.

use std::sync::{Arc, MutexGuard};

use chrono::Utc;

use tessera_core::config::MarksConfig;
use tessera_core::errors::{StorageError, TesseraResult, VerificationError};
use tessera_core::tile::{Confidence, KnowledgeTile, MarkKind, TileId, VerificationEvent, VerificationMark};
use tessera_core::tracing_setup::events;
use tessera_core::traits::{IAxisScorer, IReviewerProvider, ITileStorage, VerifierIdentity};
use tessera_spatial::{recompute_coordinates, SpatialIndex};

use crate::derivation::{confidence_floor, derive_mark, distinct_verifiers};
use crate::locks::TileLocks;

/// Result of applying one verification.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    /// The tile as stored after the call.
    pub tile: KnowledgeTile,
    pub previous: MarkKind,
    /// False when the verifier had already verified the tile.
    pub changed: bool,
}

impl VerificationOutcome {
    pub fn mark(&self) -> &VerificationMark {
        &self.tile.verification
    }
}

/// Verification mark manager.
///
/// Every mutation of a tile's mark takes that tile's lock, updates the stored
/// tile optimistically (one retry on a version conflict), then moves the tile
/// to its recomputed coordinate in the spatial index.
pub struct VerificationManager {
    storage: Arc<dyn ITileStorage>,
    spatial: Arc<SpatialIndex>,
    scorer: Arc<dyn IAxisScorer>,
    config: MarksConfig,
    locks: TileLocks,
}

impl VerificationManager {
    pub fn new(
        storage: Arc<dyn ITileStorage>,
        spatial: Arc<SpatialIndex>,
        scorer: Arc<dyn IAxisScorer>,
        config: MarksConfig,
    ) -> Self {
        Self {
            storage,
            spatial,
            scorer,
            config,
            locks: TileLocks::new(),
        }
    }

    pub fn locks(&self) -> &TileLocks {
        &self.locks
    }

    /// Record `verifier`'s verification of a tile and advance its mark.
    ///
    /// A verifier already in the tile's history changes nothing.
    pub fn apply_verification(
        &self,
        tile_id: &TileId,
        verifier: &VerifierIdentity,
    ) -> TesseraResult<VerificationOutcome> {
        let _span = tessera_core::verification_span!(tile_id, verifier.verifier_id).entered();
        let lease = self.locks.lock_for(tile_id);
        let _guard = lock_tile(lease.mutex())?;

        let current = self.storage.get(tile_id)?;
        if current.has_verifier(&verifier.verifier_id) {
            tracing::debug!("verifier already recorded, mark unchanged");
            return Ok(VerificationOutcome {
                previous: current.verification.kind,
                tile: current,
                changed: false,
            });
        }

        let previous = current.verification.kind;
        let updated = self.update_locked(current, verifier, |tile| {
            tile.verification_history.push(VerificationEvent {
                verifier_id: verifier.verifier_id.clone(),
                is_expert: verifier.is_expert,
                verified_at: Utc::now(),
            });
            Ok(derive_mark(&tile.verification_history, self.config.multi_expert_quorum))
        })?;

        Ok(VerificationOutcome {
            tile: updated,
            previous,
            changed: true,
        })
    }

    /// Resolve `caller` through the reviewer provider, then verify.
    pub fn apply_verification_for_caller(
        &self,
        tile_id: &TileId,
        caller: &str,
        reviewers: &dyn IReviewerProvider,
    ) -> TesseraResult<VerificationOutcome> {
        let domain = self.storage.get(tile_id)?.domain;
        let verifier = reviewers.resolve(caller, &domain)?;
        self.apply_verification(tile_id, &verifier)
    }

    /// Set a tile's mark to `proposed` on behalf of `verifier`.
    ///
    /// The proposal must not move the mark backward and must be justified by
    /// the history once `verifier` is included.
    pub fn propose_mark(
        &self,
        tile_id: &TileId,
        proposed: MarkKind,
        verifier: &VerifierIdentity,
    ) -> TesseraResult<VerificationOutcome> {
        let _span = tessera_core::verification_span!(tile_id, verifier.verifier_id).entered();
        let lease = self.locks.lock_for(tile_id);
        let _guard = lock_tile(lease.mutex())?;

        let current = self.storage.get(tile_id)?;
        let previous = current.verification.kind;
        if proposed < previous {
            return Err(VerificationError::MarkRegression {
                tile_id: tile_id.to_string(),
                current: previous,
                proposed,
            }
            .into());
        }
        if proposed == previous {
            return Ok(VerificationOutcome {
                tile: current,
                previous,
                changed: false,
            });
        }

        let updated = self.update_locked(current, verifier, |tile| {
            if !tile.has_verifier(&verifier.verifier_id) {
                tile.verification_history.push(VerificationEvent {
                    verifier_id: verifier.verifier_id.clone(),
                    is_expert: verifier.is_expert,
                    verified_at: Utc::now(),
                });
            }
            let justified = derive_mark(&tile.verification_history, self.config.multi_expert_quorum);
            if proposed > justified {
                return Err(VerificationError::Unjustified {
                    tile_id: tile.id.to_string(),
                    proposed,
                }
                .into());
            }
            Ok(proposed)
        })?;

        Ok(VerificationOutcome {
            tile: updated,
            previous,
            changed: true,
        })
    }

    /// Apply a content edit by `verifier` and count it as their verification,
    /// in one version bump.
    ///
    /// `edit` may run twice if the first write loses a version race.
    pub fn apply_edit<F>(
        &self,
        tile_id: &TileId,
        verifier: &VerifierIdentity,
        edit: F,
    ) -> TesseraResult<VerificationOutcome>
    where
        F: Fn(&mut KnowledgeTile) -> TesseraResult<()>,
    {
        let _span = tessera_core::verification_span!(tile_id, verifier.verifier_id).entered();
        let lease = self.locks.lock_for(tile_id);
        let _guard = lock_tile(lease.mutex())?;

        let current = self.storage.get(tile_id)?;
        let previous = current.verification.kind;
        let updated = self.update_locked(current, verifier, |tile| {
            edit(tile)?;
            if !tile.has_verifier(&verifier.verifier_id) {
                tile.verification_history.push(VerificationEvent {
                    verifier_id: verifier.verifier_id.clone(),
                    is_expert: verifier.is_expert,
                    verified_at: Utc::now(),
                });
            }
            let derived = derive_mark(&tile.verification_history, self.config.multi_expert_quorum);
            Ok(derived.max(tile.verification.kind))
        })?;

        Ok(VerificationOutcome {
            changed: updated.verification.kind != previous,
            tile: updated,
            previous,
        })
    }

    /// Optimistic update of a tile whose lock the caller holds. `decide` edits
    /// the history and returns the mark to apply; the rest of the mark, the
    /// confidence floor and the coordinate follow from it.
    fn update_locked<F>(
        &self,
        current: KnowledgeTile,
        verifier: &VerifierIdentity,
        decide: F,
    ) -> TesseraResult<KnowledgeTile>
    where
        F: Fn(&mut KnowledgeTile) -> TesseraResult<MarkKind>,
    {
        let schema = self.spatial.schema(&current.domain)?;
        let now = Utc::now();
        let mut apply = |tile: &mut KnowledgeTile| -> TesseraResult<()> {
            let kind = decide(tile)?;
            tile.verification.advance_to(tile.id.as_str(), kind)?;
            tile.verification.verifier_count = distinct_verifiers(&tile.verification_history) as u32;
            tile.verification.last_verifier_id = Some(verifier.verifier_id.clone());
            tile.verification.last_verified_at = Some(now);
            let floor = Confidence::new(confidence_floor(kind, &self.config));
            tile.confidence = tile.confidence.max(floor);
            tile.coordinates = recompute_coordinates(self.scorer.as_ref(), tile, &schema);
            Ok(())
        };

        let id = current.id.clone();
        let updated = match self.storage.update_dyn(&id, current.version, &mut apply) {
            Err(e) if e.is_conflict() => {
                tracing::debug!(tile_id = %id, "version conflict, retrying once");
                let fresh = self.storage.get(&id)?;
                self.storage.update_dyn(&id, fresh.version, &mut apply)?
            }
            other => other?,
        };

        self.spatial.upsert(&updated)?;
        if updated.verification.kind != current.verification.kind {
            events::mark_advanced(
                id.as_str(),
                current.verification.kind.as_str(),
                updated.verification.kind.as_str(),
            );
        }
        Ok(updated)
    }
}

fn lock_tile(lock: &std::sync::Mutex<()>) -> TesseraResult<MutexGuard<'_, ()>> {
    lock.lock()
        .map_err(|_| StorageError::poisoned("tile verification lock").into())
}

impl std::fmt::Debug for VerificationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationManager")
            .field("config", &self.config)
            .field("locked_tiles", &self.locks.len())
            .finish_non_exhaustive()
    }
}
