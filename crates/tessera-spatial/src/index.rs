//! All domain indexes behind one reader/writer lock.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rayon::prelude::*;

use tessera_core::config::{DomainSchema, SpatialConfig};
use tessera_core::errors::{SpatialError, TesseraError, TesseraResult};
use tessera_core::tile::{Coordinates, KnowledgeTile, TileId};

use crate::domain_index::{DomainIndex, Neighbor};

/// Per-domain spatial indexes. Queries never cross domains.
///
/// Queries hold the read lock for their whole duration, so they see either the
/// old or the new coordinate of a tile being moved, never a mix.
#[derive(Debug)]
pub struct SpatialIndex {
    config: SpatialConfig,
    domains: RwLock<BTreeMap<String, DomainIndex>>,
}

impl SpatialIndex {
    /// Create an index with every domain declared in `config`.
    pub fn new(config: &SpatialConfig) -> TesseraResult<Self> {
        let index = Self {
            config: config.clone(),
            domains: RwLock::new(BTreeMap::new()),
        };
        for schema in &config.domains {
            index.register_domain(schema.clone())?;
        }
        Ok(index)
    }

    pub fn register_domain(&self, schema: DomainSchema) -> TesseraResult<()> {
        let mut domains = self.write()?;
        if domains.contains_key(&schema.code) {
            return Err(SpatialError::DuplicateDomain { domain: schema.code }.into());
        }
        tracing::debug!(domain = %schema.code, "domain registered");
        let code = schema.code.clone();
        domains.insert(code, DomainIndex::new(schema, &self.config));
        Ok(())
    }

    pub fn schema(&self, domain: &str) -> TesseraResult<DomainSchema> {
        let domains = self.read()?;
        Ok(lookup(&domains, domain)?.schema().clone())
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        self.read().map(|d| d.contains_key(domain)).unwrap_or(false)
    }

    /// Registered domain codes, sorted.
    pub fn domains(&self) -> TesseraResult<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    /// Insert or move a tile at its stored coordinate.
    pub fn upsert(&self, tile: &KnowledgeTile) -> TesseraResult<()> {
        self.upsert_point(&tile.domain, tile.id.clone(), tile.coordinates)
    }

    pub fn upsert_point(&self, domain: &str, id: TileId, point: Coordinates) -> TesseraResult<()> {
        let mut domains = self.write()?;
        let index = lookup_mut(&mut domains, domain)?;
        index.upsert(id, point)?;
        Ok(())
    }

    /// Returns whether the tile was indexed.
    pub fn remove(&self, domain: &str, id: &TileId) -> TesseraResult<bool> {
        let mut domains = self.write()?;
        Ok(lookup_mut(&mut domains, domain)?.remove(id).is_some())
    }

    pub fn get_point(&self, domain: &str, id: &TileId) -> TesseraResult<Option<Coordinates>> {
        let domains = self.read()?;
        Ok(lookup(&domains, domain)?.get_point(id))
    }

    /// At most `k` tiles of `domain`, non-decreasing by distance, ties by id.
    pub fn nearest(&self, query: &Coordinates, k: usize, domain: &str) -> TesseraResult<Vec<Neighbor>> {
        let _span = tessera_core::spatial_span!(domain, k).entered();
        let domains = self.read()?;
        let hits = lookup(&domains, domain)?.nearest(query, k);
        tracing::debug!(query = %query, hits = hits.len(), "nearest");
        Ok(hits)
    }

    pub fn len(&self, domain: &str) -> TesseraResult<usize> {
        let domains = self.read()?;
        Ok(lookup(&domains, domain)?.len())
    }

    pub fn total_len(&self) -> TesseraResult<usize> {
        Ok(self.read()?.values().map(DomainIndex::len).sum())
    }

    /// Replace a domain's index with one built from `tiles`.
    pub fn rebuild(&self, domain: &str, tiles: &[KnowledgeTile]) -> TesseraResult<usize> {
        let schema = self.schema(domain)?;
        if let Some(stray) = tiles.iter().find(|t| t.domain != domain) {
            return Err(SpatialError::DomainMismatch {
                tile_id: stray.id.to_string(),
                expected: domain.to_string(),
                actual: stray.domain.clone(),
            }
            .into());
        }
        let points = tiles.iter().map(|t| (t.id.clone(), t.coordinates)).collect();
        let built = DomainIndex::build(schema, &self.config, points)?;
        let count = built.len();
        self.write()?.insert(domain.to_string(), built);
        tracing::info!(domain = %domain, tiles = count, "domain index rebuilt");
        Ok(count)
    }

    /// Rebuild every registered domain from a full tile set, in parallel.
    /// Tiles of unregistered domains are skipped with a warning.
    pub fn rebuild_all(&self, tiles: &[KnowledgeTile]) -> TesseraResult<usize> {
        let codes = self.domains()?;
        let mut grouped: BTreeMap<&str, Vec<KnowledgeTile>> =
            codes.iter().map(|c| (c.as_str(), Vec::new())).collect();
        for tile in tiles {
            match grouped.get_mut(tile.domain.as_str()) {
                Some(group) => group.push(tile.clone()),
                None => tracing::warn!(
                    tile_id = %tile.id,
                    domain = %tile.domain,
                    "tile belongs to an unregistered domain, not indexed"
                ),
            }
        }
        let counts = grouped
            .into_par_iter()
            .map(|(domain, group)| self.rebuild(domain, &group))
            .collect::<TesseraResult<Vec<usize>>>()?;
        Ok(counts.into_iter().sum())
    }

    fn read(&self) -> TesseraResult<RwLockReadGuard<'_, BTreeMap<String, DomainIndex>>> {
        self.domains.read().map_err(|_| poisoned())
    }

    fn write(&self) -> TesseraResult<RwLockWriteGuard<'_, BTreeMap<String, DomainIndex>>> {
        self.domains.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> TesseraError {
    SpatialError::LockPoisoned {
        lock: "spatial domains".to_string(),
    }
    .into()
}

fn lookup<'a>(domains: &'a BTreeMap<String, DomainIndex>, domain: &str) -> TesseraResult<&'a DomainIndex> {
    domains
        .get(domain)
        .ok_or_else(|| TesseraError::domain_not_found(domain))
}

fn lookup_mut<'a>(
    domains: &'a mut BTreeMap<String, DomainIndex>,
    domain: &str,
) -> TesseraResult<&'a mut DomainIndex> {
    domains
        .get_mut(domain)
        .ok_or_else(|| TesseraError::domain_not_found(domain))
}
