//! One domain's index: exact points plus a fine grid for well-established
//! tiles and a coarse grid for low-certainty ones.

use std::collections::{BTreeSet, HashMap};

use rayon::prelude::*;

use tessera_core::config::{DomainSchema, SpatialConfig};
use tessera_core::errors::SpatialError;
use tessera_core::tile::{Axis, Coordinates, TileId};

use crate::grid::{shell_cells, shell_size, CellKey, GridSpec};

/// One query result.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub tile_id: TileId,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Fine(CellKey),
    Coarse(CellKey),
}

type Buckets = HashMap<CellKey, BTreeSet<TileId>>;

/// Spatial index for a single domain.
///
/// Tiles whose certainty exceeds the domain's low-certainty threshold are
/// bucketed on the fine grid and ranked by Euclidean distance. The rest are
/// bucketed on the coarse grid and ranked by the distance to their bucket's
/// center plus a configured penalty.
#[derive(Debug, Clone)]
pub struct DomainIndex {
    schema: DomainSchema,
    fine: GridSpec,
    coarse: GridSpec,
    penalty: f64,
    points: HashMap<TileId, Coordinates>,
    fine_cells: Buckets,
    coarse_cells: Buckets,
    fine_len: usize,
}

impl DomainIndex {
    pub fn new(schema: DomainSchema, config: &SpatialConfig) -> Self {
        let cells = config.cells_per_axis.max(1);
        let coarse_cells = (cells / config.coarse_factor.max(1)).max(1);
        Self {
            fine: GridSpec::new(&schema, cells),
            coarse: GridSpec::new(&schema, coarse_cells),
            penalty: config.low_certainty_penalty,
            schema,
            points: HashMap::new(),
            fine_cells: HashMap::new(),
            coarse_cells: HashMap::new(),
            fine_len: 0,
        }
    }

    /// Build an index from scratch, validating and bucketing points in parallel.
    /// Later duplicates of an id replace earlier ones.
    pub fn build(
        schema: DomainSchema,
        config: &SpatialConfig,
        points: Vec<(TileId, Coordinates)>,
    ) -> Result<Self, SpatialError> {
        let mut index = Self::new(schema, config);
        let placed = points
            .into_par_iter()
            .map(|(id, point)| {
                index.check_point(&point)?;
                let placement = index.placement_of(&point);
                Ok((id, point, placement))
            })
            .collect::<Result<Vec<_>, SpatialError>>()?;
        for (id, point, placement) in placed {
            index.insert_placed(id, point, placement);
        }
        Ok(index)
    }

    pub fn schema(&self) -> &DomainSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, id: &TileId) -> bool {
        self.points.contains_key(id)
    }

    pub fn get_point(&self, id: &TileId) -> Option<Coordinates> {
        self.points.get(id).copied()
    }

    pub fn is_low_certainty(&self, point: &Coordinates) -> bool {
        point.certainty <= self.schema.low_certainty_threshold
    }

    /// Every axis must be finite and inside the domain's declared range.
    pub fn check_point(&self, point: &Coordinates) -> Result<(), SpatialError> {
        for axis in Axis::ALL {
            let value = point.get(axis);
            if !value.is_finite() {
                return Err(SpatialError::NotFinite {
                    axis: axis.to_string(),
                });
            }
            let range = self.schema.range(axis);
            if !range.contains(value) {
                return Err(SpatialError::OutOfRange {
                    axis: axis.to_string(),
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }

    /// Insert or move a tile. Returns its previous point.
    pub fn upsert(&mut self, id: TileId, point: Coordinates) -> Result<Option<Coordinates>, SpatialError> {
        self.check_point(&point)?;
        let placement = self.placement_of(&point);
        Ok(self.insert_placed(id, point, placement))
    }

    pub fn remove(&mut self, id: &TileId) -> Option<Coordinates> {
        let point = self.points.remove(id)?;
        let placement = self.placement_of(&point);
        let (buckets, key) = match placement {
            Placement::Fine(key) => {
                self.fine_len -= 1;
                (&mut self.fine_cells, key)
            }
            Placement::Coarse(key) => (&mut self.coarse_cells, key),
        };
        if let Some(ids) = buckets.get_mut(&key) {
            ids.remove(id);
            if ids.is_empty() {
                buckets.remove(&key);
            }
        }
        Some(point)
    }

    /// The `k` nearest tiles to `query`, ordered by distance then tile id.
    /// The query point is clamped into the domain's ranges first.
    pub fn nearest(&self, query: &Coordinates, k: usize) -> Vec<Neighbor> {
        if k == 0 || self.points.is_empty() {
            return Vec::new();
        }
        let query = self.clamp_point(query);
        let mut found = self.nearest_coarse(&query, k);
        found.extend(self.nearest_fine(&query, k));
        sort_neighbors(&mut found);
        found.truncate(k);
        found
    }

    fn clamp_point(&self, point: &Coordinates) -> Coordinates {
        let mut clamped = *point;
        for axis in Axis::ALL {
            clamped.set(axis, self.schema.range(axis).clamp(point.get(axis)));
        }
        clamped
    }

    fn placement_of(&self, point: &Coordinates) -> Placement {
        if self.is_low_certainty(point) {
            Placement::Coarse(self.coarse.cell_of(point))
        } else {
            Placement::Fine(self.fine.cell_of(point))
        }
    }

    fn insert_placed(&mut self, id: TileId, point: Coordinates, placement: Placement) -> Option<Coordinates> {
        let previous = self.remove(&id);
        let buckets = match placement {
            Placement::Fine(key) => {
                self.fine_len += 1;
                self.fine_cells.entry(key)
            }
            Placement::Coarse(key) => self.coarse_cells.entry(key),
        };
        buckets.or_default().insert(id.clone());
        self.points.insert(id, point);
        previous
    }

    /// Expand Chebyshev shells around the query cell until no unvisited cell
    /// can hold anything closer than the current k-th candidate. Falls back to
    /// scanning occupied buckets once a shell would visit more cells than
    /// there are occupied buckets.
    fn nearest_fine(&self, query: &Coordinates, k: usize) -> Vec<Neighbor> {
        if self.fine_len == 0 {
            return Vec::new();
        }
        let center = self.fine.cell_of(query);
        let width = self.fine.min_cell_width();
        let mut found = Vec::new();
        let mut seen = 0usize;
        for radius in 0..self.fine.cells() {
            if shell_size(radius) > self.fine_cells.len() as u64 {
                return self.scan_fine(query, k);
            }
            for key in shell_cells(center, radius, self.fine.cells()) {
                let Some(ids) = self.fine_cells.get(&key) else {
                    continue;
                };
                seen += ids.len();
                found.extend(self.neighbors_in(query, ids));
            }
            if seen >= self.fine_len {
                break;
            }
            if found.len() >= k {
                sort_neighbors(&mut found);
                found.truncate(k);
                // Cells in the next shell are at least `radius` whole cells away.
                let bound = radius as f64 * width;
                if width > 0.0 && found[k - 1].distance < bound {
                    break;
                }
            }
        }
        found
    }

    fn scan_fine(&self, query: &Coordinates, k: usize) -> Vec<Neighbor> {
        let mut found: Vec<Neighbor> = self
            .fine_cells
            .values()
            .flat_map(|ids| self.neighbors_in(query, ids))
            .collect();
        sort_neighbors(&mut found);
        found.truncate(k);
        found
    }

    fn neighbors_in<'a>(
        &'a self,
        query: &'a Coordinates,
        ids: &'a BTreeSet<TileId>,
    ) -> impl Iterator<Item = Neighbor> + 'a {
        ids.iter().filter_map(move |id| {
            self.points.get(id).map(|point| Neighbor {
                tile_id: id.clone(),
                distance: query.distance(point),
            })
        })
    }

    /// Rank coarse buckets by center distance; every tile in a bucket shares it.
    fn nearest_coarse(&self, query: &Coordinates, k: usize) -> Vec<Neighbor> {
        let mut buckets: Vec<(f64, &BTreeSet<TileId>)> = self
            .coarse_cells
            .iter()
            .map(|(key, ids)| (query.distance(&self.coarse.center(*key)) + self.penalty, ids))
            .collect();
        buckets.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut found = Vec::new();
        for (distance, ids) in buckets {
            if found.len() >= k && found.last().map_or(false, |n: &Neighbor| distance > n.distance) {
                break;
            }
            found.extend(ids.iter().map(|id| Neighbor {
                tile_id: id.clone(),
                distance,
            }));
        }
        found
    }
}

fn sort_neighbors(found: &mut [Neighbor]) {
    found.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.tile_id.cmp(&b.tile_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> DomainIndex {
        DomainIndex::new(DomainSchema::default(), &SpatialConfig::default())
    }

    fn id(s: &str) -> TileId {
        TileId::new(s)
    }

    #[test]
    fn nearest_orders_by_distance_then_id() {
        let mut idx = index();
        idx.upsert(id("far"), Coordinates::new(90.0, 900.0, 90.0)).unwrap();
        idx.upsert(id("b"), Coordinates::new(50.0, 100.0, 50.0)).unwrap();
        idx.upsert(id("a"), Coordinates::new(50.0, 100.0, 50.0)).unwrap();
        idx.upsert(id("near"), Coordinates::new(55.0, 100.0, 50.0)).unwrap();

        let hits = idx.nearest(&Coordinates::new(50.0, 100.0, 50.0), 3);
        let ids: Vec<&str> = hits.iter().map(|n| n.tile_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "near"]);
        assert_eq!(hits[2].distance, 5.0);
    }

    #[test]
    fn upsert_moves_a_tile() {
        let mut idx = index();
        idx.upsert(id("t"), Coordinates::new(40.0, 10.0, 10.0)).unwrap();
        let previous = idx.upsert(id("t"), Coordinates::new(80.0, 800.0, 80.0)).unwrap();
        assert_eq!(previous, Some(Coordinates::new(40.0, 10.0, 10.0)));
        assert_eq!(idx.len(), 1);
        let hits = idx.nearest(&Coordinates::new(80.0, 800.0, 80.0), 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn out_of_range_points_are_rejected() {
        let mut idx = index();
        let err = idx.upsert(id("t"), Coordinates::new(101.0, 10.0, 10.0)).unwrap_err();
        assert!(matches!(err, SpatialError::OutOfRange { .. }));
        let err = idx.upsert(id("t"), Coordinates::new(50.0, f64::NAN, 10.0)).unwrap_err();
        assert!(matches!(err, SpatialError::NotFinite { .. }));
        assert!(idx.is_empty());
    }

    #[test]
    fn low_certainty_tiles_use_bucket_distance() {
        let config = SpatialConfig {
            low_certainty_penalty: 7.0,
            ..SpatialConfig::default()
        };
        let mut idx = DomainIndex::new(DomainSchema::default(), &config);
        let point = Coordinates::new(20.0, 300.0, 40.0);
        idx.upsert(id("low"), point).unwrap();
        let hits = idx.nearest(&point, 1);
        // Coarse grid of 4 cells: bucket [0, 1, 1] has center (12.5, 375.625, 37.5).
        let center = Coordinates::new(12.5, 1.0 + 1.5 * 249.75, 37.5);
        assert!((hits[0].distance - (point.distance(&center) + 7.0)).abs() < 1e-9);
    }

    #[test]
    fn remove_forgets_the_tile() {
        let mut idx = index();
        idx.upsert(id("x"), Coordinates::new(20.0, 10.0, 10.0)).unwrap();
        idx.upsert(id("y"), Coordinates::new(70.0, 10.0, 10.0)).unwrap();
        assert!(idx.remove(&id("x")).is_some());
        assert!(idx.remove(&id("x")).is_none());
        let hits = idx.nearest(&Coordinates::new(20.0, 10.0, 10.0), 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tile_id, id("y"));
    }

    #[test]
    fn query_outside_ranges_is_clamped() {
        let mut idx = index();
        idx.upsert(id("edge"), Coordinates::new(100.0, 1000.0, 100.0)).unwrap();
        let hits = idx.nearest(&Coordinates::new(500.0, 5000.0, 500.0), 1);
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn build_matches_incremental_inserts() {
        let points: Vec<(TileId, Coordinates)> = (0..200)
            .map(|i| {
                let c = (i * 7 % 101) as f64;
                let g = 1.0 + (i * 13 % 999) as f64;
                let v = (i * 3 % 101) as f64;
                (TileId::new(format!("p{i:03}")), Coordinates::new(c, g, v))
            })
            .collect();
        let built = DomainIndex::build(DomainSchema::default(), &SpatialConfig::default(), points.clone()).unwrap();
        let mut incremental = index();
        for (id, point) in points {
            incremental.upsert(id, point).unwrap();
        }
        let q = Coordinates::new(33.0, 420.0, 66.0);
        assert_eq!(built.nearest(&q, 10), incremental.nearest(&q, 10));
        assert_eq!(built.len(), 200);
    }

    #[test]
    fn sparse_fine_grid_stops_once_every_tile_is_seen() {
        let config = SpatialConfig {
            cells_per_axis: 1024,
            ..SpatialConfig::default()
        };
        let mut idx = DomainIndex::new(DomainSchema::default(), &config);
        idx.upsert(id("a"), Coordinates::new(60.0, 500.0, 50.0)).unwrap();
        idx.upsert(id("b"), Coordinates::new(90.0, 10.0, 90.0)).unwrap();
        idx.upsert(id("low"), Coordinates::new(5.0, 500.0, 50.0)).unwrap();
        assert_eq!(idx.fine_len, 2);

        let started = std::time::Instant::now();
        let hits = idx.nearest(&Coordinates::new(50.0, 500.0, 50.0), 5);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        let ids: Vec<&str> = hits.iter().map(|n| n.tile_id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], "a");
        assert!(ids.contains(&"b") && ids.contains(&"low"));

        idx.remove(&id("a"));
        idx.remove(&id("b"));
        assert_eq!(idx.fine_len, 0);
        assert_eq!(idx.nearest(&Coordinates::new(50.0, 500.0, 50.0), 5).len(), 1);
    }

    #[test]
    fn k_zero_returns_nothing() {
        let mut idx = index();
        idx.upsert(id("x"), Coordinates::new(50.0, 10.0, 10.0)).unwrap();
        assert!(idx.nearest(&Coordinates::new(50.0, 10.0, 10.0), 0).is_empty());
    }
}
