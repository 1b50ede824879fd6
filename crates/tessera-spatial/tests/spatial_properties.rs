//! Property tests for nearest-neighbor ordering and completeness.

use proptest::prelude::*;

use tessera_core::config::{DomainSchema, SpatialConfig};
use tessera_core::tile::{Coordinates, TileId};
use tessera_spatial::DomainIndex;

fn arb_point() -> impl Strategy<Value = Coordinates> {
    (0.0f64..=100.0, 1.0f64..=1000.0, 0.0f64..=100.0).prop_map(|(c, g, v)| Coordinates::new(c, g, v))
}

fn arb_config() -> impl Strategy<Value = SpatialConfig> {
    (1u32..24, 1u32..6, 0.0f64..20.0).prop_map(|(cells, coarse, penalty)| SpatialConfig {
        cells_per_axis: cells,
        coarse_factor: coarse,
        low_certainty_penalty: penalty,
        ..SpatialConfig::default()
    })
}

proptest! {
    #[test]
    fn nearest_is_bounded_and_sorted(
        config in arb_config(),
        points in prop::collection::vec(arb_point(), 0..120),
        query in arb_point(),
        k in 0usize..20,
    ) {
        let mut index = DomainIndex::new(DomainSchema::default(), &config);
        for (i, p) in points.iter().enumerate() {
            index.upsert(TileId::new(format!("t{i:03}")), *p).unwrap();
        }
        let hits = index.nearest(&query, k);
        prop_assert!(hits.len() <= k);
        prop_assert_eq!(hits.len(), k.min(points.len()));
        for pair in hits.windows(2) {
            prop_assert!(pair[0].distance <= pair[1].distance);
            if pair[0].distance == pair[1].distance {
                prop_assert!(pair[0].tile_id < pair[1].tile_id);
            }
        }
    }

    #[test]
    fn precise_tiles_match_brute_force(
        config in arb_config(),
        points in prop::collection::vec((30.5f64..=100.0, 1.0f64..=1000.0, 0.0f64..=100.0), 1..150),
        query in arb_point(),
        k in 1usize..15,
    ) {
        let mut index = DomainIndex::new(DomainSchema::default(), &config);
        let mut expected = Vec::new();
        for (i, (c, g, v)) in points.iter().enumerate() {
            let id = TileId::new(format!("t{i:03}"));
            let p = Coordinates::new(*c, *g, *v);
            index.upsert(id.clone(), p).unwrap();
            expected.push((query.distance(&p), id));
        }
        expected.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        expected.truncate(k);

        let got: Vec<TileId> = index.nearest(&query, k).into_iter().map(|n| n.tile_id).collect();
        let want: Vec<TileId> = expected.into_iter().map(|(_, id)| id).collect();
        prop_assert_eq!(got, want);
    }
}
