use criterion::{criterion_group, criterion_main, Criterion};

use tessera_core::config::SpatialConfig;
use tessera_core::tile::Coordinates;
use tessera_spatial::SpatialIndex;
use test_fixtures::spread_tiles;

fn populated(n: usize) -> SpatialIndex {
    let index = SpatialIndex::new(&SpatialConfig::default()).unwrap();
    for tile in spread_tiles("general", n) {
        index.upsert(&tile).unwrap();
    }
    index
}

fn bench_nearest_10k(c: &mut Criterion) {
    let index = populated(10_000);
    let query = Coordinates::new(64.0, 420.0, 37.0);

    c.bench_function("nearest_k5_10k_tiles", |b| {
        b.iter(|| index.nearest(&query, 5, "general").unwrap());
    });
}

fn bench_upsert(c: &mut Criterion) {
    let index = populated(10_000);
    let mut tiles = spread_tiles("general", 1);
    let tile = &mut tiles[0];

    c.bench_function("upsert_move_10k_tiles", |b| {
        b.iter(|| {
            tile.coordinates.certainty = if tile.coordinates.certainty > 60.0 { 40.0 } else { 80.0 };
            index.upsert(tile).unwrap();
        });
    });
}

fn bench_rebuild(c: &mut Criterion) {
    let index = SpatialIndex::new(&SpatialConfig::default()).unwrap();
    let tiles = spread_tiles("general", 10_000);

    c.bench_function("rebuild_10k_tiles", |b| {
        b.iter(|| index.rebuild("general", &tiles).unwrap());
    });
}

criterion_group!(benches, bench_nearest_10k, bench_upsert, bench_rebuild);
criterion_main!(benches);
