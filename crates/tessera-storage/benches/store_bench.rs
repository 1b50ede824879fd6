use criterion::{criterion_group, criterion_main, Criterion};

use tessera_core::config::StorageConfig;
use tessera_core::tile::TileId;
use tessera_storage::ContainerStore;
use test_fixtures::spread_tiles;

fn populated(dir: &tempfile::TempDir, n: usize) -> ContainerStore {
    let store = ContainerStore::create(&dir.path().join("bench.tess"), &StorageConfig::default()).unwrap();
    for tile in spread_tiles("general", n) {
        store.put(&tile).unwrap();
    }
    store.flush().unwrap();
    store
}

fn bench_cold_get(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let cfg = StorageConfig {
        hot_cache_capacity: 0,
        ..StorageConfig::default()
    };
    let path = {
        let store = populated(&dir, 1_000);
        store.close().unwrap();
        store.path().to_path_buf()
    };
    let store = ContainerStore::open(&path, &cfg).unwrap();
    let id = TileId::new("general-0500");

    c.bench_function("get_uncached_1k_tiles", |b| {
        b.iter(|| store.get(&id).unwrap());
    });
}

fn bench_append(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let store = populated(&dir, 100);
    let id = TileId::new("general-0050");

    c.bench_function("update_append", |b| {
        b.iter(|| {
            store
                .update_with_retry(&id, |t| {
                    t.topic.push('.');
                    Ok(())
                })
                .unwrap()
        });
    });
}

fn bench_open(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = {
        let store = populated(&dir, 1_000);
        store.close().unwrap();
        store.path().to_path_buf()
    };

    c.bench_function("open_1k_tiles", |b| {
        b.iter(|| ContainerStore::open(&path, &StorageConfig::default()).unwrap());
    });
}

criterion_group!(benches, bench_cold_get, bench_append, bench_open);
criterion_main!(benches);
