use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use sweep_chunk::{TileDelta, TileRef};
use sweep_geom::PartitionKey;
use sweep_pool::ChunkSlotPool;
use sweep_protocol::Action;

const PARTITION: usize = 16;

fn resolve(id: &str) -> TileRef {
    TileRef(id.len() as u16)
}

fn add(x: i64, y: i64) -> Action {
    Action::Add {
        key: PartitionKey::new(x, y),
        tiles: vec!["c".to_string(); PARTITION * PARTITION],
    }
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_churn");
    // Scroll a 8x8 window one column to the right, 64 times.
    group.bench_function("scroll_8x8_window", |b| {
        b.iter(|| {
            let mut pool = ChunkSlotPool::new(PARTITION, 96);
            for y in 0..8 {
                for x in 0..8 {
                    pool.apply_action(&add(x, y), &resolve).unwrap();
                }
            }
            for step in 0..64i64 {
                for y in 0..8 {
                    pool.apply_action(&Action::Remove { key: PartitionKey::new(step, y) }, &resolve)
                        .unwrap();
                    pool.apply_action(&add(step + 8, y), &resolve).unwrap();
                }
            }
            black_box(pool.stats());
        })
    });
    group.finish();
}

fn bench_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_update");
    let mut pool = ChunkSlotPool::new(PARTITION, 16);
    let key = PartitionKey::new(-3, 7);
    pool.apply_action(&add(-3, 7), &resolve).unwrap();
    let update = Action::Update {
        key,
        color: None,
        deltas: (0..PARTITION)
            .map(|i| TileDelta { lx: i, ly: i, tile: "n4".to_string() })
            .collect(),
    };
    group.bench_function("diagonal_16", |b| {
        b.iter(|| {
            let out = pool.apply_action(black_box(&update), &resolve).unwrap();
            black_box(out);
        })
    });
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = bench_churn, bench_updates
}
criterion_main!(benches);
