use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use stakemod_checkpoint::CheckpointHistory;
use stakemod_types::BlockHeight;

fn make_history(n: u64) -> CheckpointHistory {
    let mut history = CheckpointHistory::new();
    for i in 0..n {
        history
            .write(i as u128 * 10, BlockHeight::new(i * 3))
            .unwrap();
    }
    history
}

fn bench_value_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("checkpoint_value_at");

    for len in [10u64, 1_000, 100_000] {
        let history = make_history(len);
        let query = BlockHeight::new(len * 3 / 2);

        group.bench_with_input(BenchmarkId::new("value_at", len), &len, |b, _| {
            b.iter(|| black_box(history.value_at(black_box(query))));
        });
    }

    group.finish();
}

fn bench_write(c: &mut Criterion) {
    c.bench_function("checkpoint_write_append", |b| {
        b.iter(|| {
            let mut history = CheckpointHistory::new();
            for i in 0..1_000u64 {
                history
                    .write(black_box(i as u128), BlockHeight::new(i))
                    .unwrap();
            }
            black_box(history.len())
        });
    });
}

criterion_group!(benches, bench_value_at, bench_write);
criterion_main!(benches);
