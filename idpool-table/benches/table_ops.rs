//! Benchmarks for dense table claim/release churn.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use idpool_table::Table;

fn bench_claim(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_claim");

    for size in [1024u64, 16384, 262144] {
        group.bench_with_input(BenchmarkId::new("explicit", size), &size, |b, &size| {
            b.iter(|| {
                let t: Table<u64> = Table::new(size);
                for id in 0..size {
                    t.claim(black_box(id), id).unwrap();
                }
                black_box(t.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("dynamic", size), &size, |b, &size| {
            b.iter(|| {
                let t: Table<u64> = Table::new(size);
                for _ in 0..size {
                    t.claim_dynamic(0).unwrap();
                }
                black_box(t.len())
            });
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    c.bench_function("table_churn", |b| {
        let t: Table<u64> = Table::new(16384);
        for id in 0..16384 {
            t.claim(id, id).unwrap();
        }
        let mut id = 0u64;
        b.iter(|| {
            t.release(id % 16384).unwrap();
            t.claim(id % 16384, id).unwrap();
            id = id.wrapping_add(7919);
        });
    });
}

fn bench_free_scans(c: &mut Criterion) {
    let t: Table<u64> = Table::new(65536);
    // occupy the bottom half, leaving scattered holes
    for id in (0..32768u64).filter(|id| id % 17 != 0) {
        t.claim(id, id).unwrap();
    }

    c.bench_function("find_free", |b| {
        b.iter(|| black_box(t.find_free().unwrap()));
    });

    c.bench_function("find_free_size_64", |b| {
        b.iter(|| black_box(t.find_free_size(64).unwrap().len()));
    });

    c.bench_function("find_free_range_tail", |b| {
        b.iter(|| black_box(t.find_free_range(32768, 1024).unwrap().len()));
    });
}

criterion_group!(benches, bench_claim, bench_churn, bench_free_scans);
criterion_main!(benches);
