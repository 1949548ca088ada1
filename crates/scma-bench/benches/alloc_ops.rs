//! Criterion micro-benchmarks for allocate, free, resolve and typed access.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use scma_arena::{Accessor, Allocator, ArenaConfig};
use scma_bench::small_objects;

/// Benchmark: allocate 1K small blocks into a fresh allocator.
fn bench_allocate_1k(c: &mut Criterion) {
    let sizes = small_objects(1_000, 7);
    c.bench_function("allocate_1k", |b| {
        b.iter_batched(
            || Allocator::with_config(ArenaConfig::default()).unwrap(),
            |alloc| {
                for &size in &sizes {
                    black_box(alloc.allocate(size).unwrap());
                }
                alloc
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: allocate/free/compact cycles that keep reusing one slot.
fn bench_allocate_free_reuse(c: &mut Criterion) {
    let alloc = Allocator::with_config(ArenaConfig::new(64)).unwrap();
    c.bench_function("allocate_free_reuse", |b| {
        b.iter(|| {
            let h = alloc.allocate(black_box(32)).unwrap();
            alloc.free(h).unwrap();
            // One freed slot: compaction only resets the cursor.
            alloc.compact().unwrap();
        });
    });
}

/// Benchmark: resolve a handle and read its first byte.
fn bench_resolve(c: &mut Criterion) {
    let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
    let handles: Vec<_> = small_objects(256, 3)
        .into_iter()
        .map(|s| alloc.allocate(s).unwrap())
        .collect();
    let mut i = 0usize;
    c.bench_function("resolve", |b| {
        b.iter(|| {
            let view = alloc.resolve(handles[i % handles.len()]).unwrap();
            black_box(view[0]);
            i += 1;
        });
    });
}

/// Benchmark: read-modify-write through a typed accessor.
fn bench_accessor_update(c: &mut Criterion) {
    let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
    let acc = Accessor::<[f32; 4]>::allocate(&alloc, 64).unwrap();
    c.bench_function("accessor_update_at", |b| {
        let mut i = 0usize;
        b.iter(|| {
            acc.update_at(i % 64, |v| v[0] += 1.0).unwrap();
            i += 1;
        });
    });
}

criterion_group!(
    benches,
    bench_allocate_1k,
    bench_allocate_free_reuse,
    bench_resolve,
    bench_accessor_update
);
criterion_main!(benches);
