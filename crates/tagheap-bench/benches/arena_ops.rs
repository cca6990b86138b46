//! Criterion micro-benchmarks for allocation, deallocation, and layout checks.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use tagheap_arena::{Arena, ArenaConfig, InvariantChecks};
use tagheap_bench::{churn_profile, fragmented_arena, replay};

/// Arena whose layout checks are off in release builds.
fn unchecked_arena(capacity: usize) -> Arena<u64> {
    let config = ArenaConfig::new(capacity).with_checks(InvariantChecks::DebugOnly);
    Arena::with_config(config).unwrap()
}

fn bench_allocate_free_pair(c: &mut Criterion) {
    let mut arena = unchecked_arena(64 * 1024);
    c.bench_function("allocate_free_pair", |b| {
        b.iter(|| {
            let ptr = arena.allocate(black_box(4)).unwrap();
            arena.deallocate(ptr, 4).unwrap();
        });
    });
}

fn bench_churn_1k(c: &mut Criterion) {
    let trace = churn_profile(1_000, 32, 16, 42);
    c.bench_function("churn_1k", |b| {
        b.iter_batched(
            || unchecked_arena(64 * 1024),
            |mut arena| black_box(replay(&mut arena, &trace)),
            BatchSize::SmallInput,
        );
    });
}

fn bench_first_fit_past_holes(c: &mut Criterion) {
    let mut arena = fragmented_arena(512, 1_024);
    c.bench_function("first_fit_past_512_holes", |b| {
        b.iter(|| {
            let ptr = arena.allocate(black_box(2)).unwrap();
            arena.deallocate(ptr, 2).unwrap();
        });
    });
}

fn bench_check_512_holes(c: &mut Criterion) {
    let arena = fragmented_arena(512, 1_024);
    c.bench_function("check_512_holes", |b| {
        b.iter(|| black_box(arena.check()));
    });
}

criterion_group!(
    benches,
    bench_allocate_free_pair,
    bench_churn_1k,
    bench_first_fit_past_holes,
    bench_check_512_holes,
);
criterion_main!(benches);
