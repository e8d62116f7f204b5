//! Allocator benchmarks
//!
//! Compares the three allocators against the system allocator on the
//! workloads they are built for: bump-and-reset, grow-and-clear and
//! alloc/free churn.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::alloc::Layout;
use std::hint::black_box;
use strata_alloc::{
    Arena, ArenaConfig, BlockAllocator, BlockConfig, FixedBufferAllocator, FixedBufferConfig,
};

const BUFFER_SIZE: usize = 1024 * 1024;

/// Benchmark a single allocation followed by the cheapest way to give it back
fn bench_single_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_allocation");

    group.bench_function("fixed_buffer_64b", |b| {
        let mut buf = vec![0u8; BUFFER_SIZE];
        let mut fba = FixedBufferAllocator::with_config(&mut buf, FixedBufferConfig::production());

        b.iter(|| {
            black_box(fba.alloc(64, 8).unwrap());
            fba.reset();
        });
    });

    group.bench_function("arena_64b", |b| {
        let mut arena = Arena::production();

        b.iter(|| {
            black_box(arena.alloc(64, 8).unwrap());
            if arena.block_count() > 16 {
                arena.clear();
            }
        });
    });

    group.bench_function("block_64b", |b| {
        let mut buf = vec![0u8; BUFFER_SIZE];
        let pool = BlockAllocator::with_config(&mut buf, 64, BlockConfig::production()).unwrap();

        b.iter(|| unsafe {
            let slot = pool.alloc().unwrap();
            pool.free(slot.cast());
            black_box(slot);
        });
    });

    // System allocator (baseline)
    group.bench_function("system_64b", |b| {
        let layout = Layout::from_size_align(64, 8).unwrap();

        b.iter(|| unsafe {
            let ptr = std::alloc::alloc(layout);
            std::alloc::dealloc(ptr, layout);
            black_box(ptr);
        });
    });

    group.finish();
}

/// Benchmark 100 allocations reclaimed in bulk
fn bench_batch_allocations(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_allocations");
    group.throughput(Throughput::Elements(100));

    group.bench_function("fixed_buffer_100x64b", |b| {
        let mut buf = vec![0u8; BUFFER_SIZE];
        let mut fba = FixedBufferAllocator::with_config(&mut buf, FixedBufferConfig::production());

        b.iter(|| {
            for _ in 0..100 {
                black_box(fba.alloc(64, 8).unwrap());
            }
            fba.reset();
        });
    });

    group.bench_function("arena_100x64b", |b| {
        let mut arena = Arena::with_config(ArenaConfig::production()).unwrap();

        b.iter(|| {
            for _ in 0..100 {
                black_box(arena.alloc(64, 8).unwrap());
            }
            arena.clear();
        });
    });

    group.bench_function("block_100x64b", |b| {
        let mut buf = vec![0u8; BUFFER_SIZE];
        let mut pool = BlockAllocator::with_config(&mut buf, 64, BlockConfig::production()).unwrap();

        b.iter(|| {
            for _ in 0..100 {
                black_box(pool.alloc().unwrap());
            }
            pool.reset();
        });
    });

    group.finish();
}

/// Benchmark arena growth across block sizes
fn bench_arena_block_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena_block_sizes");
    group.throughput(Throughput::Bytes(64 * 1024));

    for block_size in &[1024usize, 4096, 65536] {
        group.bench_with_input(
            BenchmarkId::new("fill_64k", block_size),
            block_size,
            |b, &block_size| {
                let mut arena = Arena::with_config(
                    ArenaConfig::production().with_block_size(block_size),
                )
                .unwrap();

                b.iter(|| {
                    for _ in 0..(64 * 1024 / 128) {
                        black_box(arena.alloc(128, 8).unwrap());
                    }
                    arena.clear();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark interleaved alloc/free on the block allocator
fn bench_block_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_churn");

    group.bench_function("alloc2_free1", |b| {
        let mut buf = vec![0u8; BUFFER_SIZE];
        let mut pool = BlockAllocator::with_config(&mut buf, 32, BlockConfig::production()).unwrap();

        b.iter(|| {
            for _ in 0..256 {
                let keep = pool.alloc().unwrap();
                let drop = pool.alloc().unwrap();
                // SAFETY: `drop` came from this pool and is not used again.
                unsafe { pool.free(drop.cast()) };
                black_box(keep);
            }
            pool.reset();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_allocation,
    bench_batch_allocations,
    bench_arena_block_sizes,
    bench_block_churn
);

criterion_main!(benches);
