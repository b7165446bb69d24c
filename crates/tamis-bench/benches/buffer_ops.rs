//! Criterion micro-benchmarks for buffer allocation, copy, and pool reuse.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tamis_buffer::{Buffer, BufferAllocator, BufferPool, Fill, PoolConfig};

/// Element-wise vs block copy on both sides of the 64-byte threshold.
fn bench_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_u32");
    for count in [8usize, 16, 17, 1024, 1 << 20] {
        let source: Vec<u32> = (0..count as u32).collect();
        let mut dest = vec![0u32; count];
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                BufferAllocator::copy(&source, &mut dest, count).unwrap();
                black_box(dest[count - 1]);
            });
        });
    }
    group.finish();
}

/// Fresh zeroed allocation from the global allocator.
fn bench_direct_allocate(c: &mut Criterion) {
    let alloc = BufferAllocator::<u32>::direct();
    c.bench_function("direct_allocate_zeroed_64k", |b| {
        b.iter(|| {
            let buf = alloc.allocate(1 << 16, Fill::Zeroed).unwrap();
            black_box(buf.len());
        });
    });
}

/// Lease/release cycle that hits a retained block every time.
fn bench_pool_reuse(c: &mut Criterion) {
    let pool = BufferPool::<u32>::new(PoolConfig::default()).unwrap();
    let alloc = BufferAllocator::pooled(pool);
    c.bench_function("pool_lease_release_64k", |b| {
        b.iter(|| {
            let mut buf = alloc.allocate(1 << 16, Fill::Unspecified).unwrap();
            black_box(buf.as_slice().unwrap().len());
            buf.release();
        });
    });
}

/// Clone of a 1 MiB buffer.
fn bench_clone(c: &mut Criterion) {
    let alloc = BufferAllocator::<u32>::direct();
    let source = alloc.allocate(1 << 18, Fill::Zeroed).unwrap();
    c.bench_function("clone_1mib", |b| {
        b.iter(|| {
            let clone = alloc.clone_buffer(source.as_ref()).unwrap();
            black_box(clone.len());
        });
    });
}

criterion_group!(
    benches,
    bench_copy,
    bench_direct_allocate,
    bench_pool_reuse,
    bench_clone
);
criterion_main!(benches);
