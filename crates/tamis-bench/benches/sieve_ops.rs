//! Criterion benchmarks for sieve generation and queries.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tamis_bench::{query_points, reference_config, reference_pooled_config, stress_config};
use tamis_sieve::wheel;
use tamis_sieve::Sieve;

/// Wheel fill of a 2 MiB table.
fn bench_wheel_fill(c: &mut Criterion) {
    let mut table = vec![0u32; 1 << 19];
    c.bench_function("wheel_fill_2mib", |b| {
        b.iter(|| {
            wheel::fill(&mut table).unwrap();
            black_box(table[table.len() - 1]);
        });
    });
}

/// Build and fully sieve the reference profile from scratch.
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_2_24");
    group.sample_size(20);
    group.bench_function("direct", |b| {
        b.iter(|| {
            let sieve = Sieve::new(reference_config()).unwrap();
            sieve.generate_all().unwrap();
            black_box(sieve.boundary());
        });
    });
    group.bench_function("pooled", |b| {
        b.iter(|| {
            let sieve = Sieve::new(reference_pooled_config()).unwrap();
            sieve.generate_all().unwrap();
            black_box(sieve.boundary());
        });
    });
    group.finish();
}

/// Stress profile: 2^28 integers.
fn bench_generate_stress(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_2_28");
    group.sample_size(10);
    group.bench_function("direct", |b| {
        b.iter(|| {
            let sieve = Sieve::new(stress_config()).unwrap();
            sieve.generate_all().unwrap();
            black_box(sieve.boundary());
        });
    });
    group.finish();
}

/// Queries against a fully generated table.
fn bench_queries(c: &mut Criterion) {
    let config = reference_config();
    let ceiling = config.ceiling;
    let sieve = Sieve::new(config).unwrap();
    sieve.generate_all().unwrap();
    let points = query_points(1024, ceiling, 7);
    let total = u64::from(sieve.count(ceiling).unwrap());
    let indices = query_points(1024, total, 11);

    c.bench_function("is_prime_1024", |b| {
        b.iter(|| {
            let hits = points
                .iter()
                .filter(|&&n| sieve.is_prime(n).unwrap())
                .count();
            black_box(hits);
        });
    });
    c.bench_function("count_full", |b| {
        b.iter(|| black_box(sieve.count(ceiling).unwrap()));
    });
    c.bench_function("nth_1024", |b| {
        b.iter(|| {
            let sum: u64 = indices.iter().map(|&i| sieve.nth(i).unwrap()).sum();
            black_box(sum);
        });
    });
    c.bench_function("enumerate_full", |b| {
        b.iter(|| black_box(sieve.enumerate_all().unwrap().count()));
    });
}

criterion_group!(
    benches,
    bench_wheel_fill,
    bench_generate,
    bench_generate_stress,
    bench_queries
);
criterion_main!(benches);
