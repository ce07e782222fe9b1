//! Benchmarks for DDSketch
//!
//! Measures performance of:
//! - Add operations across accuracy levels and mapping variants
//! - Quantile queries across sketch sizes
//! - Merge operations
//! - Serialization round-trips

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ddsketch_oxide::{CollapsePolicy, DDSketch, IndexMapping, Sketch};

/// Benchmark add operations with different accuracy levels
fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddsketch_add");

    for accuracy in [0.001, 0.01, 0.05].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("accuracy_{}", accuracy)),
            accuracy,
            |b, &acc| {
                let mut sketch = DDSketch::new(acc).unwrap();
                let mut counter = 1.0;
                b.iter(|| {
                    sketch.add(black_box(counter)).unwrap();
                    counter += 1.0;
                });
            },
        );
    }
    group.finish();
}

/// Benchmark the three mapping variants on the add path
fn bench_add_mapping_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddsketch_add_mapping");

    let variants = [
        ("logarithmic", IndexMapping::logarithmic(0.01).unwrap()),
        (
            "linear_interpolated",
            IndexMapping::linearly_interpolated(0.01).unwrap(),
        ),
        (
            "cubic_interpolated",
            IndexMapping::cubically_interpolated(0.01).unwrap(),
        ),
    ];

    for (name, mapping) in variants {
        group.bench_function(name, |b| {
            let mut sketch =
                DDSketch::with_mapping(mapping.clone(), CollapsePolicy::None).unwrap();
            let mut counter = 1.0;
            b.iter(|| {
                sketch.add(black_box(counter)).unwrap();
                counter += 0.7;
            });
        });
    }
    group.finish();
}

/// Benchmark add into a capped dense store, including collapse churn
fn bench_add_collapsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddsketch_add_collapsing");

    for bin_limit in [128usize, 1024, 4096].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(bin_limit),
            bin_limit,
            |b, &limit| {
                let mut sketch = DDSketch::collapsing_lowest(0.01, limit).unwrap();
                let mut counter = 1.0;
                b.iter(|| {
                    sketch.add(black_box(counter)).unwrap();
                    counter *= 1.001;
                });
            },
        );
    }
    group.finish();
}

/// Benchmark quantile queries on sketches of different sizes
fn bench_quantile(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddsketch_quantile");

    for size in [100, 1000, 10000, 100000].iter() {
        let mut sketch = DDSketch::new(0.01).unwrap();
        for i in 1..=*size {
            sketch.add(i as f64).unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                black_box(sketch.quantile(black_box(0.99)).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark merging two populated sketches
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddsketch_merge");

    group.bench_function("sparse_10k_each", |b| {
        let mut left = DDSketch::new(0.01).unwrap();
        let mut right = DDSketch::new(0.01).unwrap();
        for i in 1..=10_000 {
            left.add(i as f64).unwrap();
            right.add((i * 3) as f64).unwrap();
        }

        b.iter(|| {
            let mut receiver = left.clone();
            receiver.merge(black_box(&right)).unwrap();
            black_box(receiver.count());
        });
    });

    group.bench_function("dense_capped_2048", |b| {
        let mut left = DDSketch::collapsing_lowest(0.01, 2048).unwrap();
        let mut right = DDSketch::collapsing_lowest(0.01, 2048).unwrap();
        for i in 1..=10_000 {
            left.add(i as f64).unwrap();
            right.add((i * 3) as f64).unwrap();
        }

        b.iter(|| {
            let mut receiver = left.clone();
            receiver.merge(black_box(&right)).unwrap();
            black_box(receiver.count());
        });
    });

    group.finish();
}

/// Benchmark serialize/deserialize round-trips
fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddsketch_serialization");

    let mut sketch = DDSketch::new(0.01).unwrap();
    for i in 1..=10_000 {
        sketch.add(i as f64).unwrap();
    }
    let bytes = sketch.serialize();

    group.bench_function("serialize_10k", |b| {
        b.iter(|| black_box(sketch.serialize()));
    });
    group.bench_function("deserialize_10k", |b| {
        b.iter(|| black_box(DDSketch::deserialize(black_box(&bytes)).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_add,
    bench_add_mapping_variants,
    bench_add_collapsing,
    bench_quantile,
    bench_merge,
    bench_serialization
);
criterion_main!(benches);
