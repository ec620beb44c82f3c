//! Benchmark for the two-sample KS drift test
//!
//! Run with: cargo bench --bench drift_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polars::prelude::*;
use rand::prelude::*;
use rand::SeedableRng;

use prepline::pipeline::{detect_dataset_drift, ks_2samp};

fn generate_sample(n: usize, offset: f64, seed: u64) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n).map(|_| offset + rng.gen::<f64>() * 100.0).collect()
}

fn generate_test_dataframe(n_rows: usize, n_features: usize, seed: u64) -> DataFrame {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let columns: Vec<Column> = (0..n_features)
        .map(|i| {
            let values: Vec<Option<f64>> = (0..n_rows)
                .map(|_| {
                    if rng.gen::<f64>() < 0.05 {
                        None
                    } else {
                        Some(rng.gen::<f64>() * 100.0)
                    }
                })
                .collect();
            Column::new(format!("feature_{}", i).into(), values)
        })
        .collect();
    DataFrame::new(columns).expect("Failed to create DataFrame")
}

/// Exact p-values below the cell limit, asymptotic above it
fn benchmark_ks_by_sample_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("ks_2samp");
    group.sample_size(30);

    for n in [100, 500, 1_000, 10_000, 100_000] {
        let a = generate_sample(n, 0.0, 1);
        let b = generate_sample(n / 4, 5.0, 2);
        group.throughput(Throughput::Elements((n + n / 4) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
            bench.iter(|| ks_2samp(black_box(&a), black_box(&b)))
        });
    }

    group.finish();
}

fn benchmark_dataset_drift(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_dataset_drift");
    group.sample_size(20);

    let n_rows = 10_000;
    for n_cols in [10, 30, 60] {
        let train = generate_test_dataframe(n_rows * 4 / 5, n_cols, 3);
        let test = generate_test_dataframe(n_rows / 5, n_cols, 4);
        group.bench_with_input(BenchmarkId::from_parameter(n_cols), &n_cols, |bench, _| {
            bench.iter(|| detect_dataset_drift(black_box(&train), black_box(&test), 0.05).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_ks_by_sample_size, benchmark_dataset_drift);
criterion_main!(benches);
