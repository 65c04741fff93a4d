//! Criterion benchmarks for folio_engine.
//!
//! Benchmarks cover:
//! - Halton point generation at several dimensions, plain and scrambled
//! - Single-worker path generation (pseudo vs quasi)
//! - Full coordinator runs across worker counts
//! - Aggregation of a large return buffer

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use folio_core::correlation::CorrelationMatrix;
use folio_core::distribution::DistributionParams;
use folio_engine::analytics::aggregate;
use folio_engine::mc::{
    SamplingMethod, ScenarioGenerator, ScenarioModel, SimulationConfig, SimulationCoordinator,
};
use folio_engine::rng::{
    DigitScramble, HaltonSequence, LowDiscrepancySequence, PseudoRandomSource,
};

/// Equicorrelated matrix of dimension `n`.
fn equicorrelated(n: usize, rho: f64) -> CorrelationMatrix {
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { rho }).collect())
        .collect();
    CorrelationMatrix::new(&rows).unwrap()
}

fn model(n: usize, config: &SimulationConfig) -> ScenarioModel {
    let params = (0..n)
        .map(|i| DistributionParams {
            mu: 0.05 + 0.01 * i as f64,
            sigma: 0.15 + 0.01 * i as f64,
            skew: -0.2,
            tail_df: 8.0,
        })
        .collect();
    let weights = vec![1.0 / n as f64; n];
    ScenarioModel::new(params, weights, &equicorrelated(n, 0.3), config).unwrap()
}

fn bench_halton(c: &mut Criterion) {
    let mut group = c.benchmark_group("halton");
    for dim in [2, 11, 51] {
        group.bench_with_input(BenchmarkId::new("next_point", dim), &dim, |b, &dim| {
            let mut seq = HaltonSequence::new(dim);
            b.iter(|| {
                black_box(seq.next_point());
            });
        });
        group.bench_with_input(BenchmarkId::new("scrambled", dim), &dim, |b, &dim| {
            let mut seq = HaltonSequence::scrambled(Arc::new(DigitScramble::new(dim)), 0);
            b.iter(|| {
                black_box(seq.next_point());
            });
        });
    }
    group.finish();
}

fn bench_generator(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator");
    let config = SimulationConfig::builder().n_paths(10_000).build().unwrap();

    for n_assets in [5, 20] {
        let m = model(n_assets, &config);
        group.bench_with_input(BenchmarkId::new("quasi", n_assets), &m, |b, m| {
            let scramble = Arc::new(DigitScramble::new(m.draw_dimension()));
            b.iter(|| {
                let source = HaltonSequence::scrambled(Arc::clone(&scramble), 0);
                ScenarioGenerator::new(m, source).simulate(black_box(10_000), None)
            });
        });
        group.bench_with_input(BenchmarkId::new("pseudo", n_assets), &m, |b, m| {
            b.iter(|| {
                let source = PseudoRandomSource::from_seed(42);
                ScenarioGenerator::new(m, source).simulate(black_box(10_000), None)
            });
        });
    }
    group.finish();
}

fn bench_coordinator(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinator");
    group.sample_size(10);

    for workers in [1, 4, 8] {
        let config = SimulationConfig::builder()
            .n_paths(100_000)
            .sampling(SamplingMethod::Quasi)
            .n_workers(workers)
            .build()
            .unwrap();
        let m = model(10, &config);
        group.bench_with_input(BenchmarkId::new("run_100k", workers), &config, |b, cfg| {
            b.iter(|| SimulationCoordinator::new(&m, cfg).run());
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let returns: Vec<f64> = (0..200_000)
        .map(|i| ((i * 7919) % 200_000) as f64 / 200_000.0 - 0.5)
        .collect();
    c.bench_function("aggregate_200k", |b| {
        b.iter(|| aggregate(black_box(returns.clone()), 1_000_000.0, 0.2, Some(0.2)));
    });
}

criterion_group!(
    benches,
    bench_halton,
    bench_generator,
    bench_coordinator,
    bench_aggregate
);
criterion_main!(benches);
