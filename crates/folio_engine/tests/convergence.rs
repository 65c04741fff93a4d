//! Statistical convergence of the scenario engine against closed forms.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use folio_core::correlation::CorrelationMatrix;
use folio_core::distribution::DistributionParams;
use folio_engine::analytics::aggregate;
use folio_engine::mc::{
    FatTailMethod, SamplingMethod, ScenarioGenerator, ScenarioModel, ScenarioSet,
    SimulationConfig, SimulationCoordinator,
};
use folio_engine::rng::{DigitScramble, HaltonSequence, SampleSource, SamplingSource};

fn normal(mu: f64, sigma: f64) -> DistributionParams {
    DistributionParams {
        mu,
        sigma,
        skew: 0.0,
        tail_df: 30.0,
    }
}

fn run(
    params: Vec<DistributionParams>,
    weights: Vec<f64>,
    correlation: &CorrelationMatrix,
    config: &SimulationConfig,
) -> ScenarioSet {
    let model = ScenarioModel::new(params, weights, correlation, config).unwrap();
    SimulationCoordinator::new(&model, config).run().unwrap()
}

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    cov / (var_a * var_b).sqrt()
}

/// Per-asset return columns and portfolio returns of `n_paths` paths
/// drawn from `source`.
fn draw_columns<S: SampleSource>(
    model: &ScenarioModel,
    source: S,
    n_paths: usize,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut generator = ScenarioGenerator::new(model, source);
    let mut columns = vec![Vec::with_capacity(n_paths); model.n_assets()];
    let mut portfolio = Vec::with_capacity(n_paths);
    for _ in 0..n_paths {
        portfolio.push(generator.next_path().unwrap());
        for (column, &r) in columns.iter_mut().zip(generator.asset_returns()) {
            column.push(r);
        }
    }
    (columns, portfolio)
}

/// Largest and mean absolute pairwise correlation between columns.
fn pairwise_correlation(columns: &[Vec<f64>]) -> (f64, f64) {
    let mut max = 0.0_f64;
    let mut sum = 0.0;
    let mut pairs = 0;
    for i in 0..columns.len() {
        for j in i + 1..columns.len() {
            let rho = pearson(&columns[i], &columns[j]).abs();
            max = max.max(rho);
            sum += rho;
            pairs += 1;
        }
    }
    (max, sum / pairs as f64)
}

fn uncorrelated_book(n_assets: usize) -> ScenarioModel {
    let cfg = config(SamplingMethod::Quasi, FatTailMethod::GaussianCopula, 2_000);
    ScenarioModel::new(
        vec![normal(0.0, 0.20); n_assets],
        vec![1.0 / n_assets as f64; n_assets],
        &CorrelationMatrix::identity(n_assets),
        &cfg,
    )
    .unwrap()
}

fn config(sampling: SamplingMethod, fat_tail: FatTailMethod, n_paths: usize) -> SimulationConfig {
    SimulationConfig::builder()
        .n_paths(n_paths)
        .sampling(sampling)
        .fat_tail(fat_tail)
        .n_workers(4)
        .seed(17)
        .build()
        .unwrap()
}

#[test]
fn test_two_uncorrelated_assets_quasi_volatility() {
    let cfg = config(SamplingMethod::Quasi, FatTailMethod::GaussianCopula, 20_000);
    let set = run(
        vec![normal(0.05, 0.20), normal(0.05, 0.20)],
        vec![0.5, 0.5],
        &CorrelationMatrix::identity(2),
        &cfg,
    );

    let expected = 0.20 * 0.5_f64.sqrt();
    assert_abs_diff_eq!(std_dev(set.returns()), expected, epsilon = 0.005);
    assert_abs_diff_eq!(set.moments().portfolio_mean(), 0.05, epsilon = 0.002);
}

#[test]
fn test_two_uncorrelated_assets_student_t_volatility() {
    // The mixing variance correction keeps the unit variance
    let cfg = config(SamplingMethod::Quasi, FatTailMethod::StudentT, 20_000);
    let set = run(
        vec![normal(0.05, 0.20), normal(0.05, 0.20)],
        vec![0.5, 0.5],
        &CorrelationMatrix::identity(2),
        &cfg,
    );
    assert_abs_diff_eq!(std_dev(set.returns()), 0.1414, epsilon = 0.01);
}

#[test]
fn test_pseudo_random_volatility() {
    let cfg = config(SamplingMethod::Pseudo, FatTailMethod::GaussianCopula, 40_000);
    let set = run(
        vec![normal(0.0, 0.20), normal(0.0, 0.20)],
        vec![0.5, 0.5],
        &CorrelationMatrix::identity(2),
        &cfg,
    );
    assert_abs_diff_eq!(std_dev(set.returns()), 0.1414, epsilon = 0.01);
}

#[test]
fn test_correlation_is_reproduced() {
    let cfg = config(SamplingMethod::Quasi, FatTailMethod::GaussianCopula, 20_000);
    let rho = 0.6;
    let correlation = CorrelationMatrix::new(&[vec![1.0, rho], vec![rho, 1.0]]).unwrap();
    let set = run(
        vec![normal(0.0, 0.10), normal(0.0, 0.30)],
        vec![0.5, 0.5],
        &correlation,
        &cfg,
    );

    // Var(0.5 a + 0.5 b) = 0.25 (σa² + σb² + 2ρ σa σb)
    let expected = (0.25 * (0.01 + 0.09 + 2.0 * rho * 0.03)).sqrt();
    assert_abs_diff_eq!(std_dev(set.returns()), expected, epsilon = 0.005);
}

#[test]
fn test_quasi_runs_are_bit_identical() {
    let cfg = SimulationConfig::builder()
        .n_paths(5_000)
        .sampling(SamplingMethod::Quasi)
        .qmc_offset(1_234)
        .n_workers(3)
        .build()
        .unwrap();
    let params = vec![
        DistributionParams {
            mu: 0.08,
            sigma: 0.25,
            skew: -0.4,
            tail_df: 6.0,
        },
        normal(0.03, 0.05),
    ];
    let correlation = CorrelationMatrix::new(&[vec![1.0, 0.2], vec![0.2, 1.0]]).unwrap();

    let a = run(params.clone(), vec![0.6, 0.4], &correlation, &cfg);
    let b = run(params, vec![0.6, 0.4], &correlation, &cfg);

    let bits_a: Vec<u64> = a.returns().iter().map(|r| r.to_bits()).collect();
    let bits_b: Vec<u64> = b.returns().iter().map(|r| r.to_bits()).collect();
    assert_eq!(bits_a, bits_b);
}

#[test]
fn test_negative_skew_pushes_median_above_mean() {
    let cfg = config(SamplingMethod::Quasi, FatTailMethod::GaussianCopula, 20_000);
    let params = vec![DistributionParams {
        mu: 0.10,
        sigma: 0.20,
        skew: -0.8,
        tail_df: 30.0,
    }];
    let set = run(params, vec![1.0], &CorrelationMatrix::identity(1), &cfg);
    let summary = aggregate(set.into_returns(), 1.0, 0.2, None).unwrap();

    assert!(summary.return_at(0.5).unwrap() > summary.mean_return);
    assert_abs_diff_eq!(summary.mean_return, 0.10, epsilon = 0.005);
}

#[test]
fn test_student_t_fattens_the_far_tail() {
    let params = vec![DistributionParams {
        mu: 0.0,
        sigma: 0.15,
        skew: 0.0,
        tail_df: 3.0,
    }];
    let identity = CorrelationMatrix::identity(1);

    let t_cfg = config(SamplingMethod::Quasi, FatTailMethod::StudentT, 40_000);
    let n_cfg = config(SamplingMethod::Quasi, FatTailMethod::GaussianCopula, 40_000);
    let t = run(params.clone(), vec![1.0], &identity, &t_cfg);
    let n = run(params, vec![1.0], &identity, &n_cfg);

    let t_summary = aggregate(t.into_returns(), 1.0, 0.15, None).unwrap();
    let n_summary = aggregate(n.into_returns(), 1.0, 0.15, None).unwrap();

    let t_es = t_summary.tail_at(0.99).unwrap().cvar_return;
    let n_es = n_summary.tail_at(0.99).unwrap().cvar_return;
    assert!(t_es > n_es * 1.2, "student-t {t_es} vs normal {n_es}");
}

#[test]
fn test_cash_only_shift() {
    let cfg = SimulationConfig::builder()
        .n_paths(4_000)
        .fat_tail(FatTailMethod::GaussianCopula)
        .cash_weight(0.5)
        .cash_rate(0.04)
        .build()
        .unwrap();
    let set = run(
        vec![normal(0.10, 0.20)],
        vec![0.5],
        &CorrelationMatrix::identity(1),
        &cfg,
    );
    assert_abs_diff_eq!(set.moments().portfolio_mean(), 0.07, epsilon = 0.002);
}

#[test]
fn test_wide_book_quasi_draws_stay_uncorrelated() {
    let model = uncorrelated_book(30);
    let scramble = Arc::new(DigitScramble::new(model.draw_dimension()));
    let (columns, portfolio) = draw_columns(&model, SamplingSource::quasi(scramble, 0), 2_000);

    let (max, mean) = pairwise_correlation(&columns);
    assert!(max < 0.05, "largest pairwise correlation {max}");
    assert!(mean < 0.01, "mean pairwise correlation {mean}");

    // 30 independent assets at 1/30 each
    let expected = 0.20 / 30.0_f64.sqrt();
    assert_abs_diff_eq!(std_dev(&portfolio), expected, epsilon = 0.05 * expected);
}

#[test]
fn test_scrambling_removes_high_dimension_alignment() {
    let model = uncorrelated_book(40);
    let scramble = Arc::new(DigitScramble::new(40));
    let (plain, _) = draw_columns(&model, HaltonSequence::new(40), 2_000);
    let (scrambled, _) = draw_columns(&model, HaltonSequence::scrambled(scramble, 0), 2_000);

    let (plain_max, _) = pairwise_correlation(&plain);
    let (scrambled_max, _) = pairwise_correlation(&scrambled);
    assert!(plain_max > 0.3, "plain Halton {plain_max}");
    assert!(scrambled_max < 0.06, "scrambled Halton {scrambled_max}");
}

#[test]
fn test_quasi_beats_pseudo_at_equal_path_count() {
    const N: usize = 4_096;
    let params = vec![normal(0.05, 0.20), normal(0.05, 0.20)];
    let weights = vec![0.5, 0.5];
    let identity = CorrelationMatrix::identity(2);
    let expected_vol = 0.20 * 0.5_f64.sqrt();

    // Absolute errors of the sample mean and sample volatility
    let errors = |set: &ScenarioSet| {
        let mean = set.returns().iter().sum::<f64>() / set.len() as f64;
        (
            (mean - 0.05).abs(),
            (std_dev(set.returns()) - expected_vol).abs(),
        )
    };

    let quasi_cfg = config(SamplingMethod::Quasi, FatTailMethod::GaussianCopula, N);
    let quasi = run(params.clone(), weights.clone(), &identity, &quasi_cfg);
    let (quasi_mean, quasi_vol) = errors(&quasi);

    let seeds: Vec<u64> = (1..=16).collect();
    let (mut pseudo_mean, mut pseudo_vol) = (0.0, 0.0);
    for &seed in &seeds {
        let cfg = config(SamplingMethod::Pseudo, FatTailMethod::GaussianCopula, N)
            .to_builder()
            .seed(seed)
            .build()
            .unwrap();
        let (mean, vol) = errors(&run(params.clone(), weights.clone(), &identity, &cfg));
        pseudo_mean += mean / seeds.len() as f64;
        pseudo_vol += vol / seeds.len() as f64;
    }

    assert!(
        quasi_mean < pseudo_mean,
        "mean error: quasi {quasi_mean} vs pseudo {pseudo_mean}"
    );
    assert!(
        quasi_vol < pseudo_vol,
        "volatility error: quasi {quasi_vol} vs pseudo {pseudo_vol}"
    );
}

