//! Simulation and optimisation entry points.
//!
//! Both entry points run the same preparation:
//!
//! ```text
//! positions ──► derive_distribution ──► params ──┐
//! correlation ─► repair_correlation ─► matrix ───┼─► covariance
//! positions ──► PortfolioWeights ──► weights ────┘
//! ```
//!
//! [`run_simulation`] then runs the scenario engine once and aggregates;
//! [`run_optimization`] works analytically and validates the best swaps
//! with short simulations.

use std::time::Instant;

use tracing::{debug, info};

use folio_core::correlation::{
    build_covariance, repair_correlation_with_report, CorrelationMatrix, CovarianceMatrix,
};
use folio_core::distribution::{derive_distribution, DistributionParams};
use folio_core::types::{CoreError, Position};
use folio_engine::analytics::{aggregate, attribute, Attribution, ScenarioSummary};
use folio_engine::mc::{
    CancellationFlag, ScenarioModel, SimulationConfig, SimulationCoordinator,
};

use crate::config::{OptimizationConfig, DEFAULT_VALIDATION_SEED};
use crate::decomposition::{decompose, portfolio_metrics, sharpe_ratio, PortfolioMetrics, RiskDecomposition};
use crate::error::RiskError;
use crate::parity::{risk_parity_weights, RiskParityResult};
use crate::portfolio::PortfolioWeights;
use crate::swaps::{build_swap_matrix, swapped_weights, SwapCandidate, SwapMatrix};

/// Run-level diagnostics.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationDiagnostics {
    /// Paths simulated.
    pub n_paths: usize,
    /// Workers used.
    pub n_workers: usize,
    /// Paths coerced to zero.
    pub anomalies: usize,
    /// `anomalies / n_paths`.
    pub anomaly_rate: f64,
    /// Shrink steps taken by the correlation repair.
    pub repair_iterations: usize,
    /// Whether the repair changed the input matrix.
    pub correlation_repaired: bool,
    /// Whether the identity matrix replaced the repaired matrix.
    pub correlation_fallback: bool,
    /// Degrees of freedom of the shared Student-t mixing variable.
    pub shared_tail_df: Option<f64>,
    /// Wall time of the run in milliseconds.
    pub elapsed_ms: u64,
}

/// Per-position inputs and simulated moments.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionSummary {
    /// Position identifier.
    pub id: String,
    /// Signed weight.
    pub weight: f64,
    /// Signed market value.
    pub market_value: f64,
    /// Derived distribution parameters.
    pub params: DistributionParams,
    /// Mean simulated return.
    pub simulated_mean: f64,
    /// Simulated volatility.
    pub simulated_volatility: f64,
}

/// Output of [`run_simulation`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationResult {
    /// Percentiles, tail risk, loss probabilities and drawdowns.
    pub summary: ScenarioSummary,
    /// Per-position contributions at each percentile; `None` if no path
    /// was finite.
    pub attribution: Option<Attribution>,
    /// Per-position summaries in input order.
    pub positions: Vec<PositionSummary>,
    /// Analytic metrics from the covariance matrix.
    pub analytic: PortfolioMetrics,
    /// Correlation matrix after repair.
    pub correlation: CorrelationMatrix,
    /// Diagnostics.
    pub diagnostics: SimulationDiagnostics,
}

/// Simulated check of one analytic swap.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapValidation {
    /// The swap, with its analytic effect.
    pub candidate: SwapCandidate,
    /// Simulated metrics after the swap.
    pub simulated: PortfolioMetrics,
    /// Simulated Sharpe change against the simulated baseline.
    pub simulated_delta_sharpe: f64,
}

/// Output of [`run_optimization`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationResult {
    /// MCTR, risk contributions and incremental Sharpe per position.
    pub decomposition: RiskDecomposition,
    /// Risk-parity weights for the invested fraction.
    pub risk_parity: RiskParityResult,
    /// Analytic effect of every ordered-pair swap.
    pub swap_matrix: SwapMatrix,
    /// All swaps, best Sharpe improvement first.
    pub ranked_swaps: Vec<SwapCandidate>,
    /// Simulated metrics of the current weights on the validation block.
    pub baseline_simulated: PortfolioMetrics,
    /// Simulated checks of the top-ranked swaps.
    pub validations: Vec<SwapValidation>,
    /// First Halton index of the validation block, minus one.
    pub validation_offset: u64,
    /// Wall time in milliseconds.
    pub elapsed_ms: u64,
}

struct PreparedPortfolio {
    weights: PortfolioWeights,
    params: Vec<DistributionParams>,
    expected_returns: Vec<f64>,
    correlation: CorrelationMatrix,
    covariance: CovarianceMatrix,
    repair_iterations: usize,
    correlation_repaired: bool,
    cash_return: f64,
}

impl PreparedPortfolio {
    fn new(
        positions: &[Position],
        correlation: &[Vec<f64>],
        config: &SimulationConfig,
    ) -> Result<Self, RiskError> {
        if positions.is_empty() {
            return Err(RiskError::EmptyPortfolio);
        }
        if correlation.len() != positions.len() {
            return Err(CoreError::DimensionMismatch {
                expected: positions.len(),
                got: correlation.len(),
            }
            .into());
        }

        let repair = repair_correlation_with_report(correlation)?;
        let params: Vec<DistributionParams> = positions
            .iter()
            .map(|p| derive_distribution(&p.percentiles))
            .collect();
        let sigmas: Vec<f64> = params.iter().map(|p| p.sigma).collect();

        // Sampling falls back to the identity on the same test
        let covariance = if repair.is_positive_definite {
            build_covariance(&repair.matrix, &sigmas)?
        } else {
            build_covariance(&CorrelationMatrix::identity(positions.len()), &sigmas)?
        };
        let weights = PortfolioWeights::from_positions(
            positions,
            config.cash_weight(),
            config.starting_value(),
        )?;

        Ok(Self {
            expected_returns: params.iter().map(|p| p.mu).collect(),
            weights,
            params,
            correlation: repair.matrix,
            covariance,
            repair_iterations: repair.iterations,
            correlation_repaired: repair.was_modified,
            cash_return: config.cash_weight() * config.cash_rate(),
        })
    }

    fn model(&self, config: &SimulationConfig) -> Result<ScenarioModel, RiskError> {
        Ok(ScenarioModel::new(
            self.params.clone(),
            self.weights.weights().to_vec(),
            &self.correlation,
            config,
        )?)
    }
}

/// Runs one portfolio simulation.
///
/// # Errors
///
/// - [`RiskError::EmptyPortfolio`] for an empty position list
/// - [`RiskError::Core`] for a correlation matrix whose size does not
///   match the positions, or that is not square
/// - [`RiskError::InvalidWeights`] when the gross market value is zero
/// - [`RiskError::Simulation`] if the worker pool cannot start
pub fn run_simulation(
    positions: &[Position],
    correlation: &[Vec<f64>],
    config: &SimulationConfig,
) -> Result<SimulationResult, RiskError> {
    simulate(positions, correlation, config, None)
}

/// Like [`run_simulation`], stopping early when `cancel` is raised.
///
/// # Errors
///
/// As [`run_simulation`], plus [`RiskError::Simulation`] wrapping
/// `SimulationError::Cancelled`.
pub fn run_simulation_with_cancellation(
    positions: &[Position],
    correlation: &[Vec<f64>],
    config: &SimulationConfig,
    cancel: &CancellationFlag,
) -> Result<SimulationResult, RiskError> {
    simulate(positions, correlation, config, Some(cancel))
}

fn simulate(
    positions: &[Position],
    correlation: &[Vec<f64>],
    config: &SimulationConfig,
    cancel: Option<&CancellationFlag>,
) -> Result<SimulationResult, RiskError> {
    let started = Instant::now();
    let prepared = PreparedPortfolio::new(positions, correlation, config)?;
    let model = prepared.model(config)?;

    let mut coordinator = SimulationCoordinator::new(&model, config);
    if let Some(flag) = cancel {
        coordinator = coordinator.with_cancellation(flag.clone());
    }
    let scenarios = coordinator.run()?;
    let anomalies = scenarios.anomalies();
    let anomaly_rate = scenarios.anomaly_rate();
    let (returns, moments) = scenarios.into_parts();

    let weights = prepared.weights.weights();
    let starting_value = prepared.weights.starting_value();
    let analytic = portfolio_metrics(
        weights,
        &prepared.expected_returns,
        &prepared.covariance,
        prepared.cash_return,
        config.risk_free_rate(),
    )?;

    let summary = aggregate(
        returns,
        starting_value,
        analytic.volatility,
        config.drawdown_threshold(),
    )
    .ok_or(RiskError::NoScenarios)?;
    let attribution = attribute(
        &moments,
        weights,
        prepared.cash_return,
        &summary.return_percentiles,
        starting_value,
    );

    let position_summaries = prepared
        .weights
        .ids()
        .iter()
        .enumerate()
        .map(|(i, id)| PositionSummary {
            id: id.clone(),
            weight: weights[i],
            market_value: prepared.weights.market_values()[i],
            params: prepared.params[i],
            simulated_mean: moments.asset_mean(i),
            simulated_volatility: moments.asset_variance(i).sqrt(),
        })
        .collect();

    let diagnostics = SimulationDiagnostics {
        n_paths: config.n_paths(),
        n_workers: config.resolved_workers(),
        anomalies,
        anomaly_rate,
        repair_iterations: prepared.repair_iterations,
        correlation_repaired: prepared.correlation_repaired,
        correlation_fallback: model.correlation_fallback(),
        shared_tail_df: model.mixing_df(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    info!(
        n_paths = diagnostics.n_paths,
        n_workers = diagnostics.n_workers,
        mean_return = summary.mean_return,
        elapsed_ms = diagnostics.elapsed_ms,
        "simulation complete"
    );

    Ok(SimulationResult {
        summary,
        attribution,
        positions: position_summaries,
        analytic,
        correlation: prepared.correlation,
        diagnostics,
    })
}

/// Runs the risk decomposition, risk-parity search and swap search.
///
/// The top `top_k` swaps are validated by simulation. Every validation
/// run, including the baseline, uses `validation_paths` paths from the
/// same block, starting directly after the main run's range
/// (`qmc_offset + n_paths`); in pseudo-random mode they share one seed.
/// Differences between them are therefore not sampling noise.
///
/// # Errors
///
/// As [`run_simulation`], plus [`RiskError::Config`] for an invalid
/// [`OptimizationConfig`].
pub fn run_optimization(
    positions: &[Position],
    correlation: &[Vec<f64>],
    config: &SimulationConfig,
    optimization: &OptimizationConfig,
) -> Result<OptimizationResult, RiskError> {
    optimize(positions, correlation, config, optimization, None)
}

/// Like [`run_optimization`], stopping early when `cancel` is raised.
///
/// # Errors
///
/// As [`run_optimization`], plus [`RiskError::Simulation`] wrapping
/// `SimulationError::Cancelled`.
pub fn run_optimization_with_cancellation(
    positions: &[Position],
    correlation: &[Vec<f64>],
    config: &SimulationConfig,
    optimization: &OptimizationConfig,
    cancel: &CancellationFlag,
) -> Result<OptimizationResult, RiskError> {
    optimize(positions, correlation, config, optimization, Some(cancel))
}

fn optimize(
    positions: &[Position],
    correlation: &[Vec<f64>],
    config: &SimulationConfig,
    optimization: &OptimizationConfig,
    cancel: Option<&CancellationFlag>,
) -> Result<OptimizationResult, RiskError> {
    let started = Instant::now();
    optimization.validate()?;
    let prepared = PreparedPortfolio::new(positions, correlation, config)?;
    let ids = prepared.weights.ids();
    let weights = prepared.weights.weights();
    let rf = config.risk_free_rate();

    let decomposition = decompose(
        ids,
        weights,
        &prepared.expected_returns,
        &prepared.covariance,
        prepared.cash_return,
        rf,
    )?;
    let risk_parity = risk_parity_weights(
        &prepared.covariance,
        1.0 - config.cash_weight(),
        optimization.parity_max_iterations,
        optimization.parity_tolerance,
    )?;
    let swap_matrix = build_swap_matrix(
        ids,
        weights,
        &prepared.expected_returns,
        &prepared.covariance,
        prepared.cash_return,
        rf,
        optimization.swap_fraction,
    )?;
    let ranked_swaps = swap_matrix.ranked();

    let validation_offset = config.qmc_offset() + config.n_paths() as u64;
    let validation_config = config
        .to_builder()
        .n_paths(optimization.validation_paths)
        .qmc_offset(validation_offset)
        .seed(config.seed().unwrap_or(DEFAULT_VALIDATION_SEED))
        .build()?;
    let baseline_model = prepared.model(&validation_config)?;
    let baseline_simulated = simulated_metrics(&baseline_model, &validation_config, cancel, rf)?;

    let validations = ranked_swaps
        .iter()
        .take(optimization.top_k)
        .map(|candidate| {
            let model = baseline_model.with_weights(swapped_weights(
                weights,
                candidate.sell,
                candidate.buy,
                candidate.amount,
            ))?;
            let simulated = simulated_metrics(&model, &validation_config, cancel, rf)?;
            debug!(
                sell = %candidate.sell_id,
                buy = %candidate.buy_id,
                analytic = candidate.delta.delta_sharpe,
                simulated = simulated.sharpe - baseline_simulated.sharpe,
                "validated swap"
            );
            Ok(SwapValidation {
                candidate: candidate.clone(),
                simulated,
                simulated_delta_sharpe: simulated.sharpe - baseline_simulated.sharpe,
            })
        })
        .collect::<Result<Vec<_>, RiskError>>()?;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        positions = ids.len(),
        swaps = ranked_swaps.len(),
        validated = validations.len(),
        parity_converged = risk_parity.converged,
        elapsed_ms,
        "optimisation complete"
    );

    Ok(OptimizationResult {
        decomposition,
        risk_parity,
        swap_matrix,
        ranked_swaps,
        baseline_simulated,
        validations,
        validation_offset,
        elapsed_ms,
    })
}

fn simulated_metrics(
    model: &ScenarioModel,
    config: &SimulationConfig,
    cancel: Option<&CancellationFlag>,
    risk_free_rate: f64,
) -> Result<PortfolioMetrics, RiskError> {
    let mut coordinator = SimulationCoordinator::new(model, config);
    if let Some(flag) = cancel {
        coordinator = coordinator.with_cancellation(flag.clone());
    }
    let scenarios = coordinator.run()?;
    let moments = scenarios.moments();
    let expected_return = moments.portfolio_mean();
    let volatility = moments.portfolio_variance().sqrt();
    Ok(PortfolioMetrics {
        expected_return,
        volatility,
        sharpe: sharpe_ratio(expected_return, volatility, risk_free_rate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::types::PercentileSet;
    use folio_engine::mc::SamplingMethod;

    fn position(id: &str, value: f64, p: [f64; 5]) -> Position {
        let pct = PercentileSet::new(p[0], p[1], p[2], p[3], p[4]).unwrap();
        Position::new(id, value / 10.0, 10.0, pct).unwrap()
    }

    fn config(n_paths: usize) -> SimulationConfig {
        SimulationConfig::builder()
            .n_paths(n_paths)
            .sampling(SamplingMethod::Quasi)
            .n_workers(2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_empty_portfolio_is_rejected() {
        let result = run_simulation(&[], &[], &config(100));
        assert_eq!(result.unwrap_err(), RiskError::EmptyPortfolio);
    }

    #[test]
    fn test_correlation_size_mismatch_is_rejected() {
        let positions = vec![position("A", 100.0, [-0.2, 0.0, 0.08, 0.16, 0.3])];
        let result = run_simulation(&positions, &[vec![1.0, 0.0], vec![0.0, 1.0]], &config(100));
        assert!(matches!(
            result,
            Err(RiskError::Core(CoreError::DimensionMismatch {
                expected: 1,
                got: 2
            }))
        ));
    }

    #[test]
    fn test_diagnostics_report_repair() {
        let positions = vec![
            position("A", 100.0, [-0.2, 0.0, 0.08, 0.16, 0.3]),
            position("B", 100.0, [-0.1, 0.01, 0.05, 0.09, 0.2]),
        ];
        let asymmetric = vec![vec![1.0, 0.4], vec![0.2, 1.0]];
        let result = run_simulation(&positions, &asymmetric, &config(1_000)).unwrap();

        assert!(result.diagnostics.correlation_repaired);
        assert!(!result.diagnostics.correlation_fallback);
        assert_eq!(result.correlation.get(0, 1), result.correlation.get(1, 0));
        assert_eq!(result.diagnostics.n_paths, 1_000);
        assert_eq!(result.positions.len(), 2);
    }

    #[test]
    fn test_cancelled_simulation() {
        let positions = vec![position("A", 100.0, [-0.2, 0.0, 0.08, 0.16, 0.3])];
        let flag = CancellationFlag::new();
        flag.cancel();
        let result =
            run_simulation_with_cancellation(&positions, &[vec![1.0]], &config(10_000), &flag);
        assert!(matches!(result, Err(RiskError::Simulation(_))));
    }
}
