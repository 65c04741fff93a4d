//! # folio_risk (L4): Portfolio Risk Analytics
//!
//! Public entry points of the workspace. Turns a list of positions and a
//! correlation matrix into simulated return distributions, analytic risk
//! decompositions and ranked rebalancing swaps.
//!
//! ## Modules
//!
//! - [`portfolio`]: weight normalisation and cash
//! - [`decomposition`]: MCTR, risk contributions and incremental Sharpe
//! - [`parity`]: equal-risk-contribution weights
//! - [`swaps`]: pairwise swap matrix and ranking
//! - [`engine`]: [`run_simulation`] and [`run_optimization`]
//!
//! ## Example
//!
//! ```rust
//! use folio_core::types::{PercentileSet, Position};
//! use folio_engine::mc::{SamplingMethod, SimulationConfig};
//! use folio_risk::run_simulation;
//!
//! let equity = Position::new(
//!     "EQ",
//!     100.0,
//!     50.0,
//!     PercentileSet::new(-0.20, 0.02, 0.10, 0.18, 0.35).unwrap(),
//! )
//! .unwrap();
//! let bond = Position::new(
//!     "BD",
//!     200.0,
//!     25.0,
//!     PercentileSet::new(-0.05, 0.02, 0.04, 0.06, 0.10).unwrap(),
//! )
//! .unwrap();
//! let correlation = vec![vec![1.0, 0.2], vec![0.2, 1.0]];
//!
//! let config = SimulationConfig::builder()
//!     .n_paths(5_000)
//!     .sampling(SamplingMethod::Quasi)
//!     .build()
//!     .unwrap();
//!
//! let result = run_simulation(&[equity, bond], &correlation, &config).unwrap();
//! assert_eq!(result.summary.n_paths, 5_000);
//! assert!(result.summary.return_at(0.05).unwrap() < result.summary.return_at(0.95).unwrap());
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod decomposition;
pub mod engine;
pub mod error;
pub mod parity;
pub mod portfolio;
pub mod swaps;

pub use config::OptimizationConfig;
pub use decomposition::{decompose, portfolio_metrics, PortfolioMetrics, PositionRisk, RiskDecomposition};
pub use engine::{
    run_optimization, run_optimization_with_cancellation, run_simulation,
    run_simulation_with_cancellation, OptimizationResult, PositionSummary, SimulationDiagnostics,
    SimulationResult, SwapValidation,
};
pub use error::RiskError;
pub use parity::{risk_parity_weights, RiskParityResult};
pub use portfolio::PortfolioWeights;
pub use swaps::{build_swap_matrix, SwapCandidate, SwapDelta, SwapMatrix};

pub use folio_core::correlation::{repair_correlation, repair_correlation_with_report};
pub use folio_core::distribution::derive_distribution;
