//! Risk layer error types.
//!
//! Wraps the lower-layer errors with `thiserror` so callers see a single
//! error type from [`run_simulation`](crate::run_simulation) and
//! [`run_optimization`](crate::run_optimization).

use folio_core::types::CoreError;
use folio_engine::mc::{ConfigError, SimulationError};
use thiserror::Error;

/// Errors surfaced by the risk layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// Caller contract violation detected by the core types.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid simulation or optimisation configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure during a simulation run.
    #[error("Simulation error: {0}")]
    Simulation(SimulationError),

    /// The portfolio has no positions.
    #[error("Portfolio is empty")]
    EmptyPortfolio,

    /// Weights cannot be formed from the positions.
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// A run finished without any scenario to aggregate.
    #[error("Simulation produced no scenarios")]
    NoScenarios,
}

impl From<SimulationError> for RiskError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::Core(e) => RiskError::Core(e),
            SimulationError::Config(e) => RiskError::Config(e),
            SimulationError::EmptyPortfolio => RiskError::EmptyPortfolio,
            other => RiskError::Simulation(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_errors_are_flattened() {
        let err: RiskError = SimulationError::EmptyPortfolio.into();
        assert_eq!(err, RiskError::EmptyPortfolio);

        let err: RiskError = SimulationError::Core(CoreError::NotPositiveDefinite).into();
        assert!(matches!(err, RiskError::Core(CoreError::NotPositiveDefinite)));

        let err: RiskError = SimulationError::Cancelled.into();
        assert_eq!(err.to_string(), "Simulation error: Simulation cancelled");
    }

    #[test]
    fn test_invalid_weights_display() {
        let err = RiskError::InvalidWeights("gross market value is zero".to_string());
        assert!(err.to_string().contains("gross market value"));
    }
}
