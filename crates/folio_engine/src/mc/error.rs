//! Error types for the scenario engine.
//!
//! [`ConfigError`] is raised while building a [`SimulationConfig`]; it is
//! the only failure a well-formed caller can meet before a run starts.
//! [`SimulationError`] covers everything surfaced by a run.
//!
//! [`SimulationConfig`]: super::SimulationConfig

use std::fmt;

use folio_core::types::CoreError;
use thiserror::Error;

/// Configuration error for the scenario engine.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Path count outside valid range [1, 10_000_000].
    InvalidPathCount(usize),
    /// Worker count of zero or above the hard ceiling.
    InvalidWorkerCount(usize),
    /// Invalid parameter value with name and description.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPathCount(count) => {
                write!(
                    f,
                    "Invalid path count {}: must be in range [1, 10_000_000]",
                    count
                )
            }
            Self::InvalidWorkerCount(count) => {
                write!(f, "Invalid worker count {}: must be in range [1, 64]", count)
            }
            Self::InvalidParameter { name, value } => {
                write!(f, "Invalid parameter '{}': {}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors surfaced by a simulation run.
///
/// Numerical degeneracy inside a run (non-finite paths, tiny chi-squared
/// draws, an indefinite correlation matrix) is recovered locally and
/// reported through diagnostics instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Caller contract violation detected by the core types.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The portfolio has no positions.
    #[error("Portfolio is empty")]
    EmptyPortfolio,

    /// The run was cancelled through its cancellation flag.
    #[error("Simulation cancelled")]
    Cancelled,

    /// The worker thread pool could not be created.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidPathCount(0);
        assert!(err.to_string().contains("Invalid path count 0"));

        let err = ConfigError::InvalidWorkerCount(100);
        assert!(err.to_string().contains("Invalid worker count 100"));

        let err = ConfigError::InvalidParameter {
            name: "cash_weight",
            value: "must be in [0, 1)".to_string(),
        };
        assert!(err.to_string().contains("cash_weight"));
    }

    #[test]
    fn test_simulation_error_from_config() {
        let err: SimulationError = ConfigError::InvalidPathCount(0).into();
        assert!(matches!(err, SimulationError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_simulation_error_core_is_transparent() {
        let core = CoreError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        let err: SimulationError = core.clone().into();
        assert_eq!(err.to_string(), core.to_string());
    }

    #[test]
    fn test_simulation_error_display() {
        assert_eq!(SimulationError::Cancelled.to_string(), "Simulation cancelled");
        assert_eq!(
            SimulationError::EmptyPortfolio.to_string(),
            "Portfolio is empty"
        );
    }
}
