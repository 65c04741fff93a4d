//! Optimisation configuration.

use folio_engine::mc::{ConfigError, MAX_PATHS};

/// Default fraction of gross exposure moved by a swap.
pub const DEFAULT_SWAP_FRACTION: f64 = 0.05;

/// Default number of swaps validated by simulation.
pub const DEFAULT_TOP_K: usize = 5;

/// Default path count of each validation run.
pub const DEFAULT_VALIDATION_PATHS: usize = 10_000;

/// Seed for pseudo-random validation runs when the simulation config has
/// none, so every candidate sees the same draws.
pub const DEFAULT_VALIDATION_SEED: u64 = 0x5EED_F011_0000_0001;

/// Settings for [`run_optimization`](crate::run_optimization).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OptimizationConfig {
    /// Fraction of gross exposure moved by each swap, in (0, 1].
    pub swap_fraction: f64,
    /// Number of top-ranked swaps validated by simulation.
    pub top_k: usize,
    /// Paths per validation run.
    pub validation_paths: usize,
    /// Iteration budget of the risk-parity search.
    pub parity_max_iterations: usize,
    /// Convergence tolerance of the risk-parity search.
    pub parity_tolerance: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            swap_fraction: DEFAULT_SWAP_FRACTION,
            top_k: DEFAULT_TOP_K,
            validation_paths: DEFAULT_VALIDATION_PATHS,
            parity_max_iterations: 500,
            parity_tolerance: 1e-10,
        }
    }
}

impl OptimizationConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidParameter`] for a swap fraction outside
    ///   (0, 1] or a non-positive tolerance
    /// - [`ConfigError::InvalidPathCount`] for validation paths outside
    ///   [1, 10_000_000]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.swap_fraction.is_finite() && self.swap_fraction > 0.0 && self.swap_fraction <= 1.0)
        {
            return Err(ConfigError::InvalidParameter {
                name: "swap_fraction",
                value: format!("{} is not in (0, 1]", self.swap_fraction),
            });
        }
        if self.validation_paths == 0 || self.validation_paths > MAX_PATHS {
            return Err(ConfigError::InvalidPathCount(self.validation_paths));
        }
        if !(self.parity_tolerance.is_finite() && self.parity_tolerance > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "parity_tolerance",
                value: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OptimizationConfig::default();
        assert_eq!(config.swap_fraction, 0.05);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.validation_paths, 10_000);
        assert_eq!(config.parity_max_iterations, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let bad_fraction = OptimizationConfig {
            swap_fraction: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_fraction.validate(),
            Err(ConfigError::InvalidParameter {
                name: "swap_fraction",
                ..
            })
        ));

        let bad_paths = OptimizationConfig {
            validation_paths: 0,
            ..Default::default()
        };
        assert_eq!(bad_paths.validate(), Err(ConfigError::InvalidPathCount(0)));
    }
}
