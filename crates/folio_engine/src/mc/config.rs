//! Simulation configuration.
//!
//! [`SimulationConfig`] is immutable once built; use
//! [`SimulationConfigBuilder`] to construct and validate it.

use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;
use crate::rng::SamplingMethod;

/// Maximum number of simulation paths allowed.
pub const MAX_PATHS: usize = 10_000_000;

/// Hard ceiling on explicitly requested workers.
pub const MAX_WORKERS: usize = 64;

/// Default worker count is `min(available cores, DEFAULT_WORKER_CAP)`.
pub const DEFAULT_WORKER_CAP: usize = 8;

/// Tail model applied to the correlated normal block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FatTailMethod {
    /// Multivariate Student-t: one chi-squared draw per path scales every
    /// asset, so tail events are joint.
    #[default]
    StudentT,
    /// Gaussian copula: the correlated normals are used as they are.
    GaussianCopula,
}

impl fmt::Display for FatTailMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatTailMethod::StudentT => write!(f, "student_t"),
            FatTailMethod::GaussianCopula => write!(f, "gaussian_copula"),
        }
    }
}

impl FromStr for FatTailMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "student_t" | "studentt" | "t" => Ok(FatTailMethod::StudentT),
            "gaussian_copula" | "gaussian" | "copula" | "normal" => {
                Ok(FatTailMethod::GaussianCopula)
            }
            other => Err(format!("unknown fat-tail method: {other}")),
        }
    }
}

/// Scenario simulation configuration.
///
/// # Examples
///
/// ```rust
/// use folio_engine::mc::{FatTailMethod, SamplingMethod, SimulationConfig};
///
/// let config = SimulationConfig::builder()
///     .n_paths(50_000)
///     .sampling(SamplingMethod::Quasi)
///     .fat_tail(FatTailMethod::StudentT)
///     .cash_weight(0.05)
///     .cash_rate(0.04)
///     .build()
///     .expect("valid config");
///
/// assert_eq!(config.n_paths(), 50_000);
/// assert_eq!(config.risk_free_rate(), 0.04);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    n_paths: usize,
    sampling: SamplingMethod,
    fat_tail: FatTailMethod,
    drawdown_threshold: Option<f64>,
    cash_weight: f64,
    cash_rate: f64,
    risk_free_rate: Option<f64>,
    starting_value: Option<f64>,
    n_workers: Option<usize>,
    seed: Option<u64>,
    qmc_offset: u64,
}

impl SimulationConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Returns a builder pre-filled with this configuration.
    pub fn to_builder(&self) -> SimulationConfigBuilder {
        SimulationConfigBuilder {
            n_paths: Some(self.n_paths),
            sampling: self.sampling,
            fat_tail: self.fat_tail,
            drawdown_threshold: self.drawdown_threshold,
            cash_weight: self.cash_weight,
            cash_rate: self.cash_rate,
            risk_free_rate: self.risk_free_rate,
            starting_value: self.starting_value,
            n_workers: self.n_workers,
            seed: self.seed,
            qmc_offset: self.qmc_offset,
        }
    }

    /// Number of simulation paths.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Sampling family.
    #[inline]
    pub fn sampling(&self) -> SamplingMethod {
        self.sampling
    }

    /// Fat-tail method.
    #[inline]
    pub fn fat_tail(&self) -> FatTailMethod {
        self.fat_tail
    }

    /// Drawdown threshold for the exceedance probability, if any.
    #[inline]
    pub fn drawdown_threshold(&self) -> Option<f64> {
        self.drawdown_threshold
    }

    /// Fraction of the portfolio held in cash.
    #[inline]
    pub fn cash_weight(&self) -> f64 {
        self.cash_weight
    }

    /// Constant annual return on cash.
    #[inline]
    pub fn cash_rate(&self) -> f64 {
        self.cash_rate
    }

    /// Risk-free rate for Sharpe ratios; defaults to the cash rate.
    #[inline]
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate.unwrap_or(self.cash_rate)
    }

    /// Explicit starting portfolio value, if set.
    #[inline]
    pub fn starting_value(&self) -> Option<f64> {
        self.starting_value
    }

    /// Explicitly requested worker count, if set.
    #[inline]
    pub fn n_workers(&self) -> Option<usize> {
        self.n_workers
    }

    /// Seed for pseudo-random sampling, if set.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Offset into the Halton sequence for quasi-random sampling.
    #[inline]
    pub fn qmc_offset(&self) -> u64 {
        self.qmc_offset
    }

    /// Worker count actually used by a run.
    ///
    /// Defaults to `min(available cores, 8)`. An explicit request is capped
    /// at the available cores. Never exceeds the path count.
    pub fn resolved_workers(&self) -> usize {
        let cores = num_cpus::get().max(1);
        let requested = self
            .n_workers
            .map_or_else(|| cores.min(DEFAULT_WORKER_CAP), |n| n.min(cores));
        requested.clamp(1, self.n_paths.max(1))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `n_paths` is 0 or greater than 10,000,000
    /// - `n_workers` is 0 or greater than 64
    /// - `cash_weight` is outside `[0, 1)`
    /// - a rate, the drawdown threshold or the starting value is not finite
    ///   or out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_paths == 0 || self.n_paths > MAX_PATHS {
            return Err(ConfigError::InvalidPathCount(self.n_paths));
        }
        if let Some(workers) = self.n_workers {
            if workers == 0 || workers > MAX_WORKERS {
                return Err(ConfigError::InvalidWorkerCount(workers));
            }
        }
        if !(self.cash_weight.is_finite() && (0.0..1.0).contains(&self.cash_weight)) {
            return Err(ConfigError::InvalidParameter {
                name: "cash_weight",
                value: format!("{} is not in [0, 1)", self.cash_weight),
            });
        }
        if !self.cash_rate.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "cash_rate",
                value: "must be finite".to_string(),
            });
        }
        if let Some(rf) = self.risk_free_rate {
            if !rf.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "risk_free_rate",
                    value: "must be finite".to_string(),
                });
            }
        }
        if let Some(threshold) = self.drawdown_threshold {
            if !(threshold.is_finite() && threshold > 0.0 && threshold <= 1.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "drawdown_threshold",
                    value: format!("{} is not in (0, 1]", threshold),
                });
            }
        }
        if let Some(value) = self.starting_value {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "starting_value",
                    value: "must be positive and finite".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`SimulationConfig`].
#[derive(Clone, Debug, Default)]
pub struct SimulationConfigBuilder {
    n_paths: Option<usize>,
    sampling: SamplingMethod,
    fat_tail: FatTailMethod,
    drawdown_threshold: Option<f64>,
    cash_weight: f64,
    cash_rate: f64,
    risk_free_rate: Option<f64>,
    starting_value: Option<f64>,
    n_workers: Option<usize>,
    seed: Option<u64>,
    qmc_offset: u64,
}

impl SimulationConfigBuilder {
    /// Sets the number of simulation paths in [1, 10_000_000].
    #[inline]
    pub fn n_paths(mut self, n_paths: usize) -> Self {
        self.n_paths = Some(n_paths);
        self
    }

    /// Sets the sampling family.
    #[inline]
    pub fn sampling(mut self, sampling: SamplingMethod) -> Self {
        self.sampling = sampling;
        self
    }

    /// Sets the fat-tail method.
    #[inline]
    pub fn fat_tail(mut self, fat_tail: FatTailMethod) -> Self {
        self.fat_tail = fat_tail;
        self
    }

    /// Sets the drawdown threshold in (0, 1].
    #[inline]
    pub fn drawdown_threshold(mut self, threshold: f64) -> Self {
        self.drawdown_threshold = Some(threshold);
        self
    }

    /// Sets the cash weight in [0, 1).
    #[inline]
    pub fn cash_weight(mut self, cash_weight: f64) -> Self {
        self.cash_weight = cash_weight;
        self
    }

    /// Sets the annual cash return.
    #[inline]
    pub fn cash_rate(mut self, cash_rate: f64) -> Self {
        self.cash_rate = cash_rate;
        self
    }

    /// Sets the risk-free rate used for Sharpe ratios.
    #[inline]
    pub fn risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = Some(rate);
        self
    }

    /// Sets the starting portfolio value used for dollar outputs.
    #[inline]
    pub fn starting_value(mut self, value: f64) -> Self {
        self.starting_value = Some(value);
        self
    }

    /// Sets an explicit worker count in [1, 64].
    #[inline]
    pub fn n_workers(mut self, n_workers: usize) -> Self {
        self.n_workers = Some(n_workers);
        self
    }

    /// Sets the seed for pseudo-random sampling.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the Halton sequence offset for quasi-random sampling.
    #[inline]
    pub fn qmc_offset(mut self, offset: u64) -> Self {
        self.qmc_offset = offset;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `n_paths` is not set or any field is
    /// invalid (see [`SimulationConfig::validate`]).
    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let n_paths = self.n_paths.ok_or(ConfigError::InvalidParameter {
            name: "n_paths",
            value: "must be specified".to_string(),
        })?;

        let config = SimulationConfig {
            n_paths,
            sampling: self.sampling,
            fat_tail: self.fat_tail,
            drawdown_threshold: self.drawdown_threshold,
            cash_weight: self.cash_weight,
            cash_rate: self.cash_rate,
            risk_free_rate: self.risk_free_rate,
            starting_value: self.starting_value,
            n_workers: self.n_workers,
            seed: self.seed,
            qmc_offset: self.qmc_offset,
        };

        config.validate()?;
        Ok(config)
    }
}
