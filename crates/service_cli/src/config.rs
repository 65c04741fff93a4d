//! `folio.toml` configuration.
//!
//! Sources, highest priority first:
//! 1. CLI flags
//! 2. `FOLIO_*` environment variables
//! 3. The config file
//! 4. Defaults
//!
//! ```toml
//! log_level = "info"
//!
//! [engine]
//! n_paths = 100000
//! sampling = "quasi"
//! fat_tail = "student_t"
//!
//! [optimization]
//! top_k = 5
//! ```

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use folio_engine::mc::{FatTailMethod, SamplingMethod, SimulationConfig};
use folio_risk::OptimizationConfig;

use crate::CliError;

/// Default number of simulated paths.
pub const DEFAULT_PATHS: usize = 100_000;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Environment variable {name}: {reason}")]
    EnvError { name: &'static str, reason: String },
}

/// Log levels accepted in `folio.toml` and `FOLIO_LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Tracing filter directive for this level.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// The `[engine]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub n_paths: usize,
    pub sampling: SamplingMethod,
    pub fat_tail: FatTailMethod,
    pub n_workers: Option<usize>,
    pub seed: Option<u64>,
    pub qmc_offset: u64,
    pub drawdown_threshold: Option<f64>,
    pub risk_free_rate: Option<f64>,
    pub starting_value: Option<f64>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            n_paths: DEFAULT_PATHS,
            sampling: SamplingMethod::default(),
            fat_tail: FatTailMethod::default(),
            n_workers: None,
            seed: None,
            qmc_offset: 0,
            drawdown_threshold: None,
            risk_free_rate: None,
            starting_value: None,
        }
    }
}

/// Full CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub log_level: LogLevel,
    pub engine: EngineSection,
    pub optimization: OptimizationConfig,
}

/// Engine overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub n_paths: Option<usize>,
    pub sampling: Option<SamplingMethod>,
    pub fat_tail: Option<FatTailMethod>,
    pub n_workers: Option<usize>,
    pub seed: Option<u64>,
    pub drawdown_threshold: Option<f64>,
    pub log_level: Option<LogLevel>,
}

impl FolioConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads `path`; a missing file yields the defaults unless `required`.
    pub fn load(path: &Path, required: bool) -> crate::Result<Self> {
        if !path.exists() {
            if required {
                return Err(CliError::FileNotFound(path.display().to_string()));
            }
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    /// Applies `FOLIO_*` environment variables.
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides read through `lookup`.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("FOLIO_LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(paths) = lookup("FOLIO_PATHS") {
            self.engine.n_paths = parse_env("FOLIO_PATHS", &paths)?;
        }
        if let Some(sampling) = lookup("FOLIO_SAMPLING") {
            self.engine.sampling = parse_env("FOLIO_SAMPLING", &sampling)?;
        }
        if let Some(fat_tail) = lookup("FOLIO_FAT_TAIL") {
            self.engine.fat_tail = parse_env("FOLIO_FAT_TAIL", &fat_tail)?;
        }
        if let Some(workers) = lookup("FOLIO_WORKERS") {
            self.engine.n_workers = Some(parse_env("FOLIO_WORKERS", &workers)?);
        }
        if let Some(seed) = lookup("FOLIO_SEED") {
            self.engine.seed = Some(parse_env("FOLIO_SEED", &seed)?);
        }
        if let Some(top_k) = lookup("FOLIO_TOP_K") {
            self.optimization.top_k = parse_env("FOLIO_TOP_K", &top_k)?;
        }
        if let Some(fraction) = lookup("FOLIO_SWAP_FRACTION") {
            self.optimization.swap_fraction = parse_env("FOLIO_SWAP_FRACTION", &fraction)?;
        }
        Ok(self)
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliOverrides) {
        if let Some(n_paths) = cli.n_paths {
            self.engine.n_paths = n_paths;
        }
        if let Some(sampling) = cli.sampling {
            self.engine.sampling = sampling;
        }
        if let Some(fat_tail) = cli.fat_tail {
            self.engine.fat_tail = fat_tail;
        }
        if let Some(workers) = cli.n_workers {
            self.engine.n_workers = Some(workers);
        }
        if let Some(seed) = cli.seed {
            self.engine.seed = Some(seed);
        }
        if let Some(threshold) = cli.drawdown_threshold {
            self.engine.drawdown_threshold = Some(threshold);
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
    }

    /// Builds the engine configuration for a portfolio's cash sleeve.
    pub fn simulation_config(
        &self,
        cash_weight: f64,
        cash_rate: f64,
    ) -> Result<SimulationConfig, folio_engine::mc::ConfigError> {
        let engine = &self.engine;
        let mut builder = SimulationConfig::builder()
            .n_paths(engine.n_paths)
            .sampling(engine.sampling)
            .fat_tail(engine.fat_tail)
            .qmc_offset(engine.qmc_offset)
            .cash_weight(cash_weight)
            .cash_rate(cash_rate);
        if let Some(workers) = engine.n_workers {
            builder = builder.n_workers(workers);
        }
        if let Some(seed) = engine.seed {
            builder = builder.seed(seed);
        }
        if let Some(threshold) = engine.drawdown_threshold {
            builder = builder.drawdown_threshold(threshold);
        }
        if let Some(rate) = engine.risk_free_rate {
            builder = builder.risk_free_rate(rate);
        }
        if let Some(value) = engine.starting_value {
            builder = builder.starting_value(value);
        }
        builder.build()
    }
}

fn parse_env<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::EnvError {
        name,
        reason: format!("'{}': {}", raw, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = FolioConfig::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.engine.n_paths, DEFAULT_PATHS);
        assert_eq!(config.engine.sampling, SamplingMethod::Quasi);
        assert_eq!(config.engine.fat_tail, FatTailMethod::StudentT);
        assert_eq!(config.optimization, OptimizationConfig::default());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("warn").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("loud").is_err());
    }

    #[test]
    fn test_toml_sections() {
        let config = FolioConfig::from_toml_str(
            r#"
            log_level = "debug"

            [engine]
            n_paths = 25000
            sampling = "pseudo"
            fat_tail = "gaussian_copula"
            seed = 7

            [optimization]
            top_k = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.engine.n_paths, 25_000);
        assert_eq!(config.engine.sampling, SamplingMethod::Pseudo);
        assert_eq!(config.engine.fat_tail, FatTailMethod::GaussianCopula);
        assert_eq!(config.engine.seed, Some(7));
        assert_eq!(config.optimization.top_k, 3);
        assert_eq!(
            config.optimization.swap_fraction,
            OptimizationConfig::default().swap_fraction
        );
    }

    #[test]
    fn test_env_overrides_file_and_cli_overrides_env() {
        let env: HashMap<&str, &str> = [("FOLIO_PATHS", "5000"), ("FOLIO_SAMPLING", "prng")]
            .into_iter()
            .collect();
        let mut config = FolioConfig::default()
            .with_overrides_from(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.engine.n_paths, 5_000);
        assert_eq!(config.engine.sampling, SamplingMethod::Pseudo);

        config.merge_with_cli(&CliOverrides {
            n_paths: Some(800),
            ..CliOverrides::default()
        });
        assert_eq!(config.engine.n_paths, 800);
        assert_eq!(config.engine.sampling, SamplingMethod::Pseudo);
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let result = FolioConfig::default().with_overrides_from(|name| {
            (name == "FOLIO_WORKERS").then(|| "many".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::EnvError {
                name: "FOLIO_WORKERS",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_optional_file_gives_defaults() {
        let path = Path::new("definitely-not-here/folio.toml");
        assert_eq!(FolioConfig::load(path, false).unwrap(), FolioConfig::default());
        assert!(matches!(
            FolioConfig::load(path, true),
            Err(CliError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_simulation_config_carries_cash() {
        let config = FolioConfig::default().simulation_config(0.1, 0.04).unwrap();
        assert_eq!(config.cash_weight(), 0.1);
        assert_eq!(config.risk_free_rate(), 0.04);
        assert_eq!(config.n_paths(), DEFAULT_PATHS);
    }
}
