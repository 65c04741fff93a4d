//! # Scenario Analytics
//!
//! - [`aggregator`]: percentiles, tail risk, loss probabilities and the
//!   drawdown proxy
//! - [`attribution`]: analytic per-position decomposition of each
//!   percentile

pub mod aggregator;
pub mod attribution;

pub use aggregator::{
    aggregate, drawdown_proxy, percentile_sorted, PercentileValue, ScenarioSummary,
    TailRisk, ThresholdProbability, LOSS_THRESHOLDS, SUMMARY_LEVELS,
};
pub use attribution::{attribute, Attribution, PercentileAttribution};
