//! # Scenario Simulation
//!
//! Configuration, the per-worker scenario generator and the parallel
//! coordinator.
//!
//! ## Module Structure
//!
//! - [`config`]: [`SimulationConfig`] and its validating builder
//! - [`error`]: [`ConfigError`] and [`SimulationError`]
//! - [`generator`]: [`ScenarioModel`] and [`ScenarioGenerator`]
//! - [`coordinator`]: chunk planning, rayon pool and cancellation
//! - [`scenario`]: [`ScenarioSet`] and streaming [`CoMoments`]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod generator;
pub mod scenario;

pub use crate::rng::SamplingMethod;
pub use config::{
    FatTailMethod, SimulationConfig, SimulationConfigBuilder, DEFAULT_WORKER_CAP, MAX_PATHS,
    MAX_WORKERS,
};
pub use coordinator::{
    plan_chunks, CancellationFlag, ChunkPlan, SimulationCoordinator, ANOMALY_WARN_RATE,
    CANCELLATION_POLL_INTERVAL,
};
pub use error::{ConfigError, SimulationError};
pub use generator::{ScenarioGenerator, ScenarioModel, RETURN_CAP};
pub use scenario::{CoMoments, ScenarioSet};
