//! # folio_engine (L3): Portfolio Scenario Engine
//!
//! Draws correlated, skewed, fat-tailed one-year return scenarios for a
//! portfolio and reduces them to percentile summaries and per-position
//! attributions.
//!
//! ## Architecture
//!
//! ```text
//! SimulationCoordinator
//! ├── SimulationConfig   (paths, sampling family, fat-tail method, cash)
//! ├── ScenarioModel      (params, weights, Cholesky factor)
//! ├── SamplingSource     (PseudoRandomSource | scrambled HaltonSequence) per worker
//! └── Orchestration
//!     ├── plan_chunks()         disjoint path ranges
//!     ├── ScenarioGenerator     one per chunk, rayon thread pool
//!     └── ScenarioSet::merge()  concatenation in chunk order
//!          ↓
//! analytics::aggregate()  +  analytics::attribute()
//! ```
//!
//! ## Example
//!
//! ```rust
//! use folio_core::correlation::CorrelationMatrix;
//! use folio_core::distribution::derive_distribution;
//! use folio_core::types::PercentileSet;
//! use folio_engine::analytics::aggregate;
//! use folio_engine::mc::{SamplingMethod, ScenarioModel, SimulationConfig, SimulationCoordinator};
//!
//! let p = PercentileSet::new(-0.20, 0.02, 0.10, 0.18, 0.35).unwrap();
//! let params = vec![derive_distribution(&p)];
//!
//! let config = SimulationConfig::builder()
//!     .n_paths(2_000)
//!     .sampling(SamplingMethod::Quasi)
//!     .n_workers(2)
//!     .build()
//!     .unwrap();
//!
//! let model = ScenarioModel::new(params, vec![1.0], &CorrelationMatrix::identity(1), &config).unwrap();
//! let scenarios = SimulationCoordinator::new(&model, &config).run().unwrap();
//! assert_eq!(scenarios.len(), 2_000);
//!
//! let summary = aggregate(scenarios.into_returns(), 100_000.0, 0.12, None).unwrap();
//! assert!(summary.mean_return.is_finite());
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytics;
pub mod mc;
pub mod rng;
