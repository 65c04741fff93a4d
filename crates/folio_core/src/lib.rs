//! # folio_core: Statistical Foundation for Portfolio Simulation
//!
//! ## Layer 1 (Foundation) Role
//!
//! folio_core is the bottom layer of the simulation workspace, providing:
//! - Position and percentile types (`types`)
//! - Standard normal and chi-squared transforms (`math`)
//! - Percentile-to-parameter derivation (`distribution`)
//! - Correlation repair, Cholesky factorisation and covariance (`correlation`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other folio_* crates. Everything here is a
//! pure function of its inputs: no I/O, no clocks, no caches.
//!
//! ## Usage Examples
//!
//! ```rust
//! use folio_core::correlation::{build_covariance, repair_correlation};
//! use folio_core::distribution::derive_distribution;
//! use folio_core::types::PercentileSet;
//!
//! let percentiles = PercentileSet::new(-0.20, 0.02, 0.10, 0.18, 0.35).unwrap();
//! let params = derive_distribution(&percentiles);
//! assert!((params.mu - 0.10).abs() < 1e-12);
//!
//! let corr = repair_correlation(&[vec![1.0, 0.3], vec![0.3, 1.0]]).unwrap();
//! let cov = build_covariance(&corr, &[params.sigma, 0.2]).unwrap();
//! assert_eq!(cov.dim(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for positions, parameters and matrices

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod correlation;
pub mod distribution;
pub mod math;
pub mod types;
