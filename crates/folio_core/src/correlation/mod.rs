//! Correlation matrices, Cholesky factors and covariance construction.
//!
//! ## Mathematical Background
//!
//! Given `n` independent standard normals `Z`, correlated normals are
//! `W = L * Z` where `L` is the lower triangular Cholesky factor of the
//! correlation matrix `C = L * L^T`. A matrix is accepted as a sampling
//! input only if every pivot of that factorisation is finite and positive.
//!
//! User-edited matrices are frequently not PSD, so [`repair_correlation`]
//! symmetrises, clamps and shrinks them until the factorisation succeeds.
//!
//! ## Usage
//!
//! ```
//! use folio_core::correlation::{build_covariance, repair_correlation};
//!
//! let raw = vec![
//!     vec![1.0, 0.95, 0.95],
//!     vec![0.95, 1.0, -0.95],
//!     vec![0.95, -0.95, 1.0],
//! ];
//! let corr = repair_correlation(&raw).unwrap();
//! assert!(corr.cholesky().is_ok());
//!
//! let cov = build_covariance(&corr, &[0.2, 0.3, 0.1]).unwrap();
//! assert!((cov.get(1, 1) - 0.09).abs() < 1e-12);
//! ```

mod covariance;
mod matrix;
mod repair;

pub use covariance::{build_covariance, CovarianceMatrix};
pub use matrix::{cholesky_lower, CholeskyFactor, CorrelationMatrix};
pub use repair::{
    repair_correlation, repair_correlation_with_report, RepairReport, MAX_CORRELATION,
    MAX_REPAIR_ITERATIONS, SHRINK_FACTOR,
};
