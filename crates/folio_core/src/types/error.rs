//! Error types for the foundation layer.
//!
//! Only caller contract violations are represented here. Numerical
//! degeneracy (non-PSD input, zero volatility) is repaired in place and
//! never surfaces as an error.

use thiserror::Error;

/// Errors raised by foundation-layer operations.
///
/// # Examples
/// ```
/// use folio_core::types::CoreError;
///
/// let err = CoreError::DimensionMismatch { expected: 3, got: 2 };
/// assert_eq!(format!("{}", err), "Dimension mismatch: expected 3, got 2");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Two inputs that must agree in size do not.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Size required by the first input.
        expected: usize,
        /// Size actually supplied.
        got: usize,
    },

    /// A matrix row has the wrong number of columns.
    #[error("Matrix is not square: row {row} has {got} columns, expected {expected}")]
    NotSquare {
        /// Offending row index.
        row: usize,
        /// Number of rows in the matrix.
        expected: usize,
        /// Number of columns found in the row.
        got: usize,
    },

    /// Cholesky factorisation hit a non-positive or non-finite pivot.
    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,

    /// Strict validation of a correlation matrix failed.
    #[error("Invalid correlation matrix: {0}")]
    InvalidCorrelation(String),

    /// Percentiles are non-finite, unordered or below the return floor.
    #[error("Invalid percentiles: {0}")]
    InvalidPercentiles(String),

    /// Position fields are non-finite or otherwise unusable.
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_square() {
        let err = CoreError::NotSquare {
            row: 1,
            expected: 3,
            got: 2,
        };
        assert_eq!(
            format!("{}", err),
            "Matrix is not square: row 1 has 2 columns, expected 3"
        );
    }

    #[test]
    fn test_error_display_invalid_percentiles() {
        let err = CoreError::InvalidPercentiles("p25 must exceed p5".to_string());
        assert_eq!(format!("{}", err), "Invalid percentiles: p25 must exceed p5");
    }

    #[test]
    fn test_error_is_error_trait() {
        let err: Box<dyn std::error::Error> = Box::new(CoreError::NotPositiveDefinite);
        assert!(err.to_string().contains("positive definite"));
    }
}
