//! Covariance Builder: `cov[i][j] = rho[i][j] * sigma[i] * sigma[j]`.

use super::CorrelationMatrix;
use crate::types::CoreError;

/// Covariance matrix derived from a correlation matrix and volatilities.
///
/// Ephemeral: rebuilt whenever correlations or volatilities change.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CovarianceMatrix {
    /// Matrix elements in row-major order.
    data: Vec<f64>,
    /// Matrix dimension.
    dim: usize,
}

impl CovarianceMatrix {
    /// Builds a covariance matrix from rows without validation.
    ///
    /// # Errors
    ///
    /// `CoreError::NotSquare` if the rows do not form a square matrix.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, CoreError> {
        let (data, dim) = super::matrix::flatten_square(rows)?;
        Ok(Self { data, dim })
    }

    /// Get matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Get element at (i, j).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Volatility of asset `i` (square root of the diagonal).
    #[inline]
    pub fn volatility(&self, i: usize) -> f64 {
        self.get(i, i).max(0.0).sqrt()
    }

    /// Computes `cov * w`.
    ///
    /// # Errors
    ///
    /// `CoreError::DimensionMismatch` if `w.len() != self.dim()`.
    pub fn mul_vec(&self, w: &[f64]) -> Result<Vec<f64>, CoreError> {
        self.check_len(w.len())?;
        Ok(self
            .data
            .chunks(self.dim.max(1))
            .take(self.dim)
            .map(|row| row.iter().zip(w.iter()).map(|(c, x)| c * x).sum())
            .collect())
    }

    /// Computes the quadratic form `w^T * cov * w` (portfolio variance).
    pub fn quadratic_form(&self, w: &[f64]) -> Result<f64, CoreError> {
        let cw = self.mul_vec(w)?;
        Ok(w.iter().zip(cw.iter()).map(|(a, b)| a * b).sum())
    }

    fn check_len(&self, len: usize) -> Result<(), CoreError> {
        if len != self.dim {
            return Err(CoreError::DimensionMismatch {
                expected: self.dim,
                got: len,
            });
        }
        Ok(())
    }
}

/// Combines a correlation matrix with per-asset volatilities.
///
/// # Errors
///
/// `CoreError::DimensionMismatch` when `sigmas.len()` differs from the
/// matrix dimension. This is a caller contract violation and is never
/// recovered.
///
/// # Examples
/// ```
/// use folio_core::correlation::{build_covariance, CorrelationMatrix};
///
/// let corr = CorrelationMatrix::new(&[vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
/// let cov = build_covariance(&corr, &[0.2, 0.4]).unwrap();
/// assert!((cov.get(0, 1) - 0.04).abs() < 1e-12);
/// ```
pub fn build_covariance(
    correlation: &CorrelationMatrix,
    sigmas: &[f64],
) -> Result<CovarianceMatrix, CoreError> {
    let dim = correlation.dim();
    if sigmas.len() != dim {
        return Err(CoreError::DimensionMismatch {
            expected: dim,
            got: sigmas.len(),
        });
    }

    let mut data = Vec::with_capacity(dim * dim);
    for i in 0..dim {
        for j in 0..dim {
            data.push(correlation.get(i, j) * sigmas[i] * sigmas[j]);
        }
    }
    Ok(CovarianceMatrix { data, dim })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_diagonal_is_variance() {
        let corr = CorrelationMatrix::identity(3);
        let cov = build_covariance(&corr, &[0.1, 0.2, 0.3]).unwrap();
        assert_abs_diff_eq!(cov.get(2, 2), 0.09, epsilon = 1e-15);
        assert_eq!(cov.get(0, 1), 0.0);
        assert_abs_diff_eq!(cov.volatility(1), 0.2, epsilon = 1e-15);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let corr = CorrelationMatrix::identity(2);
        let result = build_covariance(&corr, &[0.1]);
        assert!(matches!(
            result,
            Err(CoreError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn test_quadratic_form_uncorrelated_equal_weights() {
        let cov = build_covariance(&CorrelationMatrix::identity(2), &[0.2, 0.2]).unwrap();
        let var = cov.quadratic_form(&[0.5, 0.5]).unwrap();
        assert_abs_diff_eq!(var.sqrt(), 0.2 * 0.5_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_mul_vec_rejects_wrong_length() {
        let cov = build_covariance(&CorrelationMatrix::identity(2), &[0.2, 0.2]).unwrap();
        assert!(cov.mul_vec(&[1.0, 2.0, 3.0]).is_err());
    }
}
