//! Validated correlation matrix and its Cholesky factor.

use crate::types::CoreError;

/// Lower triangular Cholesky factorisation of a row-major `dim x dim` matrix.
///
/// Succeeds only if every diagonal entry of the factor is finite and
/// strictly positive; this is the positive-definiteness test used
/// throughout the workspace.
pub fn cholesky_lower(data: &[f64], dim: usize) -> Result<Vec<f64>, CoreError> {
    if data.len() != dim * dim {
        return Err(CoreError::DimensionMismatch {
            expected: dim * dim,
            got: data.len(),
        });
    }

    let n = dim;
    let mut lower = vec![0.0; n * n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += lower[i * n + k] * lower[j * n + k];
            }

            if i == j {
                let diag = data[i * n + i] - sum;
                let pivot = diag.sqrt();
                if !(diag > 0.0 && pivot.is_finite() && pivot > 0.0) {
                    return Err(CoreError::NotPositiveDefinite);
                }
                lower[i * n + i] = pivot;
            } else {
                let value = (data[i * n + j] - sum) / lower[j * n + j];
                if !value.is_finite() {
                    return Err(CoreError::NotPositiveDefinite);
                }
                lower[i * n + j] = value;
            }
        }
    }

    Ok(lower)
}

/// Correlation matrix that is symmetric, unit-diagonal and bounded.
///
/// Instances are produced by the repairer, by [`CorrelationMatrix::new`]
/// (strict validation) or by [`CorrelationMatrix::identity`]. They are
/// immutable once built.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationMatrix {
    /// Matrix elements in row-major order.
    data: Vec<f64>,
    /// Matrix dimension (n x n).
    dim: usize,
}

impl CorrelationMatrix {
    /// Create a correlation matrix from rows, validating strictly.
    ///
    /// # Validation
    ///
    /// - Rows must form a square matrix
    /// - Diagonal elements must be 1.0 (within 1e-10)
    /// - Must be symmetric (within 1e-10)
    /// - Off-diagonal elements must be in [-1, 1]
    ///
    /// Positive definiteness is not checked here; see [`Self::cholesky`].
    pub fn new(rows: &[Vec<f64>]) -> Result<Self, CoreError> {
        let (data, dim) = flatten_square(rows)?;
        let epsilon = 1e-10;

        for i in 0..dim {
            let diag = data[i * dim + i];
            if (diag - 1.0).abs() > epsilon {
                return Err(CoreError::InvalidCorrelation(format!(
                    "diagonal element {} is {}, expected 1.0",
                    i, diag
                )));
            }
            for j in (i + 1)..dim {
                let upper = data[i * dim + j];
                let lower = data[j * dim + i];
                if !upper.is_finite() || (upper - lower).abs() > epsilon {
                    return Err(CoreError::InvalidCorrelation(format!(
                        "not symmetric at ({}, {})",
                        i, j
                    )));
                }
                if !(-1.0..=1.0).contains(&upper) {
                    return Err(CoreError::InvalidCorrelation(format!(
                        "correlation at ({}, {}) is {}, must be in [-1, 1]",
                        i, j, upper
                    )));
                }
            }
        }

        Ok(Self { data, dim })
    }

    /// Create an identity correlation matrix (no correlation).
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![0.0; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = 1.0;
        }
        Self { data, dim }
    }

    /// Builds from a flat buffer the caller has already made symmetric,
    /// bounded and unit-diagonal.
    pub(crate) fn from_repaired(data: Vec<f64>, dim: usize) -> Self {
        debug_assert_eq!(data.len(), dim * dim);
        Self { data, dim }
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

    /// Row-major elements.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Matrix as a vector of rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.dim.max(1)).map(|r| r.to_vec()).collect()
    }

    /// Returns `true` if the Cholesky factorisation succeeds.
    #[inline]
    pub fn is_positive_definite(&self) -> bool {
        cholesky_lower(&self.data, self.dim).is_ok()
    }

    /// Compute the Cholesky decomposition `C = L * L^T`.
    ///
    /// # Errors
    ///
    /// `CoreError::NotPositiveDefinite` if any pivot is non-positive or
    /// non-finite.
    pub fn cholesky(&self) -> Result<CholeskyFactor, CoreError> {
        let data = cholesky_lower(&self.data, self.dim)?;
        Ok(CholeskyFactor {
            data,
            dim: self.dim,
        })
    }
}

/// Flattens rows into a row-major buffer, checking squareness.
pub(crate) fn flatten_square(rows: &[Vec<f64>]) -> Result<(Vec<f64>, usize), CoreError> {
    let dim = rows.len();
    let mut data = Vec::with_capacity(dim * dim);
    for (row_idx, row) in rows.iter().enumerate() {
        if row.len() != dim {
            return Err(CoreError::NotSquare {
                row: row_idx,
                expected: dim,
                got: row.len(),
            });
        }
        data.extend_from_slice(row);
    }
    Ok((data, dim))
}

/// Lower triangular Cholesky factor of a correlation matrix.
///
/// Used to transform independent standard normals into correlated normals.
#[derive(Clone, Debug)]
pub struct CholeskyFactor {
    /// Lower triangular matrix elements (row-major).
    data: Vec<f64>,
    /// Matrix dimension.
    dim: usize,
}

impl CholeskyFactor {
    /// Get matrix dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Get element at (i, j). Returns zero above the diagonal.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if j > i {
            0.0
        } else {
            self.data[i * self.dim + j]
        }
    }

    /// Computes `out = L * z` without allocating.
    ///
    /// # Panics
    ///
    /// Panics if `z` or `out` is shorter than `self.dim()`.
    #[inline]
    pub fn transform_into(&self, z: &[f64], out: &mut [f64]) {
        assert!(
            z.len() >= self.dim && out.len() >= self.dim,
            "buffer length is less than matrix dimension {}",
            self.dim
        );

        let n = self.dim;
        for i in 0..n {
            let row = &self.data[i * n..i * n + i + 1];
            out[i] = row.iter().zip(z.iter()).map(|(l, x)| l * x).sum();
        }
    }

    /// Transform independent standard normals to correlated normals.
    pub fn transform(&self, z: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.dim];
        self.transform_into(z, &mut out);
        out
    }
}
