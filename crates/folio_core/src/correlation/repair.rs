//! Correlation Repairer: bounded-effort projection towards a valid matrix.
//!
//! The repair is a heuristic, not Higham's nearest-correlation algorithm:
//! after [`MAX_REPAIR_ITERATIONS`] shrink steps the result may still fail
//! the Cholesky test on adversarial input. Callers must treat the output
//! as "best effort valid" and re-check at the point of use.

use tracing::{debug, warn};

use super::matrix::{cholesky_lower, flatten_square, CorrelationMatrix};
use crate::types::CoreError;

/// Off-diagonal entries are clamped into `[-MAX_CORRELATION, MAX_CORRELATION]`.
pub const MAX_CORRELATION: f64 = 0.999;

/// Multiplier applied to every off-diagonal entry per failed attempt.
pub const SHRINK_FACTOR: f64 = 0.95;

/// Maximum number of shrink steps.
pub const MAX_REPAIR_ITERATIONS: usize = 50;

/// Outcome of a repair, including how much work it took.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RepairReport {
    /// The repaired matrix.
    pub matrix: CorrelationMatrix,
    /// Number of shrink steps applied.
    pub iterations: usize,
    /// Whether any entry differs from the input.
    pub was_modified: bool,
    /// Whether the result passes the Cholesky test.
    pub is_positive_definite: bool,
}

/// Repairs an arbitrary square matrix into a usable correlation matrix.
///
/// See [`repair_correlation_with_report`] for the algorithm.
///
/// # Errors
///
/// Only `CoreError::NotSquare` when the rows do not form a square matrix.
pub fn repair_correlation(raw: &[Vec<f64>]) -> Result<CorrelationMatrix, CoreError> {
    repair_correlation_with_report(raw).map(|report| report.matrix)
}

/// Repairs a matrix and reports the effort spent.
///
/// # Algorithm
///
/// 1. Symmetrise by averaging `(i, j)` and `(j, i)`; non-finite entries
///    are treated as zero correlation
/// 2. Clamp off-diagonals into `[-0.999, 0.999]`
/// 3. Force the diagonal to 1.0
/// 4. Test with Cholesky (every pivot finite and > 0)
/// 5. On failure multiply all off-diagonals by 0.95 and retry, at most
///    50 times
/// 6. Return the last matrix obtained
///
/// Pathological input degrades towards the identity matrix. The function
/// is pure and never fails for square input.
pub fn repair_correlation_with_report(raw: &[Vec<f64>]) -> Result<RepairReport, CoreError> {
    let (input, dim) = flatten_square(raw)?;
    let mut data = vec![0.0; dim * dim];

    for i in 0..dim {
        data[i * dim + i] = 1.0;
        for j in (i + 1)..dim {
            let upper = finite_or_zero(input[i * dim + j]);
            let lower = finite_or_zero(input[j * dim + i]);
            let value = (0.5 * (upper + lower)).clamp(-MAX_CORRELATION, MAX_CORRELATION);
            data[i * dim + j] = value;
            data[j * dim + i] = value;
        }
    }

    let mut iterations = 0;
    let mut is_positive_definite = cholesky_lower(&data, dim).is_ok();
    while !is_positive_definite && iterations < MAX_REPAIR_ITERATIONS {
        for i in 0..dim {
            for j in 0..dim {
                if i != j {
                    data[i * dim + j] *= SHRINK_FACTOR;
                }
            }
        }
        iterations += 1;
        is_positive_definite = cholesky_lower(&data, dim).is_ok();
    }

    if is_positive_definite {
        debug!(dim, iterations, "correlation matrix repaired");
    } else {
        warn!(
            dim,
            iterations, "correlation repair exhausted its iteration budget; matrix is not PSD"
        );
    }

    let was_modified = input
        .iter()
        .zip(data.iter())
        .any(|(before, after)| before != after);

    Ok(RepairReport {
        matrix: CorrelationMatrix::from_repaired(data, dim),
        iterations,
        was_modified,
        is_positive_definite,
    })
}

#[inline]
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
