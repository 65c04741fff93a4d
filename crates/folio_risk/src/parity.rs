//! Risk-parity weights by damped fixed-point iteration.

use tracing::{debug, warn};

use folio_core::correlation::CovarianceMatrix;

use crate::decomposition::MIN_VOLATILITY;
use crate::error::RiskError;

/// Result of the risk-parity search.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskParityResult {
    /// Long-only weights summing to the risk budget.
    pub weights: Vec<f64>,
    /// Final risk contributions (sum to 1).
    pub risk_contributions: Vec<f64>,
    /// Portfolio volatility at the final weights.
    pub volatility: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether every contribution is within tolerance of `1/n`.
    pub converged: bool,
}

/// Finds weights whose risk contributions `w_i·(Σw)_i / σ_p²` are equal.
///
/// Starts from inverse-volatility weights and applies
/// `w_i ← w_i·√(target / RC_i)`, renormalising to `budget` after each
/// step. Stops when `max |RC_i − 1/n| < tolerance` or after
/// `max_iterations`; non-convergence is logged and reported, not raised.
///
/// # Errors
///
/// - [`RiskError::EmptyPortfolio`] if the covariance matrix is empty
/// - [`RiskError::InvalidWeights`] if `budget` is not positive
pub fn risk_parity_weights(
    covariance: &CovarianceMatrix,
    budget: f64,
    max_iterations: usize,
    tolerance: f64,
) -> Result<RiskParityResult, RiskError> {
    let n = covariance.dim();
    if n == 0 {
        return Err(RiskError::EmptyPortfolio);
    }
    if !(budget.is_finite() && budget > 0.0) {
        return Err(RiskError::InvalidWeights(format!(
            "risk budget {} must be positive",
            budget
        )));
    }

    let target = 1.0 / n as f64;
    let mut weights: Vec<f64> = (0..n)
        .map(|i| 1.0 / covariance.volatility(i).max(MIN_VOLATILITY))
        .collect();
    normalise(&mut weights, budget);

    let mut contributions = risk_contributions(covariance, &weights)?;
    let mut iterations = 0;
    let mut converged = max_deviation(&contributions, target) < tolerance;

    while !converged && iterations < max_iterations {
        iterations += 1;
        for (w, rc) in weights.iter_mut().zip(&contributions) {
            *w *= if *rc > f64::EPSILON {
                (target / rc).sqrt()
            } else {
                2.0
            };
        }
        normalise(&mut weights, budget);
        contributions = risk_contributions(covariance, &weights)?;
        converged = max_deviation(&contributions, target) < tolerance;
    }

    if converged {
        debug!(iterations, "risk parity converged");
    } else {
        warn!(
            iterations,
            deviation = max_deviation(&contributions, target),
            "risk parity did not converge"
        );
    }

    let volatility = covariance.quadratic_form(&weights)?.max(0.0).sqrt();
    Ok(RiskParityResult {
        weights,
        risk_contributions: contributions,
        volatility,
        iterations,
        converged,
    })
}

fn risk_contributions(covariance: &CovarianceMatrix, weights: &[f64]) -> Result<Vec<f64>, RiskError> {
    let sigma_w = covariance.mul_vec(weights)?;
    let variance: f64 = weights.iter().zip(&sigma_w).map(|(w, s)| w * s).sum();
    if variance <= MIN_VOLATILITY * MIN_VOLATILITY {
        return Ok(vec![0.0; weights.len()]);
    }
    Ok(weights
        .iter()
        .zip(&sigma_w)
        .map(|(w, s)| w * s / variance)
        .collect())
}

fn max_deviation(contributions: &[f64], target: f64) -> f64 {
    contributions
        .iter()
        .map(|rc| (rc - target).abs())
        .fold(0.0, f64::max)
}

fn normalise(weights: &mut [f64], budget: f64) {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in weights.iter_mut() {
            *w *= budget / total;
        }
    }
}
