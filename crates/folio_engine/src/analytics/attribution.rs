//! Percentile attribution.
//!
//! Splits each summary percentile of the portfolio return into
//! per-position contributions using the linear conditional expectation
//!
//! ```text
//! β_i            = Cov(r_i, r_p) / Var(r_p)
//! E[r_i | P_k]   ≈ m_i + β_i·(P_k − m_p)
//! contribution_i = w_i · E[r_i | P_k]
//! ```
//!
//! No paths are selected or binned, so there is no selection bias from
//! the correlation between a position and the portfolio. Because
//! `Σ w_i·β_i = 1` and `Σ w_i·m_i + cash = m_p` over the same co-moments,
//! the contributions plus the cash row sum to `P_k`.

use super::aggregator::PercentileValue;
use crate::mc::CoMoments;

/// Contributions at one percentile.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PercentileAttribution {
    /// Percentile level.
    pub level: f64,
    /// Portfolio return at that level.
    pub portfolio_return: f64,
    /// Return contribution per position, in position order.
    pub contributions: Vec<f64>,
    /// Contribution of the cash sleeve.
    pub cash_contribution: f64,
    /// Contribution per position in currency.
    pub contribution_values: Vec<f64>,
}

impl PercentileAttribution {
    /// Sum of all contributions including cash.
    pub fn total(&self) -> f64 {
        self.contributions.iter().sum::<f64>() + self.cash_contribution
    }
}

/// Attribution across all summary percentiles.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribution {
    /// Beta of each position against the portfolio.
    pub betas: Vec<f64>,
    /// Simulated mean return of each position.
    pub means: Vec<f64>,
    /// One row per percentile.
    pub rows: Vec<PercentileAttribution>,
}

/// Attributes each percentile to positions.
///
/// Returns `None` when the moments hold no paths or the weight count
/// does not match the number of assets.
pub fn attribute(
    moments: &CoMoments,
    weights: &[f64],
    cash_return: f64,
    percentiles: &[PercentileValue],
    starting_value: f64,
) -> Option<Attribution> {
    if moments.count() == 0 || weights.len() != moments.n_assets() {
        return None;
    }

    let n = weights.len();
    let betas: Vec<f64> = (0..n).map(|i| moments.beta(i)).collect();
    let means: Vec<f64> = (0..n).map(|i| moments.asset_mean(i)).collect();
    let portfolio_mean = moments.portfolio_mean();

    let rows = percentiles
        .iter()
        .map(|p| {
            let shift = p.value - portfolio_mean;
            let contributions: Vec<f64> = (0..n)
                .map(|i| weights[i] * (means[i] + betas[i] * shift))
                .collect();
            let contribution_values = contributions.iter().map(|c| c * starting_value).collect();
            PercentileAttribution {
                level: p.level,
                portfolio_return: p.value,
                contributions,
                cash_contribution: cash_return,
                contribution_values,
            }
        })
        .collect();

    Some(Attribution { betas, means, rows })
}
