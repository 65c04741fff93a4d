//! Swap search.
//!
//! For every ordered pair `(sell, buy)` a fixed fraction of gross
//! exposure is moved from `sell` to `buy` with every other weight held
//! fixed, and the analytic change in return, volatility and Sharpe ratio
//! is recorded. Rows are evaluated in parallel.

use rayon::prelude::*;

use folio_core::correlation::CovarianceMatrix;
use folio_core::types::CoreError;

use crate::decomposition::{portfolio_metrics, PortfolioMetrics};
use crate::error::RiskError;

/// Change in analytic metrics produced by one swap.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapDelta {
    /// Change in expected return.
    pub delta_return: f64,
    /// Change in volatility.
    pub delta_volatility: f64,
    /// Change in Sharpe ratio.
    pub delta_sharpe: f64,
    /// Metrics after the swap.
    pub after: PortfolioMetrics,
}

/// A ranked swap.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapCandidate {
    /// Index of the position sold.
    pub sell: usize,
    /// Index of the position bought.
    pub buy: usize,
    /// Identifier of the position sold.
    pub sell_id: String,
    /// Identifier of the position bought.
    pub buy_id: String,
    /// Weight moved.
    pub amount: f64,
    /// Analytic effect.
    pub delta: SwapDelta,
}

/// All ordered-pair swaps. Diagonal cells are `None`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapMatrix {
    /// Position identifiers; row = sell, column = buy.
    pub ids: Vec<String>,
    /// Weight moved by every swap.
    pub amount: f64,
    /// Metrics before any swap.
    pub baseline: PortfolioMetrics,
    /// `cells[sell][buy]`.
    pub cells: Vec<Vec<Option<SwapDelta>>>,
}

impl SwapMatrix {
    /// Returns the cell for `(sell, buy)`.
    pub fn get(&self, sell: usize, buy: usize) -> Option<&SwapDelta> {
        self.cells.get(sell)?.get(buy)?.as_ref()
    }

    /// All swaps sorted by Sharpe improvement, best first.
    pub fn ranked(&self) -> Vec<SwapCandidate> {
        let mut candidates: Vec<SwapCandidate> = self
            .cells
            .iter()
            .enumerate()
            .flat_map(|(sell, row)| {
                row.iter().enumerate().filter_map(move |(buy, cell)| {
                    cell.as_ref().map(|&delta| SwapCandidate {
                        sell,
                        buy,
                        sell_id: self.ids[sell].clone(),
                        buy_id: self.ids[buy].clone(),
                        amount: self.amount,
                        delta,
                    })
                })
            })
            .collect();
        candidates.sort_by(|a, b| b.delta.delta_sharpe.total_cmp(&a.delta.delta_sharpe));
        candidates
    }
}

/// Weights after moving `amount` from `sell` to `buy`.
pub fn swapped_weights(weights: &[f64], sell: usize, buy: usize, amount: f64) -> Vec<f64> {
    let mut out = weights.to_vec();
    out[sell] -= amount;
    out[buy] += amount;
    out
}

/// Builds the swap matrix.
///
/// The amount moved is `fraction · Σ|w_i|`.
///
/// # Errors
///
/// [`CoreError::DimensionMismatch`] if the inputs disagree in length.
pub fn build_swap_matrix(
    ids: &[String],
    weights: &[f64],
    expected_returns: &[f64],
    covariance: &CovarianceMatrix,
    cash_return: f64,
    risk_free_rate: f64,
    fraction: f64,
) -> Result<SwapMatrix, RiskError> {
    let n = weights.len();
    if ids.len() != n || covariance.dim() != n {
        return Err(CoreError::DimensionMismatch {
            expected: n,
            got: if ids.len() != n { ids.len() } else { covariance.dim() },
        }
        .into());
    }
    let baseline = portfolio_metrics(
        weights,
        expected_returns,
        covariance,
        cash_return,
        risk_free_rate,
    )?;
    let amount = fraction * weights.iter().map(|w| w.abs()).sum::<f64>();

    let cells = (0..n)
        .into_par_iter()
        .map(|sell| {
            (0..n)
                .map(|buy| {
                    if sell == buy {
                        return Ok(None);
                    }
                    let after = portfolio_metrics(
                        &swapped_weights(weights, sell, buy, amount),
                        expected_returns,
                        covariance,
                        cash_return,
                        risk_free_rate,
                    )?;
                    Ok(Some(SwapDelta {
                        delta_return: after.expected_return - baseline.expected_return,
                        delta_volatility: after.volatility - baseline.volatility,
                        delta_sharpe: after.sharpe - baseline.sharpe,
                        after,
                    }))
                })
                .collect::<Result<Vec<_>, RiskError>>()
        })
        .collect::<Result<Vec<_>, RiskError>>()?;

    Ok(SwapMatrix {
        ids: ids.to_vec(),
        amount,
        baseline,
        cells,
    })
}
