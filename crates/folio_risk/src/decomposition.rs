//! Analytic risk decomposition.
//!
//! ```text
//! σ_p      = √(wᵀΣw)
//! MCTR_i   = (Σw)_i / σ_p
//! RC_i     = w_i·(Σw)_i / σ_p²          Σ RC_i = 1
//! ρ_i,p    = (Σw)_i / (σ_i·σ_p)
//! iSharpe_i = S_i − ρ_i,p·S_p
//! ```

use folio_core::correlation::CovarianceMatrix;
use folio_core::types::CoreError;

use crate::error::RiskError;

/// Volatility below which Sharpe ratios and contributions are reported
/// as zero.
pub const MIN_VOLATILITY: f64 = 1e-12;

/// Return, volatility and Sharpe ratio of a weight vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortfolioMetrics {
    /// Expected annual return.
    pub expected_return: f64,
    /// Annual volatility.
    pub volatility: f64,
    /// Sharpe ratio against the risk-free rate.
    pub sharpe: f64,
}

/// `(ret − rf) / vol`, or zero for a degenerate volatility.
#[inline]
pub fn sharpe_ratio(expected_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility > MIN_VOLATILITY {
        (expected_return - risk_free_rate) / volatility
    } else {
        0.0
    }
}

/// Analytic metrics of a weight vector.
///
/// `cash_return` is the constant cash contribution added to the
/// expected return.
///
/// # Errors
///
/// [`CoreError::DimensionMismatch`] if the lengths disagree.
pub fn portfolio_metrics(
    weights: &[f64],
    expected_returns: &[f64],
    covariance: &CovarianceMatrix,
    cash_return: f64,
    risk_free_rate: f64,
) -> Result<PortfolioMetrics, RiskError> {
    if expected_returns.len() != weights.len() {
        return Err(CoreError::DimensionMismatch {
            expected: weights.len(),
            got: expected_returns.len(),
        }
        .into());
    }
    let expected_return = weights
        .iter()
        .zip(expected_returns)
        .map(|(w, m)| w * m)
        .sum::<f64>()
        + cash_return;
    let volatility = covariance.quadratic_form(weights)?.max(0.0).sqrt();
    Ok(PortfolioMetrics {
        expected_return,
        volatility,
        sharpe: sharpe_ratio(expected_return, volatility, risk_free_rate),
    })
}

/// Risk figures for one position.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionRisk {
    /// Position identifier.
    pub id: String,
    /// Signed weight.
    pub weight: f64,
    /// Expected return (distribution location).
    pub expected_return: f64,
    /// Standalone volatility.
    pub volatility: f64,
    /// Standalone Sharpe ratio.
    pub sharpe: f64,
    /// Marginal contribution to risk.
    pub mctr: f64,
    /// Share of portfolio variance.
    pub risk_contribution: f64,
    /// Correlation with the portfolio.
    pub correlation_to_portfolio: f64,
    /// Incremental Sharpe; positive means adding weight improves the
    /// portfolio Sharpe ratio.
    pub incremental_sharpe: f64,
}

/// Portfolio-level metrics plus one row per position.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskDecomposition {
    /// Portfolio metrics.
    pub portfolio: PortfolioMetrics,
    /// Risk-free rate used for every Sharpe ratio.
    pub risk_free_rate: f64,
    /// Per-position rows in input order.
    pub positions: Vec<PositionRisk>,
}

impl RiskDecomposition {
    /// Sum of risk contributions (1 for a non-degenerate portfolio).
    pub fn total_risk_contribution(&self) -> f64 {
        self.positions.iter().map(|p| p.risk_contribution).sum()
    }
}

/// Decomposes portfolio risk per position.
///
/// When the portfolio volatility is degenerate every MCTR, contribution
/// and correlation is zero.
///
/// # Errors
///
/// [`CoreError::DimensionMismatch`] if the inputs disagree in length.
pub fn decompose(
    ids: &[String],
    weights: &[f64],
    expected_returns: &[f64],
    covariance: &CovarianceMatrix,
    cash_return: f64,
    risk_free_rate: f64,
) -> Result<RiskDecomposition, RiskError> {
    if ids.len() != weights.len() {
        return Err(CoreError::DimensionMismatch {
            expected: weights.len(),
            got: ids.len(),
        }
        .into());
    }
    let portfolio = portfolio_metrics(
        weights,
        expected_returns,
        covariance,
        cash_return,
        risk_free_rate,
    )?;
    let sigma_w = covariance.mul_vec(weights)?;
    let vol = portfolio.volatility;
    let degenerate = vol <= MIN_VOLATILITY;

    let positions = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let sigma_i = covariance.volatility(i);
            let sharpe = sharpe_ratio(expected_returns[i], sigma_i, risk_free_rate);
            let (mctr, risk_contribution, correlation) = if degenerate {
                (0.0, 0.0, 0.0)
            } else {
                let corr = if sigma_i > MIN_VOLATILITY {
                    sigma_w[i] / (sigma_i * vol)
                } else {
                    0.0
                };
                (
                    sigma_w[i] / vol,
                    weights[i] * sigma_w[i] / (vol * vol),
                    corr,
                )
            };
            PositionRisk {
                id: id.clone(),
                weight: weights[i],
                expected_return: expected_returns[i],
                volatility: sigma_i,
                sharpe,
                mctr,
                risk_contribution,
                correlation_to_portfolio: correlation,
                incremental_sharpe: sharpe - correlation * portfolio.sharpe,
            }
        })
        .collect();

    Ok(RiskDecomposition {
        portfolio,
        risk_free_rate,
        positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cov(rows: &[Vec<f64>]) -> CovarianceMatrix {
        CovarianceMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_perfectly_correlated_volatility_is_weighted_average() {
        // σ = (0.2, 0.1), ρ = 1
        let c = cov(&[vec![0.04, 0.02], vec![0.02, 0.01]]);
        let m = portfolio_metrics(&[0.5, 0.5], &[0.1, 0.05], &c, 0.0, 0.0).unwrap();
        assert_abs_diff_eq!(m.volatility, 0.15, epsilon = 1e-12);
        assert_abs_diff_eq!(m.expected_return, 0.075, epsilon = 1e-15);
        assert_abs_diff_eq!(m.sharpe, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_uncorrelated_equal_assets() {
        let c = cov(&[vec![0.04, 0.0], vec![0.0, 0.04]]);
        let ids = vec!["A".to_string(), "B".to_string()];
        let d = decompose(&ids, &[0.5, 0.5], &[0.08, 0.08], &c, 0.0, 0.02).unwrap();

        assert_abs_diff_eq!(d.portfolio.volatility, 0.2 * 0.5_f64.sqrt(), epsilon = 1e-12);
        for p in &d.positions {
            assert_abs_diff_eq!(p.risk_contribution, 0.5, epsilon = 1e-12);
            assert_abs_diff_eq!(p.correlation_to_portfolio, 0.5_f64.sqrt(), epsilon = 1e-12);
            assert_abs_diff_eq!(p.sharpe, 0.3, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(d.total_risk_contribution(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_incremental_sharpe_sign() {
        // B has the better Sharpe and low correlation: adding it helps
        let c = cov(&[vec![0.04, 0.0], vec![0.0, 0.01]]);
        let ids = vec!["A".to_string(), "B".to_string()];
        let d = decompose(&ids, &[0.8, 0.2], &[0.06, 0.08], &c, 0.0, 0.0).unwrap();

        assert!(d.positions[1].incremental_sharpe > 0.0);
        assert!(d.positions[0].incremental_sharpe < d.positions[1].incremental_sharpe);
    }

    #[test]
    fn test_degenerate_portfolio() {
        let c = cov(&[vec![0.04, 0.0], vec![0.0, 0.04]]);
        let ids = vec!["A".to_string(), "B".to_string()];
        let d = decompose(&ids, &[0.0, 0.0], &[0.1, 0.1], &c, 0.02, 0.02).unwrap();
        assert_eq!(d.portfolio.sharpe, 0.0);
        assert!(d.positions.iter().all(|p| p.mctr == 0.0));
    }

    #[test]
    fn test_dimension_mismatch() {
        let c = cov(&[vec![0.04]]);
        let result = portfolio_metrics(&[1.0], &[0.1, 0.2], &c, 0.0, 0.0);
        assert!(matches!(
            result,
            Err(RiskError::Core(CoreError::DimensionMismatch { .. }))
        ));
    }
}
