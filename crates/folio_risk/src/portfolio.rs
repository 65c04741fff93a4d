//! Portfolio weights.
//!
//! Risky weights are market values normalised by gross exposure and
//! scaled to the invested fraction:
//!
//! ```text
//! w_i = v_i / Σ|v_j| · (1 − cash_weight)
//! ```
//!
//! so `Σ|w_i| + cash_weight = 1`. Short positions carry negative weights.

use folio_core::types::Position;

use crate::error::RiskError;

/// Normalised weights and values of a portfolio.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortfolioWeights {
    ids: Vec<String>,
    market_values: Vec<f64>,
    weights: Vec<f64>,
    gross_value: f64,
    cash_weight: f64,
    starting_value: f64,
}

impl PortfolioWeights {
    /// Computes weights from positions.
    ///
    /// The starting value is `starting_value` if given, otherwise the
    /// gross market value grossed up for cash, `Σ|v| / (1 − cash_weight)`.
    ///
    /// # Errors
    ///
    /// - [`RiskError::EmptyPortfolio`] if there are no positions
    /// - [`RiskError::InvalidWeights`] if the gross market value is zero
    ///   or not finite, or `cash_weight` is outside `[0, 1)`
    pub fn from_positions(
        positions: &[Position],
        cash_weight: f64,
        starting_value: Option<f64>,
    ) -> Result<Self, RiskError> {
        if positions.is_empty() {
            return Err(RiskError::EmptyPortfolio);
        }
        if !(0.0..1.0).contains(&cash_weight) {
            return Err(RiskError::InvalidWeights(format!(
                "cash weight {} is not in [0, 1)",
                cash_weight
            )));
        }

        let market_values: Vec<f64> = positions.iter().map(Position::market_value).collect();
        let gross_value: f64 = market_values.iter().map(|v| v.abs()).sum();
        if !(gross_value.is_finite() && gross_value > 0.0) {
            return Err(RiskError::InvalidWeights(format!(
                "gross market value is {}",
                gross_value
            )));
        }

        let invested = 1.0 - cash_weight;
        let weights = market_values
            .iter()
            .map(|v| v / gross_value * invested)
            .collect();

        Ok(Self {
            ids: positions.iter().map(|p| p.id.clone()).collect(),
            market_values,
            weights,
            gross_value,
            cash_weight,
            starting_value: starting_value.unwrap_or(gross_value / invested),
        })
    }

    /// Position identifiers in input order.
    #[inline]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Signed market values.
    #[inline]
    pub fn market_values(&self) -> &[f64] {
        &self.market_values
    }

    /// Signed risky weights.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Sum of absolute market values.
    #[inline]
    pub fn gross_value(&self) -> f64 {
        self.gross_value
    }

    /// Cash weight.
    #[inline]
    pub fn cash_weight(&self) -> f64 {
        self.cash_weight
    }

    /// Portfolio value used for dollar outputs.
    #[inline]
    pub fn starting_value(&self) -> f64 {
        self.starting_value
    }

    /// Number of positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns `true` if there are no positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of absolute risky weights (`1 − cash_weight`).
    pub fn gross_exposure(&self) -> f64 {
        self.weights.iter().map(|w| w.abs()).sum()
    }
}
