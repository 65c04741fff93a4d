//! Positions and their subjective return percentiles.

use super::CoreError;

/// Lowest admissible annual return (total loss).
pub const RETURN_FLOOR: f64 = -1.0;

/// Minimum spacing between consecutive percentiles.
pub const MIN_PERCENTILE_GAP: f64 = 0.001;

/// Five user-elicited percentiles of a position's one-year return.
///
/// Values are decimal returns (`0.10` is +10%). A valid set is finite,
/// strictly increasing with at least [`MIN_PERCENTILE_GAP`] between
/// neighbours, and never below [`RETURN_FLOOR`].
///
/// # Examples
/// ```
/// use folio_core::types::PercentileSet;
///
/// let p = PercentileSet::new(-0.20, 0.02, 0.10, 0.18, 0.35).unwrap();
/// assert_eq!(p.as_array(), [-0.20, 0.02, 0.10, 0.18, 0.35]);
///
/// assert!(PercentileSet::new(0.1, 0.0, 0.2, 0.3, 0.4).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PercentileSet {
    /// 5th percentile return.
    pub p5: f64,
    /// 25th percentile return.
    pub p25: f64,
    /// Median return.
    pub p50: f64,
    /// 75th percentile return.
    pub p75: f64,
    /// 95th percentile return.
    pub p95: f64,
}

impl PercentileSet {
    /// Creates a validated percentile set.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidPercentiles` if any value is non-finite,
    /// below the return floor, or the sequence is not strictly increasing
    /// by at least the minimum gap.
    pub fn new(p5: f64, p25: f64, p50: f64, p75: f64, p95: f64) -> Result<Self, CoreError> {
        let set = Self {
            p5,
            p25,
            p50,
            p75,
            p95,
        };
        set.validate()?;
        Ok(set)
    }

    /// Returns the percentiles in ascending order.
    #[inline]
    pub fn as_array(&self) -> [f64; 5] {
        [self.p5, self.p25, self.p50, self.p75, self.p95]
    }

    /// Checks the ordering, floor and finiteness invariants.
    pub fn validate(&self) -> Result<(), CoreError> {
        const LABELS: [&str; 5] = ["p5", "p25", "p50", "p75", "p95"];
        let values = self.as_array();

        for (label, value) in LABELS.iter().zip(values.iter()) {
            if !value.is_finite() {
                return Err(CoreError::InvalidPercentiles(format!(
                    "{} is not finite",
                    label
                )));
            }
            if *value < RETURN_FLOOR {
                return Err(CoreError::InvalidPercentiles(format!(
                    "{} = {} is below the total-loss floor",
                    label, value
                )));
            }
        }

        for k in 1..values.len() {
            if values[k] - values[k - 1] < MIN_PERCENTILE_GAP {
                return Err(CoreError::InvalidPercentiles(format!(
                    "{} must exceed {} by at least {}",
                    LABELS[k],
                    LABELS[k - 1],
                    MIN_PERCENTILE_GAP
                )));
            }
        }

        Ok(())
    }
}

/// A single holding in the portfolio.
///
/// Quantity may be negative for short positions. The engine consumes
/// positions read-only; derived distribution parameters are never stored.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Caller-assigned identifier (ticker, ISIN, ...).
    pub id: String,
    /// Signed number of units held.
    pub quantity: f64,
    /// Price per unit in portfolio currency.
    pub price: f64,
    /// Subjective one-year return percentiles.
    pub percentiles: PercentileSet,
}

impl Position {
    /// Creates a position, rejecting non-finite quantity or price and
    /// negative prices.
    pub fn new(
        id: impl Into<String>,
        quantity: f64,
        price: f64,
        percentiles: PercentileSet,
    ) -> Result<Self, CoreError> {
        let id = id.into();
        if !quantity.is_finite() || !price.is_finite() {
            return Err(CoreError::InvalidPosition(format!(
                "{}: quantity and price must be finite",
                id
            )));
        }
        if price < 0.0 {
            return Err(CoreError::InvalidPosition(format!(
                "{}: price must not be negative",
                id
            )));
        }
        Ok(Self {
            id,
            quantity,
            price,
            percentiles,
        })
    }

    /// Signed market value (`quantity * price`).
    #[inline]
    pub fn market_value(&self) -> f64 {
        self.quantity * self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentiles_valid() {
        let p = PercentileSet::new(-0.3, -0.05, 0.05, 0.15, 0.4).unwrap();
        assert_eq!(p.p50, 0.05);
    }

    #[test]
    fn test_percentiles_reject_unordered() {
        let result = PercentileSet::new(-0.3, 0.2, 0.1, 0.25, 0.4);
        assert!(matches!(result, Err(CoreError::InvalidPercentiles(_))));
    }

    #[test]
    fn test_percentiles_reject_small_gap() {
        let result = PercentileSet::new(-0.3, 0.1, 0.1005, 0.2, 0.4);
        assert!(result.is_err());
    }

    #[test]
    fn test_percentiles_reject_below_floor() {
        let result = PercentileSet::new(-1.5, -0.1, 0.0, 0.1, 0.2);
        assert!(result.is_err());
    }

    #[test]
    fn test_percentiles_reject_nan() {
        let result = PercentileSet::new(f64::NAN, -0.1, 0.0, 0.1, 0.2);
        assert!(result.is_err());
    }

    #[test]
    fn test_position_market_value_short() {
        let p = PercentileSet::new(-0.3, -0.05, 0.05, 0.15, 0.4).unwrap();
        let pos = Position::new("XYZ", -10.0, 25.0, p).unwrap();
        assert_eq!(pos.market_value(), -250.0);
    }

    #[test]
    fn test_position_rejects_negative_price() {
        let p = PercentileSet::new(-0.3, -0.05, 0.05, 0.15, 0.4).unwrap();
        assert!(Position::new("XYZ", 1.0, -1.0, p).is_err());
    }
}
