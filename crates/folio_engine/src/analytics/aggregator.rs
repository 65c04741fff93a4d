//! Scenario aggregation.
//!
//! Reduces the merged per-path portfolio returns to percentile tables,
//! tail-risk measures, loss probabilities and a drawdown proxy.

/// Summary percentile levels.
pub const SUMMARY_LEVELS: [f64; 7] = [0.05, 0.10, 0.25, 0.50, 0.75, 0.90, 0.95];

/// Return thresholds for the loss probability table.
pub const LOSS_THRESHOLDS: [f64; 4] = [0.0, -0.10, -0.20, -0.30];

/// One entry of a percentile table.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PercentileValue {
    /// Level in (0, 1), e.g. `0.05`.
    pub level: f64,
    /// Value at that level.
    pub value: f64,
}

/// Probability that a quantity falls beyond a threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdProbability {
    /// Threshold (a return for losses, a depth for drawdowns).
    pub threshold: f64,
    /// Fraction of paths beyond it.
    pub probability: f64,
}

/// Value at risk and expected shortfall at one confidence level.
///
/// Losses are positive numbers: a 5% quantile return of `-0.12` gives
/// `var_return = 0.12`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TailRisk {
    /// Confidence level, e.g. `0.95`.
    pub confidence: f64,
    /// Loss at the `1 - confidence` quantile, as a return.
    pub var_return: f64,
    /// Mean loss beyond that quantile, as a return.
    pub cvar_return: f64,
    /// `var_return` in currency.
    pub var_value: f64,
    /// `cvar_return` in currency.
    pub cvar_value: f64,
}

/// Aggregated statistics of one simulation run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioSummary {
    /// Number of paths aggregated.
    pub n_paths: usize,
    /// Starting portfolio value.
    pub starting_value: f64,
    /// Mean terminal return.
    pub mean_return: f64,
    /// Sample standard deviation of terminal returns.
    pub std_dev: f64,
    /// Standard error of the mean return.
    pub std_error: f64,
    /// Mean terminal value.
    pub mean_value: f64,
    /// Terminal return percentiles.
    pub return_percentiles: Vec<PercentileValue>,
    /// Terminal value percentiles, `starting_value · (1 + r)`.
    pub value_percentiles: Vec<PercentileValue>,
    /// Drawdown proxy percentiles (depths in [0, 1]).
    pub drawdown_percentiles: Vec<PercentileValue>,
    /// `P(r < threshold)` for each loss threshold.
    pub loss_probabilities: Vec<ThresholdProbability>,
    /// `P(drawdown > threshold)` when a threshold was configured.
    pub drawdown_exceedance: Option<ThresholdProbability>,
    /// Tail risk at 95% and 99%.
    pub tail_risk: Vec<TailRisk>,
}

impl ScenarioSummary {
    /// Return percentile at `level`, if it is one of [`SUMMARY_LEVELS`].
    pub fn return_at(&self, level: f64) -> Option<f64> {
        lookup(&self.return_percentiles, level)
    }

    /// Probability of a negative return.
    pub fn probability_of_loss(&self) -> f64 {
        self.loss_probabilities
            .first()
            .map(|p| p.probability)
            .unwrap_or(0.0)
    }

    /// Tail risk at the given confidence, if computed.
    pub fn tail_at(&self, confidence: f64) -> Option<&TailRisk> {
        self.tail_risk
            .iter()
            .find(|t| (t.confidence - confidence).abs() < 1e-12)
    }
}

fn lookup(table: &[PercentileValue], level: f64) -> Option<f64> {
    table
        .iter()
        .find(|p| (p.level - level).abs() < 1e-12)
        .map(|p| p.value)
}

/// Linear-interpolated percentile of an ascending slice.
///
/// Uses rank `level · (n − 1)`. Returns `0.0` for an empty slice.
pub fn percentile_sorted(sorted: &[f64], level: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = level.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Median trough depth of a Brownian bridge from 0 to `terminal_return`
/// with volatility `sigma` over one year, capped at 1.
///
/// ```rust
/// use folio_engine::analytics::drawdown_proxy;
///
/// assert_eq!(drawdown_proxy(0.10, 0.0), 0.0);
/// assert!((drawdown_proxy(-0.25, 0.0) - 0.25).abs() < 1e-12);
/// assert!(drawdown_proxy(0.10, 0.20) > 0.0);
/// ```
#[inline]
pub fn drawdown_proxy(terminal_return: f64, sigma: f64) -> f64 {
    let r = terminal_return;
    let depth = (-r + (r * r + 2.0 * sigma * sigma * std::f64::consts::LN_2).sqrt()) / 2.0;
    depth.clamp(0.0, 1.0)
}

/// Aggregates portfolio returns into a [`ScenarioSummary`].
///
/// Takes ownership of the return buffer; it is sorted in place and
/// dropped when aggregation finishes. Returns `None` for an empty buffer.
///
/// * `portfolio_vol` - analytic portfolio volatility, used by the
///   drawdown proxy
/// * `drawdown_threshold` - depth for the exceedance probability
pub fn aggregate(
    mut returns: Vec<f64>,
    starting_value: f64,
    portfolio_vol: f64,
    drawdown_threshold: Option<f64>,
) -> Option<ScenarioSummary> {
    if returns.is_empty() {
        return None;
    }
    for r in returns.iter_mut() {
        if !r.is_finite() {
            *r = 0.0;
        }
    }
    returns.sort_unstable_by(f64::total_cmp);

    let n = returns.len();
    let nf = n as f64;
    let mean_return = returns.iter().sum::<f64>() / nf;
    let std_dev = if n > 1 {
        (returns.iter().map(|r| (r - mean_return).powi(2)).sum::<f64>() / (nf - 1.0)).sqrt()
    } else {
        0.0
    };
    let std_error = std_dev / nf.sqrt();

    let return_percentiles: Vec<PercentileValue> = SUMMARY_LEVELS
        .iter()
        .map(|&level| PercentileValue {
            level,
            value: percentile_sorted(&returns, level),
        })
        .collect();
    let value_percentiles = return_percentiles
        .iter()
        .map(|p| PercentileValue {
            level: p.level,
            value: starting_value * (1.0 + p.value),
        })
        .collect();

    let loss_probabilities = LOSS_THRESHOLDS
        .iter()
        .map(|&threshold| ThresholdProbability {
            threshold,
            probability: returns.partition_point(|&r| r < threshold) as f64 / nf,
        })
        .collect();

    let tail_risk = [0.95, 0.99]
        .iter()
        .map(|&confidence| tail_risk(&returns, confidence, starting_value))
        .collect();

    // Depth decreases with the return, so reversing keeps it sorted
    let sigma = if portfolio_vol.is_finite() {
        portfolio_vol.max(0.0)
    } else {
        0.0
    };
    let drawdowns: Vec<f64> = returns
        .iter()
        .rev()
        .map(|&r| drawdown_proxy(r, sigma))
        .collect();
    let drawdown_percentiles = SUMMARY_LEVELS
        .iter()
        .map(|&level| PercentileValue {
            level,
            value: percentile_sorted(&drawdowns, level),
        })
        .collect();
    let drawdown_exceedance = drawdown_threshold.map(|threshold| ThresholdProbability {
        threshold,
        probability: (n - drawdowns.partition_point(|&d| d <= threshold)) as f64 / nf,
    });

    Some(ScenarioSummary {
        n_paths: n,
        starting_value,
        mean_return,
        std_dev,
        std_error,
        mean_value: starting_value * (1.0 + mean_return),
        return_percentiles,
        value_percentiles,
        drawdown_percentiles,
        loss_probabilities,
        drawdown_exceedance,
        tail_risk,
    })
}

fn tail_risk(sorted: &[f64], confidence: f64, starting_value: f64) -> TailRisk {
    let alpha = 1.0 - confidence;
    let var_return = -percentile_sorted(sorted, alpha);
    // 1 - 0.95 is slightly above 0.05; keep exact multiples from rounding up
    let tail_len = ((alpha * sorted.len() as f64 - 1e-9).ceil() as usize).clamp(1, sorted.len());
    let cvar_return = -sorted[..tail_len].iter().sum::<f64>() / tail_len as f64;
    TailRisk {
        confidence,
        var_return,
        cvar_return,
        var_value: var_return * starting_value,
        cvar_value: cvar_return * starting_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn uniform_grid(n: usize) -> Vec<f64> {
        // -0.5 ..= 0.5 in equal steps, shuffled order
        let mut v: Vec<f64> = (0..n).map(|i| -0.5 + i as f64 / (n - 1) as f64).collect();
        v.reverse();
        v
    }

    #[test]
    fn test_empty_input_has_no_result() {
        assert!(aggregate(Vec::new(), 100.0, 0.2, None).is_none());
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(percentile_sorted(&sorted, 0.5), 3.0);
        assert_eq!(percentile_sorted(&sorted, 1.0), 5.0);
        assert_abs_diff_eq!(percentile_sorted(&sorted, 0.1), 1.4, epsilon = 1e-12);
        assert_eq!(percentile_sorted(&[7.0], 0.9), 7.0);
    }

    #[test]
    fn test_summary_on_uniform_grid() {
        let summary = aggregate(uniform_grid(1001), 1_000.0, 0.2, None).unwrap();

        assert_eq!(summary.n_paths, 1001);
        assert_abs_diff_eq!(summary.mean_return, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.return_at(0.05).unwrap(), -0.45, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.return_at(0.95).unwrap(), 0.45, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.value_percentiles[3].value, 1_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.mean_value, 1_000.0, epsilon = 1e-9);

        // 500 of 1001 points are strictly negative
        assert_abs_diff_eq!(summary.probability_of_loss(), 500.0 / 1001.0, epsilon = 1e-12);
    }

    #[test]
    fn test_percentiles_are_monotone() {
        let summary = aggregate(uniform_grid(257), 50.0, 0.3, Some(0.2)).unwrap();
        for table in [
            &summary.return_percentiles,
            &summary.value_percentiles,
            &summary.drawdown_percentiles,
        ] {
            for pair in table.windows(2) {
                assert!(pair[0].value <= pair[1].value);
            }
        }
    }

    #[test]
    fn test_tail_risk() {
        let summary = aggregate(uniform_grid(1001), 200.0, 0.2, None).unwrap();
        let t95 = summary.tail_at(0.95).unwrap();

        assert_abs_diff_eq!(t95.var_return, 0.45, epsilon = 1e-12);
        // Mean of the 51 worst points, -0.5 ..= -0.45
        assert_abs_diff_eq!(t95.cvar_return, 0.475, epsilon = 1e-12);
        assert_abs_diff_eq!(t95.var_value, 90.0, epsilon = 1e-9);
        assert!(summary.tail_at(0.99).unwrap().cvar_return >= t95.cvar_return);
    }

    #[test]
    fn test_drawdown_exceedance() {
        let returns = vec![-0.6, -0.4, 0.0, 0.2, 0.5];
        let summary = aggregate(returns, 1.0, 0.0, Some(0.3)).unwrap();
        // With zero volatility the depth is max(0, -r)
        let exceed = summary.drawdown_exceedance.unwrap();
        assert_abs_diff_eq!(exceed.probability, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_input_is_zeroed() {
        let summary = aggregate(vec![f64::NAN, 0.1, -0.1], 10.0, 0.2, None).unwrap();
        assert!(summary.mean_return.is_finite());
        assert_abs_diff_eq!(summary.return_at(0.5).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_drawdown_proxy_bounds() {
        for r in [-2.0, -0.5, 0.0, 0.3, 5.0] {
            let d = drawdown_proxy(r, 0.25);
            assert!((0.0..=1.0).contains(&d));
        }
        assert_eq!(drawdown_proxy(-3.0, 0.1), 1.0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_percentiles_are_ordered_and_bounded(
                returns in prop::collection::vec(-1.0f64..10.0, 1..400),
            ) {
                let lo = returns.iter().cloned().fold(f64::INFINITY, f64::min);
                let hi = returns.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let summary = aggregate(returns, 1_000.0, 0.2, Some(0.1)).unwrap();

                for pair in summary.return_percentiles.windows(2) {
                    prop_assert!(pair[0].value <= pair[1].value);
                }
                for p in &summary.return_percentiles {
                    prop_assert!(p.value >= lo - 1e-12 && p.value <= hi + 1e-12);
                }
                for tail in &summary.tail_risk {
                    prop_assert!(tail.cvar_return >= tail.var_return - 1e-12);
                }
            }
        }
    }
}
