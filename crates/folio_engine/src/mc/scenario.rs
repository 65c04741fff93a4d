//! Path outcomes and streaming co-moments.

/// Running sums needed for per-asset betas against the portfolio.
///
/// Only finite paths are accumulated. The portfolio value pushed is the
/// unclamped weighted sum, so that `Σ w_i·E[r_i] + cash = E[r_p]` holds
/// exactly and attributions reconcile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoMoments {
    count: usize,
    sum_portfolio: f64,
    sum_portfolio_sq: f64,
    sum_asset: Vec<f64>,
    sum_asset_sq: Vec<f64>,
    sum_cross: Vec<f64>,
}

impl CoMoments {
    /// Creates empty accumulators for `n_assets` assets.
    pub fn new(n_assets: usize) -> Self {
        Self {
            count: 0,
            sum_portfolio: 0.0,
            sum_portfolio_sq: 0.0,
            sum_asset: vec![0.0; n_assets],
            sum_asset_sq: vec![0.0; n_assets],
            sum_cross: vec![0.0; n_assets],
        }
    }

    /// Adds one path.
    #[inline]
    pub fn push(&mut self, asset_returns: &[f64], portfolio_return: f64) {
        self.count += 1;
        self.sum_portfolio += portfolio_return;
        self.sum_portfolio_sq += portfolio_return * portfolio_return;
        for (i, &r) in asset_returns.iter().enumerate() {
            self.sum_asset[i] += r;
            self.sum_asset_sq[i] += r * r;
            self.sum_cross[i] += r * portfolio_return;
        }
    }

    /// Folds another accumulator into this one.
    pub fn merge(&mut self, other: &CoMoments) {
        if self.sum_asset.is_empty() {
            self.sum_asset = vec![0.0; other.sum_asset.len()];
            self.sum_asset_sq = vec![0.0; other.sum_asset.len()];
            self.sum_cross = vec![0.0; other.sum_asset.len()];
        }
        self.count += other.count;
        self.sum_portfolio += other.sum_portfolio;
        self.sum_portfolio_sq += other.sum_portfolio_sq;
        for i in 0..self.sum_asset.len().min(other.sum_asset.len()) {
            self.sum_asset[i] += other.sum_asset[i];
            self.sum_asset_sq[i] += other.sum_asset_sq[i];
            self.sum_cross[i] += other.sum_cross[i];
        }
    }

    /// Number of accumulated paths.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of assets tracked.
    #[inline]
    pub fn n_assets(&self) -> usize {
        self.sum_asset.len()
    }

    /// Mean portfolio return.
    pub fn portfolio_mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum_portfolio / self.count as f64
    }

    /// Sample variance of the portfolio return.
    pub fn portfolio_variance(&self) -> f64 {
        self.sample_covariance(self.sum_portfolio, self.sum_portfolio, self.sum_portfolio_sq)
            .max(0.0)
    }

    /// Mean return of asset `i`.
    pub fn asset_mean(&self, i: usize) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum_asset[i] / self.count as f64
    }

    /// Sample variance of asset `i`.
    pub fn asset_variance(&self, i: usize) -> f64 {
        self.sample_covariance(self.sum_asset[i], self.sum_asset[i], self.sum_asset_sq[i])
            .max(0.0)
    }

    /// Sample covariance between asset `i` and the portfolio.
    pub fn asset_portfolio_covariance(&self, i: usize) -> f64 {
        self.sample_covariance(self.sum_asset[i], self.sum_portfolio, self.sum_cross[i])
    }

    /// `Cov(r_i, r_p) / Var(r_p)`, or zero when the portfolio variance
    /// is degenerate.
    pub fn beta(&self, i: usize) -> f64 {
        let var = self.portfolio_variance();
        if var > f64::EPSILON * f64::EPSILON {
            self.asset_portfolio_covariance(i) / var
        } else {
            0.0
        }
    }

    #[inline]
    fn sample_covariance(&self, sum_x: f64, sum_y: f64, sum_xy: f64) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let n = self.count as f64;
        (sum_xy - sum_x * sum_y / n) / (n - 1.0)
    }
}

/// Outcome of a chunk or of a whole run.
///
/// Portfolio returns are held in path order. Anomalous paths appear as
/// `0.0` and are counted in [`ScenarioSet::anomalies`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioSet {
    returns: Vec<f64>,
    moments: CoMoments,
    anomalies: usize,
}

impl ScenarioSet {
    /// Creates an empty set with room for `capacity` paths.
    pub fn with_capacity(n_assets: usize, capacity: usize) -> Self {
        Self {
            returns: Vec::with_capacity(capacity),
            moments: CoMoments::new(n_assets),
            anomalies: 0,
        }
    }

    /// Concatenates chunks in the given order.
    pub fn merge(chunks: Vec<ScenarioSet>) -> Self {
        let total = chunks.iter().map(|c| c.returns.len()).sum();
        let n_assets = chunks.first().map(|c| c.moments.n_assets()).unwrap_or(0);
        let mut merged = Self::with_capacity(n_assets, total);
        for chunk in chunks {
            merged.returns.extend_from_slice(&chunk.returns);
            merged.moments.merge(&chunk.moments);
            merged.anomalies += chunk.anomalies;
        }
        merged
    }

    #[inline]
    pub(crate) fn record(&mut self, portfolio_return: f64) {
        self.returns.push(portfolio_return);
    }

    #[inline]
    pub(crate) fn record_anomaly(&mut self) {
        self.returns.push(0.0);
        self.anomalies += 1;
    }

    #[inline]
    pub(crate) fn moments_mut(&mut self) -> &mut CoMoments {
        &mut self.moments
    }

    /// Number of paths.
    #[inline]
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Returns `true` if no paths were recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Portfolio returns in path order.
    #[inline]
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// Consumes the set, returning the portfolio return buffer.
    #[inline]
    pub fn into_returns(self) -> Vec<f64> {
        self.returns
    }

    /// Splits the set into its return buffer and co-moments.
    #[inline]
    pub fn into_parts(self) -> (Vec<f64>, CoMoments) {
        (self.returns, self.moments)
    }

    /// Co-moments over finite paths.
    #[inline]
    pub fn moments(&self) -> &CoMoments {
        &self.moments
    }

    /// Number of paths coerced to zero.
    #[inline]
    pub fn anomalies(&self) -> usize {
        self.anomalies
    }

    /// Fraction of paths coerced to zero.
    pub fn anomaly_rate(&self) -> f64 {
        if self.returns.is_empty() {
            0.0
        } else {
            self.anomalies as f64 / self.returns.len() as f64
        }
    }
}
