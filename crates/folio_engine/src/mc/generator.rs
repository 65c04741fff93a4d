//! Correlated scenario generator.
//!
//! One path:
//!
//! ```text
//! z      ~ N(0, I)                 independent normals from the source
//! c      = L·z                     correlate via Cholesky
//! z'_i   = skew(c_i, skew_i)       skew-normal transform, clamped to ±8
//! z'_i  *= √(df/χ²)·√((df−2)/df)   shared Student-t mixing (StudentT only)
//! r_i    = clamp(mu_i + z'_i·σ_i, −1, 10)
//! r_p    = Σ w_i·r_i + cash_weight·cash_rate
//! ```

use tracing::warn;

use folio_core::correlation::{CholeskyFactor, CorrelationMatrix};
use folio_core::distribution::{skew_transform, DistributionParams};
use folio_core::types::{CoreError, RETURN_FLOOR};

use super::config::{FatTailMethod, SimulationConfig};
use super::coordinator::{CancellationFlag, CANCELLATION_POLL_INTERVAL};
use super::error::SimulationError;
use super::scenario::ScenarioSet;
use crate::rng::SampleSource;

/// Upper clamp on any simulated annual return.
pub const RETURN_CAP: f64 = 10.0;

/// Immutable inputs shared by every worker of a run.
#[derive(Clone, Debug)]
pub struct ScenarioModel {
    params: Vec<DistributionParams>,
    weights: Vec<f64>,
    cholesky: CholeskyFactor,
    cash_return: f64,
    mixing_df: Option<f64>,
    variance_correction: f64,
    correlation_fallback: bool,
}

impl ScenarioModel {
    /// Builds the model for a run.
    ///
    /// The correlation matrix is checked strictly: if its Cholesky
    /// factorisation fails, the identity matrix is used instead and
    /// [`ScenarioModel::correlation_fallback`] reports it.
    ///
    /// In Student-t mode the shared mixing variable uses the smallest
    /// `tail_df` across assets.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::EmptyPortfolio`] if `params` is empty
    /// - [`CoreError::DimensionMismatch`] if `weights` or `correlation` do
    ///   not match the number of assets
    pub fn new(
        params: Vec<DistributionParams>,
        weights: Vec<f64>,
        correlation: &CorrelationMatrix,
        config: &SimulationConfig,
    ) -> Result<Self, SimulationError> {
        let n = params.len();
        if n == 0 {
            return Err(SimulationError::EmptyPortfolio);
        }
        if weights.len() != n {
            return Err(CoreError::DimensionMismatch {
                expected: n,
                got: weights.len(),
            }
            .into());
        }
        if correlation.dim() != n {
            return Err(CoreError::DimensionMismatch {
                expected: n,
                got: correlation.dim(),
            }
            .into());
        }

        let (cholesky, correlation_fallback) = match correlation.cholesky() {
            Ok(factor) => (factor, false),
            Err(err) => {
                warn!(
                    dim = n,
                    error = %err,
                    "correlation matrix failed Cholesky, using identity"
                );
                (CorrelationMatrix::identity(n).cholesky()?, true)
            }
        };

        let mixing_df = match config.fat_tail() {
            FatTailMethod::StudentT => params.iter().map(|p| p.tail_df).reduce(f64::min),
            FatTailMethod::GaussianCopula => None,
        };
        let variance_correction = match mixing_df {
            Some(df) if df > 2.0 => ((df - 2.0) / df).sqrt(),
            _ => 1.0,
        };

        Ok(Self {
            params,
            weights,
            cholesky,
            cash_return: config.cash_weight() * config.cash_rate(),
            mixing_df,
            variance_correction,
            correlation_fallback,
        })
    }

    /// Returns a copy of this model with different weights.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DimensionMismatch`] if the length differs.
    pub fn with_weights(&self, weights: Vec<f64>) -> Result<Self, SimulationError> {
        if weights.len() != self.weights.len() {
            return Err(CoreError::DimensionMismatch {
                expected: self.weights.len(),
                got: weights.len(),
            }
            .into());
        }
        Ok(Self {
            weights,
            ..self.clone()
        })
    }

    /// Number of assets.
    #[inline]
    pub fn n_assets(&self) -> usize {
        self.params.len()
    }

    /// Per-asset distribution parameters.
    #[inline]
    pub fn params(&self) -> &[DistributionParams] {
        &self.params
    }

    /// Portfolio weights of the risky assets.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Constant cash contribution `cash_weight · cash_rate`.
    #[inline]
    pub fn cash_return(&self) -> f64 {
        self.cash_return
    }

    /// Degrees of freedom of the shared mixing variable, if any.
    #[inline]
    pub fn mixing_df(&self) -> Option<f64> {
        self.mixing_df
    }

    /// `true` if the identity correlation replaced the input.
    #[inline]
    pub fn correlation_fallback(&self) -> bool {
        self.correlation_fallback
    }

    /// Uniform coordinates consumed per path.
    #[inline]
    pub fn draw_dimension(&self) -> usize {
        self.params.len() + usize::from(self.mixing_df.is_some())
    }
}

/// Generates paths for one worker from its own sampling source.
pub struct ScenarioGenerator<'a, S> {
    model: &'a ScenarioModel,
    source: S,
    normals: Vec<f64>,
    correlated: Vec<f64>,
    asset_returns: Vec<f64>,
}

impl<'a, S: SampleSource> ScenarioGenerator<'a, S> {
    /// Creates a generator; buffers are allocated once here.
    pub fn new(model: &'a ScenarioModel, source: S) -> Self {
        let n = model.n_assets();
        Self {
            model,
            source,
            normals: vec![0.0; n],
            correlated: vec![0.0; n],
            asset_returns: vec![0.0; n],
        }
    }

    /// Draws one path and returns the unclamped portfolio return, or
    /// `None` if it is not finite.
    ///
    /// Per-asset returns of the path are available from
    /// [`ScenarioGenerator::asset_returns`] until the next call.
    pub fn next_path(&mut self) -> Option<f64> {
        let model = self.model;
        let chi = self.source.next_draw(&mut self.normals, model.mixing_df);
        model.cholesky.transform_into(&self.normals, &mut self.correlated);

        let scale = match (model.mixing_df, chi) {
            (Some(df), Some(chi)) => (df / chi).sqrt() * model.variance_correction,
            _ => 1.0,
        };

        let mut total = model.cash_return;
        for (i, p) in model.params.iter().enumerate() {
            let z = skew_transform(self.correlated[i], p.skew) * scale;
            let r = (p.mu + z * p.sigma).clamp(RETURN_FLOOR, RETURN_CAP);
            self.asset_returns[i] = r;
            total += model.weights[i] * r;
        }

        total.is_finite().then_some(total)
    }

    /// Per-asset returns of the most recent path.
    #[inline]
    pub fn asset_returns(&self) -> &[f64] {
        &self.asset_returns
    }

    /// Simulates `n_paths` paths.
    ///
    /// Non-finite paths are recorded as `0.0`, counted as anomalies and
    /// left out of the co-moments. The cancellation flag is polled every
    /// 1,024 paths.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Cancelled`] if the flag is raised.
    pub fn simulate(
        mut self,
        n_paths: usize,
        cancel: Option<&CancellationFlag>,
    ) -> Result<ScenarioSet, SimulationError> {
        let mut set = ScenarioSet::with_capacity(self.model.n_assets(), n_paths);

        for k in 0..n_paths {
            if k % CANCELLATION_POLL_INTERVAL == 0 && cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(SimulationError::Cancelled);
            }
            match self.next_path() {
                Some(raw) => {
                    set.moments_mut().push(&self.asset_returns, raw);
                    set.record(raw.clamp(RETURN_FLOOR, RETURN_CAP));
                }
                None => set.record_anomaly(),
            }
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{HaltonSequence, PseudoRandomSource, SamplingMethod};
    use approx::assert_abs_diff_eq;

    fn config(fat_tail: FatTailMethod) -> SimulationConfig {
        SimulationConfig::builder()
            .n_paths(1000)
            .fat_tail(fat_tail)
            .sampling(SamplingMethod::Quasi)
            .cash_weight(0.1)
            .cash_rate(0.04)
            .build()
            .unwrap()
    }

    fn params(mu: f64, sigma: f64, skew: f64, tail_df: f64) -> DistributionParams {
        DistributionParams {
            mu,
            sigma,
            skew,
            tail_df,
        }
    }

    #[test]
    fn test_model_rejects_empty_and_mismatched() {
        let cfg = config(FatTailMethod::StudentT);
        let empty = ScenarioModel::new(vec![], vec![], &CorrelationMatrix::identity(0), &cfg);
        assert!(matches!(empty, Err(SimulationError::EmptyPortfolio)));

        let mismatched = ScenarioModel::new(
            vec![DistributionParams::default(); 2],
            vec![0.5],
            &CorrelationMatrix::identity(2),
            &cfg,
        );
        assert!(matches!(
            mismatched,
            Err(SimulationError::Core(CoreError::DimensionMismatch { .. }))
        ));

        let wrong_corr = ScenarioModel::new(
            vec![DistributionParams::default(); 2],
            vec![0.5, 0.5],
            &CorrelationMatrix::identity(3),
            &cfg,
        );
        assert!(wrong_corr.is_err());
    }

    #[test]
    fn test_model_shares_minimum_tail_df() {
        let model = ScenarioModel::new(
            vec![params(0.1, 0.2, 0.0, 12.0), params(0.05, 0.1, 0.0, 4.0)],
            vec![0.45, 0.45],
            &CorrelationMatrix::identity(2),
            &config(FatTailMethod::StudentT),
        )
        .unwrap();

        assert_eq!(model.mixing_df(), Some(4.0));
        assert_eq!(model.draw_dimension(), 3);
        assert_abs_diff_eq!(model.cash_return(), 0.004, epsilon = 1e-15);
        assert!(!model.correlation_fallback());
    }

    #[test]
    fn test_copula_has_no_mixing_coordinate() {
        let model = ScenarioModel::new(
            vec![DistributionParams::default(); 3],
            vec![0.3, 0.3, 0.3],
            &CorrelationMatrix::identity(3),
            &config(FatTailMethod::GaussianCopula),
        )
        .unwrap();
        assert_eq!(model.mixing_df(), None);
        assert_eq!(model.draw_dimension(), 3);
    }

    #[test]
    fn test_indefinite_correlation_falls_back_to_identity() {
        let corr = CorrelationMatrix::new(&[
            vec![1.0, 0.99, -0.99],
            vec![0.99, 1.0, 0.99],
            vec![-0.99, 0.99, 1.0],
        ])
        .unwrap();
        let model = ScenarioModel::new(
            vec![DistributionParams::default(); 3],
            vec![0.3, 0.3, 0.3],
            &corr,
            &config(FatTailMethod::StudentT),
        )
        .unwrap();
        assert!(model.correlation_fallback());
    }

    #[test]
    fn test_first_halton_path_is_the_median_scenario() {
        // Index 1 maps to u = 0.5 in base 2, so z = 0 and r = mu
        let model = ScenarioModel::new(
            vec![params(0.08, 0.25, 0.0, 30.0)],
            vec![0.9],
            &CorrelationMatrix::identity(1),
            &config(FatTailMethod::GaussianCopula),
        )
        .unwrap();
        let mut generator = ScenarioGenerator::new(&model, HaltonSequence::new(1));
        let total = generator.next_path().unwrap();

        assert_eq!(generator.asset_returns(), &[0.08]);
        assert_abs_diff_eq!(total, 0.9 * 0.08 + 0.004, epsilon = 1e-15);
    }

    #[test]
    fn test_returns_are_clamped() {
        let model = ScenarioModel::new(
            vec![params(0.0, 5.0, 0.0, 3.0)],
            vec![1.0],
            &CorrelationMatrix::identity(1),
            &config(FatTailMethod::StudentT),
        )
        .unwrap();
        let mut generator = ScenarioGenerator::new(&model, PseudoRandomSource::from_seed(11));
        for _ in 0..5_000 {
            generator.next_path();
            let r = generator.asset_returns()[0];
            assert!((RETURN_FLOOR..=RETURN_CAP).contains(&r));
        }
    }

    #[test]
    fn test_simulate_records_every_path() {
        let model = ScenarioModel::new(
            vec![DistributionParams::default(); 2],
            vec![0.45, 0.45],
            &CorrelationMatrix::identity(2),
            &config(FatTailMethod::StudentT),
        )
        .unwrap();
        let set = ScenarioGenerator::new(&model, HaltonSequence::new(model.draw_dimension()))
            .simulate(2_500, None)
            .unwrap();

        assert_eq!(set.len(), 2_500);
        assert_eq!(set.anomalies(), 0);
        assert_eq!(set.moments().count(), 2_500);
        assert!(set.returns().iter().all(|r| r.is_finite()));
    }

    #[test]
    fn test_simulate_observes_cancellation() {
        let model = ScenarioModel::new(
            vec![DistributionParams::default()],
            vec![1.0],
            &CorrelationMatrix::identity(1),
            &config(FatTailMethod::StudentT),
        )
        .unwrap();
        let flag = CancellationFlag::new();
        flag.cancel();

        let result = ScenarioGenerator::new(&model, PseudoRandomSource::from_seed(1))
            .simulate(10_000, Some(&flag));
        assert!(matches!(result, Err(SimulationError::Cancelled)));
    }

    #[test]
    fn test_with_weights() {
        let model = ScenarioModel::new(
            vec![DistributionParams::default(); 2],
            vec![0.5, 0.5],
            &CorrelationMatrix::identity(2),
            &config(FatTailMethod::StudentT),
        )
        .unwrap();
        let shifted = model.with_weights(vec![0.7, 0.3]).unwrap();
        assert_eq!(shifted.weights(), &[0.7, 0.3]);
        assert_eq!(shifted.mixing_df(), model.mixing_df());
        assert!(model.with_weights(vec![1.0]).is_err());
    }
}
