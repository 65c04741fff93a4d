//! Seeded pseudo-random source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Open01};

use folio_core::math::CHI_SQUARED_FLOOR;

use super::source::SampleSource;

/// Pseudo-random sampling source backed by `StdRng`.
///
/// Normals are generated with the Box–Muller transform on `Open01`
/// uniforms, so `ln(u)` is always finite. The second normal of each pair
/// is cached for the next call.
///
/// # Examples
///
/// ```rust
/// use folio_engine::rng::PseudoRandomSource;
///
/// let mut a = PseudoRandomSource::from_seed(7);
/// let mut b = PseudoRandomSource::from_seed(7);
/// assert_eq!(a.gen_normal(), b.gen_normal());
/// ```
#[derive(Clone, Debug)]
pub struct PseudoRandomSource {
    inner: StdRng,
    seed: u64,
    spare: Option<f64>,
}

impl PseudoRandomSource {
    /// Creates a source initialised with the given seed.
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed,
            spare: None,
        }
    }

    /// Returns the seed used for initialisation.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform value in `[0, 1)`.
    #[inline]
    pub fn gen_uniform(&mut self) -> f64 {
        self.inner.gen()
    }

    /// Standard normal variate.
    #[inline]
    pub fn gen_normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        let (z0, z1) = self.box_muller_pair();
        self.spare = Some(z1);
        z0
    }

    /// Chi-squared variate with `df` degrees of freedom, as a sum of
    /// squared normals: `df / 2` Box–Muller pairs, plus one extra squared
    /// normal when `df` is odd. Floored at `0.01`.
    ///
    /// Non-integer `df` is rounded; values below one are treated as one.
    pub fn gen_chi_squared(&mut self, df: f64) -> f64 {
        let k = if df.is_finite() { df.round().max(1.0) as usize } else { 1 };

        let mut sum = 0.0;
        for _ in 0..k / 2 {
            let (a, b) = self.box_muller_pair();
            sum += a * a + b * b;
        }
        if k % 2 == 1 {
            let z = self.gen_normal();
            sum += z * z;
        }
        sum.max(CHI_SQUARED_FLOOR)
    }

    #[inline]
    fn box_muller_pair(&mut self) -> (f64, f64) {
        let u1: f64 = Open01.sample(&mut self.inner);
        let u2: f64 = Open01.sample(&mut self.inner);
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = std::f64::consts::TAU * u2;
        (radius * angle.cos(), radius * angle.sin())
    }
}

impl SampleSource for PseudoRandomSource {
    fn next_uniforms(&mut self, out: &mut [f64]) {
        for value in out.iter_mut() {
            *value = self.gen_uniform();
        }
    }

    fn next_draw(&mut self, normals: &mut [f64], mixing_df: Option<f64>) -> Option<f64> {
        for z in normals.iter_mut() {
            *z = self.gen_normal();
        }
        mixing_df.map(|df| self.gen_chi_squared(df))
    }
}
