//! Sampling-source abstraction shared by the scenario generator.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::prng::PseudoRandomSource;
use super::qmc::{DigitScramble, HaltonSequence};

/// Sampling family for a simulation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SamplingMethod {
    /// Seeded pseudo-random draws.
    Pseudo,
    /// Scrambled Halton quasi-Monte Carlo points; deterministic for a given
    /// offset.
    #[default]
    Quasi,
}

impl fmt::Display for SamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingMethod::Pseudo => write!(f, "pseudo"),
            SamplingMethod::Quasi => write!(f, "quasi"),
        }
    }
}

impl FromStr for SamplingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pseudo" | "prng" | "random" => Ok(SamplingMethod::Pseudo),
            "quasi" | "qmc" | "halton" => Ok(SamplingMethod::Quasi),
            other => Err(format!("unknown sampling method: {other}")),
        }
    }
}

/// A per-worker producer of scenario draws.
pub trait SampleSource {
    /// Fills `out` with the next point in `[0, 1)^n`.
    fn next_uniforms(&mut self, out: &mut [f64]);

    /// Fills `normals` with independent standard normals and, when
    /// `mixing_df` is set, returns a chi-squared variate with that many
    /// degrees of freedom (floored at `0.01`).
    fn next_draw(&mut self, normals: &mut [f64], mixing_df: Option<f64>) -> Option<f64>;
}

/// Statically dispatched sampling source.
#[derive(Clone, Debug)]
pub enum SamplingSource {
    /// Pseudo-random source.
    Pseudo(PseudoRandomSource),
    /// Halton source.
    Quasi(HaltonSequence),
}

impl SamplingSource {
    /// Pseudo-random source for one worker.
    pub fn pseudo(seed: u64) -> Self {
        SamplingSource::Pseudo(PseudoRandomSource::from_seed(seed))
    }

    /// Scrambled Halton source for one worker; its first point is index
    /// `offset + 1`.
    pub fn quasi(scramble: Arc<DigitScramble>, offset: u64) -> Self {
        SamplingSource::Quasi(HaltonSequence::scrambled(scramble, offset))
    }
}

impl SampleSource for SamplingSource {
    #[inline]
    fn next_uniforms(&mut self, out: &mut [f64]) {
        match self {
            SamplingSource::Pseudo(s) => s.next_uniforms(out),
            SamplingSource::Quasi(s) => s.next_uniforms(out),
        }
    }

    #[inline]
    fn next_draw(&mut self, normals: &mut [f64], mixing_df: Option<f64>) -> Option<f64> {
        match self {
            SamplingSource::Pseudo(s) => s.next_draw(normals, mixing_df),
            SamplingSource::Quasi(s) => s.next_draw(normals, mixing_df),
        }
    }
}

/// Derives a worker seed from the run seed (SplitMix64 finaliser).
///
/// Distinct worker indices give decorrelated streams for the same run seed.
#[inline]
pub fn worker_seed(run_seed: u64, worker: usize) -> u64 {
    let mut z = run_seed.wrapping_add((worker as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
