//! # Random Number Generation
//!
//! Sampling sources for scenario generation. Two families are provided:
//!
//! - [`PseudoRandomSource`]: seeded `StdRng` with Box–Muller normals and a
//!   sum-of-squares chi-squared draw
//! - [`HaltonSequence`]: deterministic low-discrepancy points mapped to
//!   normals and chi-squared values through inverse CDFs; simulation runs
//!   use the digit-scrambled form ([`DigitScramble`])
//!
//! Both implement [`SampleSource`], so the scenario generator is written
//! once. [`SamplingSource`] wraps the two for static dispatch; there is no
//! `Box<dyn SampleSource>` in the path loop.
//!
//! ## Usage Example
//!
//! ```rust
//! use folio_engine::rng::{HaltonSequence, LowDiscrepancySequence, SampleSource};
//!
//! // Two assets plus one coordinate for the Student-t mixing variable
//! let mut halton = HaltonSequence::new(3);
//! let mut normals = [0.0; 2];
//! let chi = halton.next_draw(&mut normals, Some(5.0));
//!
//! assert!(chi.unwrap() >= 0.01);
//! assert_eq!(halton.dimension(), 3);
//! ```
//!
//! ## Worker Partitioning
//!
//! Each worker owns its own source. Pseudo-random workers derive distinct
//! seeds from the run seed; Halton workers share one [`DigitScramble`] and
//! start at disjoint sequence offsets, so the union of all workers' points
//! is exactly the contiguous index range `offset + 1 ..= offset + n_paths`.

mod prng;
mod qmc;
mod source;

pub use prng::PseudoRandomSource;
pub use qmc::{
    first_primes, radical_inverse, scrambled_radical_inverse, DigitScramble, HaltonSequence,
    LowDiscrepancySequence, SCRAMBLE_SEED,
};
pub use source::{worker_seed, SampleSource, SamplingMethod, SamplingSource};
