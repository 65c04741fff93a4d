//! Percentile-driven distribution shape parameters.
//!
//! Users describe each position by five return percentiles rather than raw
//! distribution parameters. [`derive_distribution`] turns those into the
//! location, scale, skew and tail-heaviness consumed by the sampler, and
//! [`skew_transform`] is the skew-normal approximation applied per draw.
//!
//! ## Derivation
//!
//! ```text
//! mu      = p50
//! sigma   = max(|p75 - p25| / 1.35, 0.01)
//! skew    = clamp(1.5 * (up - down) / (up + down + eps), -1, 1)
//!           up = max(0.01, p95 - p50), down = max(0.01, p50 - p5)
//! tail_df = clamp(round(30 / max(0.8, |p95 - p5| / (2 * 1.645 * sigma + eps))), 3, 30)
//! ```

mod derive;

pub use derive::{
    derive_distribution, skew_transform, DistributionParams, MAX_TAIL_DF, MIN_SIGMA, MIN_TAIL_DF,
    SKEW_CLAMP,
};
