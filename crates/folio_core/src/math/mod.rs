//! Numerical transforms shared by the sampler and the analytics.
//!
//! - [`distributions`]: standard normal CDF, inverse normal CDF and the
//!   Wilson–Hilferty inverse chi-squared CDF

pub mod distributions;

pub use distributions::{
    inverse_chi_squared_cdf, inverse_norm_cdf, norm_cdf, CHI_SQUARED_FLOOR, NORMAL_CLAMP,
    PROBABILITY_CLAMP,
};
