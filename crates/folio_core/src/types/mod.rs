//! Core value types for portfolio simulation.
//!
//! This module provides:
//! - `PercentileSet`: Five user-elicited return percentiles
//! - `Position`: A holding with quantity, price and return percentiles
//! - `CoreError`: Structured errors for caller contract violations

mod error;
mod position;

pub use error::CoreError;
pub use position::{PercentileSet, Position, MIN_PERCENTILE_GAP, RETURN_FLOOR};
