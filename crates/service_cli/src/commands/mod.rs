//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod check;
pub mod derive;
pub mod optimize;
pub mod repair;
pub mod simulate;
