//! CLI error types.

use thiserror::Error;

use folio_core::types::CoreError;
use folio_risk::RiskError;

/// Errors reported by the `folio` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Invalid command line argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid `folio.toml` or environment override.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input or failed JSON output.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed TOML.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV output failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error raised by the engine.
    #[error("Engine error: {0}")]
    Engine(#[from] RiskError),
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::Engine(RiskError::Core(err))
    }
}

impl From<folio_engine::mc::ConfigError> for CliError {
    fn from(err: folio_engine::mc::ConfigError) -> Self {
        Self::Engine(RiskError::Config(err))
    }
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CliError::FileNotFound("book.json".to_string());
        assert_eq!(err.to_string(), "File not found: book.json");

        let err: CliError = CoreError::NotPositiveDefinite.into();
        assert!(matches!(err, CliError::Engine(RiskError::Core(_))));
    }

    #[test]
    fn test_engine_config_error_is_wrapped() {
        let err: CliError = folio_engine::mc::ConfigError::InvalidPathCount(0).into();
        assert!(err.to_string().contains("Invalid path count 0"));
    }
}
