//! Configuration error types and validation traits.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while parsing or validating pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An input size string was not two comma-separated positive integers.
    #[error("invalid input size '{value}': expected two positive integers as \"height,width\"")]
    InvalidInputSize { value: String },

    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A configuration file could not be read.
    #[error("failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("failed to parse configuration file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A trait for validating configuration parameters.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the default configuration.
    fn get_defaults() -> Self
    where
        Self: Sized;

    /// Validates that a thread count, when set, is positive.
    fn validate_thread_count(&self, name: &str, threads: Option<usize>) -> Result<(), ConfigError> {
        match threads {
            Some(0) => Err(ConfigError::InvalidConfig {
                message: format!("{name} must be greater than 0"),
            }),
            _ => Ok(()),
        }
    }
}
