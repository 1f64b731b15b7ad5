//! Configuration error types

use thiserror::Error;

/// Errors raised while reading service configuration from the environment
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A variable with no sensible default is unset
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// A variable is set but cannot be parsed (variable, reason)
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    /// Connection string does not name a supported database
    #[error("invalid URL format for {0}: {1}")]
    InvalidUrl(String, String),

    /// Values parse individually but contradict each other
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
