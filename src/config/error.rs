//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bus URL format")]
    InvalidBusUrl,

    #[error("Invalid bus timeout")]
    InvalidTimeout,

    #[error("Invalid channel delimiter '{0}'")]
    InvalidDelimiter(String),

    #[error("Channel prefix must not be empty")]
    EmptyPrefix,

    #[error("Invalid namespace '{0}', must start with '/'")]
    InvalidNamespace(String),

    #[error("Namespace '{namespace}' contains the channel delimiter '{delimiter}'")]
    NamespaceContainsDelimiter { namespace: String, delimiter: char },
}
