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
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Save debounce must be greater than zero")]
    InvalidDebounce,

    #[error("Channel capacity must be greater than zero: {0}")]
    InvalidCapacity(&'static str),

    #[error("Invalid {field} URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("Realtime URL must use ws:// or wss://")]
    RealtimeUrlNotWebSocket,
}
