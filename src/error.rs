//! Error types for the emulator service.

use thiserror::Error;

use crate::ratelimit::LimitExceeded;

/// Main error type for emulator operations.
#[derive(Error, Debug)]
pub enum EmulatorError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The inbound request body was not a JSON document
    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// A mocked request exceeded one of the caller's limits
    #[error(transparent)]
    LimitExceeded(#[from] LimitExceeded),

    /// Forwarding to the upstream API failed
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for emulator operations.
pub type Result<T> = std::result::Result<T, EmulatorError>;
