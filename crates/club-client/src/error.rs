//! Error types for the client layer.

use std::path::PathBuf;

use club_forms::FormError;

/// Errors that can occur while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend did not answer in time.
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The backend answered with an unexpected status.
    #[error("Unexpected status {0}")]
    Status(u16),

    /// A response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// IO error (reading fixtures or rate files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown package type name.
    #[error("Unknown package type: {0}")]
    UnknownPackageType(String),

    /// Configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Form engine problem.
    #[error(transparent)]
    Forms(#[from] FormError),
}

/// Errors raised while loading or editing the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration '{path}': {source}")]
    Read {
        /// Path of the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON of the expected shape.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] serde_json::Error),

    /// A value cannot be stored at a path.
    #[error("Cannot set '{path}': {message}")]
    InvalidValue {
        /// Dotted path.
        path: String,
        /// Why it was refused.
        message: String,
    },

    /// An empty dotted path.
    #[error("Empty configuration path")]
    EmptyPath,
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
