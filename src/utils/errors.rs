// src/utils/errors.rs
//! Error types for logbridge
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is [`LoggerError`]. End of stream is never an error: readers return
//! `Ok(None)` instead.

use thiserror::Error;

/// Errors produced by codecs, the wire format, stores and appenders
#[derive(Debug, Error)]
pub enum LoggerError {
    /// A codec could not acquire an external resource (e.g. a dictionary file)
    #[error("Resource error: {0}")]
    Resource(String),

    /// An encoding name did not resolve in the codec registry
    #[error("Unknown content encoding: {0}")]
    NotFound(String),

    /// A wire record is malformed
    #[error("Decode error in field '{field}': {reason}")]
    Decode { field: String, reason: String },

    /// Text could not be decoded with the requested charset
    #[error("Charset error: {0}")]
    Charset(String),

    /// Compression or decompression failed
    #[error("Compression failed: {0}")]
    Compression(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The underlying store rejected an operation
    #[error("Storage failed: {0}")]
    Storage(String),

    /// An appender was used before `start()`
    #[error("Appender '{0}' is not started")]
    NotStarted(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoggerError {
    /// Create a new Decode error for `field`
    pub fn decode(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new NotFound error
    pub fn not_found(encoding: impl Into<String>) -> Self {
        Self::NotFound(encoding.into())
    }

    /// Create a new Resource error
    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource(message.into())
    }

    /// Create a new Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<::config::ConfigError> for LoggerError {
    fn from(err: ::config::ConfigError) -> Self {
        LoggerError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for LoggerError {
    fn from(err: serde_yaml::Error) -> Self {
        LoggerError::Config(err.to_string())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LoggerError>;
