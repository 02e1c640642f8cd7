// src/utils/mod.rs
//! Shared utilities: configuration and error types

pub mod config;
pub mod errors;

pub use config::{AppenderConfig, CodecConfig, LoggerConfig};
pub use errors::{LoggerError, Result};
