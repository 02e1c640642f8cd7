// src/lib.rs
//! logbridge
//!
//! Bridges application logging frameworks to a compact binary log store.
//! Framework events are normalized into [`Entry`] values, encoded into
//! self-describing binary records, and later decoded and decompressed back
//! into text through a [`CodecRegistry`].
//!
//! # Architecture
//!
//! - **codec**: named compression transforms and the registry resolving them
//! - **entry**: the normalized record and its wire encoder/decoder
//! - **processor**: turns entries back into text (charset aware)
//! - **store**: append/read traits with in-memory and mmap implementations
//! - **appender**: `tracing` and `log` bindings producing entries
//! - **observability**: subscriber setup for the CLI
//! - **utils**: configuration and errors

pub mod appender;
pub mod codec;
pub mod entry;
pub mod observability;
pub mod processor;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use appender::{LogAppender, LogFacadeAppender, TracingAppender};
pub use codec::{Codec, CodecRegistry};
pub use entry::{Entry, EntryBuilder, EntryReader, EntryWriter};
pub use processor::{EntryProcessor, TextEntryProcessor};
pub use store::{AppendSink, RecordSource};
pub use utils::config::{AppenderConfig, CodecConfig, LoggerConfig};
pub use utils::errors::{LoggerError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
