// src/entry/mod.rs
//! Normalized log entries and their binary wire format
//!
//! - **Entry**: immutable record built from a framework event
//! - **EntryWriter**: encodes entries and appends them to a sink
//! - **EntryReader**: decodes entries from a record source
//!
//! # Data flow
//!
//! ```text
//! framework event → appender → Entry → EntryWriter → AppendSink
//!                                                        ↓
//!            String ← EntryProcessor ← Entry ← EntryReader ← RecordSource
//! ```

pub mod reader;
pub mod wire;
pub mod writer;

pub use reader::EntryReader;
pub use writer::EntryWriter;

use crate::utils::config::{DEFAULT_CONTENT_ENCODING, DEFAULT_CONTENT_TYPE};
use crate::utils::errors::{LoggerError, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Numeric levels written by the bundled appenders
pub mod level {
    pub const ERROR: i32 = 1000;
    pub const WARN: i32 = 900;
    pub const INFO: i32 = 800;
    pub const DEBUG: i32 = 500;
    pub const TRACE: i32 = 300;

    /// Short label for a numeric level; unknown values map to the nearest band below
    pub fn label(level: i32) -> &'static str {
        match level {
            l if l >= ERROR => "ERROR",
            l if l >= WARN => "WARN",
            l if l >= INFO => "INFO",
            l if l >= DEBUG => "DEBUG",
            _ => "TRACE",
        }
    }
}

/// A log record ready for binary storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    timestamp: DateTime<Utc>,
    level: i32,
    thread_name: String,
    logger_name: String,
    content: Bytes,
    content_type: Option<String>,
    content_encoding: String,
}

impl Entry {
    pub fn builder() -> EntryBuilder {
        EntryBuilder::default()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// Raw content, possibly compressed according to `content_encoding`
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_encoding(&self) -> &str {
        &self.content_encoding
    }
}

/// Builds an [`Entry`]; nothing is visible until [`EntryBuilder::build`] succeeds
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    timestamp: Option<DateTime<Utc>>,
    level: i32,
    thread_name: Option<String>,
    logger_name: String,
    content: Bytes,
    content_type: Option<String>,
    content_encoding: String,
}

impl Default for EntryBuilder {
    fn default() -> Self {
        Self {
            timestamp: None,
            level: level::INFO,
            thread_name: None,
            logger_name: String::new(),
            content: Bytes::new(),
            content_type: Some(DEFAULT_CONTENT_TYPE.to_string()),
            content_encoding: DEFAULT_CONTENT_ENCODING.to_string(),
        }
    }
}

impl EntryBuilder {
    /// Defaults to the time of `build()` when unset
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Defaults to the current thread's name when unset
    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = Some(thread_name.into());
        self
    }

    pub fn logger_name(mut self, logger_name: impl Into<String>) -> Self {
        self.logger_name = logger_name.into();
        self
    }

    pub fn content(mut self, content: impl Into<Bytes>) -> Self {
        self.content = content.into();
        self
    }

    pub fn content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn content_encoding(mut self, content_encoding: impl Into<String>) -> Self {
        self.content_encoding = content_encoding.into();
        self
    }

    pub fn build(self) -> Result<Entry> {
        if self.content_encoding.trim().is_empty() {
            return Err(LoggerError::config("content encoding must not be empty"));
        }

        let thread_name = self.thread_name.unwrap_or_else(current_thread_name);

        Ok(Entry {
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            level: self.level,
            thread_name,
            logger_name: self.logger_name,
            content: self.content,
            content_type: self.content_type,
            content_encoding: self.content_encoding,
        })
    }
}

/// Name of the calling thread, or its id for unnamed threads
pub fn current_thread_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}
