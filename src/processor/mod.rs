// src/processor/mod.rs
//! Entry processors
//!
//! A processor turns a decoded [`Entry`] into something a viewer can use.
//! [`TextEntryProcessor`] produces the message text:
//!
//! 1. resolve `content_encoding` in the codec registry (unknown → `NotFound`)
//! 2. decompress the content
//! 3. pick the charset from `content_type` (UTF-8 by default)
//! 4. decode
//!
//! An unsupported charset does not fail the call: the processor returns a
//! message describing the problem instead of the text (see
//! [`unsupported_charset_fallback`]). Bytes that are malformed under a
//! supported charset are a `Decode` error on the `content` field.

pub mod charset;

pub use charset::{charset_of, Charset, DEFAULT_CHARSET};

use crate::codec::CodecRegistry;
use crate::entry::wire::field;
use crate::entry::{level, Entry};
use crate::utils::errors::{LoggerError, Result};
use chrono::SecondsFormat;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Consumes an entry and produces a rendered value
pub trait EntryProcessor {
    type Output;

    fn apply(&self, entry: &Entry) -> Result<Self::Output>;
}

/// Text returned in place of the message when its charset is unsupported
///
/// Callers cannot tell this string apart from a message with the same text;
/// it exists so log viewers keep going past an isolated bad record.
pub fn unsupported_charset_fallback(charset: &str) -> String {
    warn!("Unsupported charset '{}', returning error text", charset);
    metrics::counter!("logbridge_charset_fallbacks_total").increment(1);

    LoggerError::Charset(format!("unsupported charset '{}'", charset)).to_string()
}

/// Decompresses and decodes entry content into text
#[derive(Debug, Clone)]
pub struct TextEntryProcessor {
    registry: Arc<CodecRegistry>,
}

impl TextEntryProcessor {
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    /// Content bytes after undoing `content_encoding`
    pub fn decompress(&self, entry: &Entry) -> Result<Vec<u8>> {
        let codec = self.registry.find(entry.content_encoding())?;
        codec.decompress(entry.content())
    }

    fn decode(&self, bytes: &[u8], content_type: Option<&str>) -> Result<String> {
        let name = charset_of(content_type);
        let Some(charset) = Charset::for_name(&name) else {
            return Ok(unsupported_charset_fallback(&name));
        };

        charset.decode(bytes).map_err(|e| match e {
            LoggerError::Charset(reason) => LoggerError::decode(field::CONTENT, reason),
            other => other,
        })
    }
}

impl EntryProcessor for TextEntryProcessor {
    type Output = String;

    fn apply(&self, entry: &Entry) -> Result<String> {
        let bytes = self.decompress(entry)?;
        self.decode(&bytes, entry.content_type())
    }
}

/// Renders `timestamp LEVEL [thread] logger - text` lines
///
/// A single trailing newline is dropped so the message does not print an
/// empty line after itself; everything else is kept verbatim.
#[derive(Debug, Clone)]
pub struct LineEntryProcessor {
    text: TextEntryProcessor,
}

impl LineEntryProcessor {
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        Self {
            text: TextEntryProcessor::new(registry),
        }
    }
}

impl EntryProcessor for LineEntryProcessor {
    type Output = String;

    fn apply(&self, entry: &Entry) -> Result<String> {
        let text = self.text.apply(entry)?;
        Ok(format!(
            "{} {:<5} [{}] {} - {}",
            entry.timestamp().to_rfc3339_opts(SecondsFormat::Nanos, true),
            level::label(entry.level()),
            entry.thread_name(),
            entry.logger_name(),
            text.strip_suffix('\n').unwrap_or(&text)
        ))
    }
}

/// Renders entries as JSON objects
#[derive(Debug, Clone)]
pub struct JsonEntryProcessor {
    text: TextEntryProcessor,
}

impl JsonEntryProcessor {
    pub fn new(registry: Arc<CodecRegistry>) -> Self {
        Self {
            text: TextEntryProcessor::new(registry),
        }
    }
}

impl EntryProcessor for JsonEntryProcessor {
    type Output = serde_json::Value;

    fn apply(&self, entry: &Entry) -> Result<serde_json::Value> {
        let text = self.text.apply(entry)?;
        Ok(json!({
            "timestamp": entry.timestamp().to_rfc3339_opts(SecondsFormat::Nanos, true),
            "level": entry.level(),
            "level_name": level::label(entry.level()),
            "thread_name": entry.thread_name(),
            "logger_name": entry.logger_name(),
            "content_type": entry.content_type(),
            "content_encoding": entry.content_encoding(),
            "message": text,
        }))
    }
}
