// src/entry/writer.rs
//! Entry encoder
//!
//! Encoding is deterministic: the same entry always produces the same bytes.
//! The writer hands each encoded record to its sink in a single `append`
//! call, so framing and atomicity belong to the sink.

use crate::entry::wire::{field, Kind, MAGIC, VERSION};
use crate::entry::Entry;
use crate::store::AppendSink;
use crate::utils::errors::{LoggerError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

const FIELD_COUNT: u8 = 7;

/// Encode one entry into a standalone record
pub fn encode(entry: &Entry) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(encoded_len_hint(entry));
    encode_into(entry, &mut buf)?;
    Ok(buf.freeze())
}

fn encoded_len_hint(entry: &Entry) -> usize {
    128 + entry.thread_name().len()
        + entry.logger_name().len()
        + entry.content().len()
        + entry.content_type().map_or(0, str::len)
        + entry.content_encoding().len()
}

fn encode_into(entry: &Entry, buf: &mut BytesMut) -> Result<()> {
    buf.put_u16_le(MAGIC);
    buf.put_u8(VERSION);
    buf.put_u8(FIELD_COUNT);

    let timestamp = entry.timestamp();
    put_name(buf, field::TIMESTAMP, Kind::Timestamp);
    buf.put_i64_le(timestamp.timestamp());
    buf.put_u32_le(timestamp.timestamp_subsec_nanos());

    put_name(buf, field::LEVEL, Kind::Int);
    buf.put_i32_le(entry.level());

    put_text(buf, field::THREAD_NAME, entry.thread_name())?;
    put_text(buf, field::LOGGER_NAME, entry.logger_name())?;

    put_name(buf, field::CONTENT, Kind::Bytes);
    put_block(buf, field::CONTENT, entry.content())?;

    match entry.content_type() {
        Some(content_type) => put_text(buf, field::CONTENT_TYPE, content_type)?,
        None => put_name(buf, field::CONTENT_TYPE, Kind::Null),
    }

    put_text(buf, field::CONTENT_ENCODING, entry.content_encoding())?;

    Ok(())
}

fn put_name(buf: &mut BytesMut, name: &str, kind: Kind) {
    // field names are crate constants, all shorter than 256 bytes
    buf.put_u8(name.len() as u8);
    buf.put_slice(name.as_bytes());
    buf.put_u8(kind as u8);
}

fn put_text(buf: &mut BytesMut, name: &str, value: &str) -> Result<()> {
    put_name(buf, name, Kind::Text);
    put_block(buf, name, value.as_bytes())
}

fn put_block(buf: &mut BytesMut, name: &str, value: &[u8]) -> Result<()> {
    let len = u32::try_from(value.len()).map_err(|_| {
        LoggerError::storage(format!(
            "field '{}' is {} bytes, larger than a record allows",
            name,
            value.len()
        ))
    })?;
    buf.put_u32_le(len);
    buf.put_slice(value);
    Ok(())
}

/// Appends encoded entries to a sink
pub struct EntryWriter<S: AppendSink> {
    sink: S,
    buf: BytesMut,
    written: u64,
}

impl<S: AppendSink> EntryWriter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            buf: BytesMut::with_capacity(1024),
            written: 0,
        }
    }

    /// Encode `entry` and append it as one record
    pub fn write(&mut self, entry: &Entry) -> Result<()> {
        self.buf.clear();
        encode_into(entry, &mut self.buf)?;
        self.sink.append(&self.buf)?;
        self.written += 1;

        debug!(
            "Wrote entry {} ({} bytes, encoding '{}')",
            self.written,
            self.buf.len(),
            entry.content_encoding()
        );
        metrics::counter!("logbridge_entries_written_total").increment(1);

        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    /// Number of entries written through this writer
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}
