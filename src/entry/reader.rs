// src/entry/reader.rs
//! Entry decoder
//!
//! A record either decodes completely or fails with a `Decode` error naming
//! the offending field. End of stream is `Ok(None)`, never an error.

use crate::entry::wire::{field, Kind, HEADER_LEN, MAGIC, VERSION};
use crate::entry::Entry;
use crate::store::RecordSource;
use crate::utils::errors::{LoggerError, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Bounds-checked view over one record
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(LoggerError::decode(
                field,
                format!("truncated: need {} bytes, {} left", len, self.remaining()),
            ));
        }
        let data = self.data;
        let slice = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn array<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    fn u32(&mut self, field: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array(field)?))
    }

    fn block(&mut self, field: &str) -> Result<&'a [u8]> {
        let len = self.u32(field)? as usize;
        self.take(len, field)
    }
}

/// A decoded field value
enum Value<'a> {
    Null,
    Timestamp(i64, u32),
    Int(i32),
    Text(&'a [u8]),
    Bytes(&'a [u8]),
}

impl Value<'_> {
    fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Timestamp(..) => Kind::Timestamp,
            Value::Int(_) => Kind::Int,
            Value::Text(_) => Kind::Text,
            Value::Bytes(_) => Kind::Bytes,
        }
    }
}

fn read_value<'a>(cursor: &mut Cursor<'a>, kind: Kind, name: &str) -> Result<Value<'a>> {
    Ok(match kind {
        Kind::Null => Value::Null,
        Kind::Timestamp => {
            let secs = i64::from_le_bytes(cursor.array(name)?);
            let nanos = cursor.u32(name)?;
            Value::Timestamp(secs, nanos)
        }
        Kind::Int => Value::Int(i32::from_le_bytes(cursor.array(name)?)),
        Kind::Text => Value::Text(cursor.block(name)?),
        Kind::Bytes => Value::Bytes(cursor.block(name)?),
    })
}

fn set_once<T>(slot: &mut Option<T>, value: T, name: &str) -> Result<()> {
    if slot.is_some() {
        return Err(LoggerError::decode(name, "duplicate field"));
    }
    *slot = Some(value);
    Ok(())
}

fn wrong_kind(name: &str, kind: Kind) -> LoggerError {
    LoggerError::decode(name, format!("unexpected value kind {:?}", kind))
}

fn text(name: &str, raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec())
        .map_err(|e| LoggerError::decode(name, format!("invalid UTF-8: {}", e)))
}

fn required<T>(slot: Option<T>, name: &str) -> Result<T> {
    slot.ok_or_else(|| LoggerError::decode(name, "missing required field"))
}

/// Decode one standalone record
pub fn decode(record: &[u8]) -> Result<Entry> {
    if record.len() < HEADER_LEN {
        return Err(LoggerError::decode(
            field::HEADER,
            format!("record of {} bytes is shorter than the header", record.len()),
        ));
    }

    let mut cursor = Cursor::new(record);
    let magic = u16::from_le_bytes(cursor.array(field::HEADER)?);
    if magic != MAGIC {
        return Err(LoggerError::decode(
            field::HEADER,
            format!("bad magic {:#06x}", magic),
        ));
    }
    let version = cursor.u8(field::HEADER)?;
    if version != VERSION {
        return Err(LoggerError::decode(
            field::HEADER,
            format!("unsupported version {}", version),
        ));
    }
    let field_count = cursor.u8(field::HEADER)?;

    let mut timestamp = None;
    let mut level = None;
    let mut thread_name = None;
    let mut logger_name = None;
    let mut content = None;
    let mut content_type: Option<Option<String>> = None;
    let mut content_encoding = None;

    for _ in 0..field_count {
        let name_len = cursor.u8(field::HEADER)? as usize;
        let raw_name = cursor.take(name_len, field::HEADER)?;
        let name = std::str::from_utf8(raw_name)
            .map_err(|_| LoggerError::decode(field::HEADER, "field name is not UTF-8"))?;

        let tag = cursor.u8(name)?;
        let kind = Kind::from_u8(tag)
            .ok_or_else(|| LoggerError::decode(name, format!("unknown value kind {}", tag)))?;
        let value = read_value(&mut cursor, kind, name)?;

        match (name, value) {
            (field::TIMESTAMP, Value::Timestamp(secs, nanos)) => {
                let instant = DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(|| {
                    LoggerError::decode(name, format!("out of range: {}s {}ns", secs, nanos))
                })?;
                set_once(&mut timestamp, instant, name)?
            }
            (field::LEVEL, Value::Int(value)) => set_once(&mut level, value, name)?,
            (field::THREAD_NAME, Value::Text(raw)) => {
                set_once(&mut thread_name, text(name, raw)?, name)?
            }
            (field::LOGGER_NAME, Value::Text(raw)) => {
                set_once(&mut logger_name, text(name, raw)?, name)?
            }
            (field::CONTENT, Value::Bytes(raw)) => {
                set_once(&mut content, Bytes::copy_from_slice(raw), name)?
            }
            (field::CONTENT_TYPE, Value::Null) => set_once(&mut content_type, None, name)?,
            (field::CONTENT_TYPE, Value::Text(raw)) => {
                set_once(&mut content_type, Some(text(name, raw)?), name)?
            }
            (field::CONTENT_ENCODING, Value::Text(raw)) => {
                set_once(&mut content_encoding, text(name, raw)?, name)?
            }
            (
                field::TIMESTAMP
                | field::LEVEL
                | field::THREAD_NAME
                | field::LOGGER_NAME
                | field::CONTENT
                | field::CONTENT_TYPE
                | field::CONTENT_ENCODING,
                value,
            ) => return Err(wrong_kind(name, value.kind())),
            (_, _) => debug!("Skipping unknown field '{}'", name),
        }
    }

    if cursor.remaining() > 0 {
        return Err(LoggerError::decode(
            field::HEADER,
            format!("{} trailing bytes after {} fields", cursor.remaining(), field_count),
        ));
    }

    Ok(Entry {
        timestamp: required(timestamp, field::TIMESTAMP)?,
        level: required(level, field::LEVEL)?,
        thread_name: required(thread_name, field::THREAD_NAME)?,
        logger_name: required(logger_name, field::LOGGER_NAME)?,
        content: required(content, field::CONTENT)?,
        content_type: required(content_type, field::CONTENT_TYPE)?,
        content_encoding: required(content_encoding, field::CONTENT_ENCODING)?,
    })
}

/// Reads entries sequentially from a record source
pub struct EntryReader<R: RecordSource> {
    source: R,
    read: u64,
}

impl<R: RecordSource> EntryReader<R> {
    pub fn new(source: R) -> Self {
        Self { source, read: 0 }
    }

    /// Next entry, or `None` once the source is exhausted
    pub fn read(&mut self) -> Result<Option<Entry>> {
        let record = match self.source.read_next()? {
            Some(record) => record,
            None => return Ok(None),
        };

        let entry = decode(&record)?;
        self.read += 1;
        metrics::counter!("logbridge_entries_read_total").increment(1);

        Ok(Some(entry))
    }

    /// Number of entries decoded so far
    pub fn entries_read(&self) -> u64 {
        self.read
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: RecordSource> Iterator for EntryReader<R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::writer::{encode, EntryWriter};
    use crate::store::MemoryQueue;
    use bytes::{BufMut, BytesMut};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn sample(content: &str) -> Entry {
        Entry::builder()
            .timestamp(Utc.timestamp_opt(1_700_000_000, 42).unwrap())
            .level(800)
            .thread_name("th-1")
            .logger_name("app")
            .content(content.to_string())
            .build()
            .unwrap()
    }

    fn header(buf: &mut BytesMut, field_count: u8) {
        buf.put_u16_le(MAGIC);
        buf.put_u8(VERSION);
        buf.put_u8(field_count);
    }

    fn put_field(buf: &mut BytesMut, name: &str, kind: Kind) {
        buf.put_u8(name.len() as u8);
        buf.put_slice(name.as_bytes());
        buf.put_u8(kind as u8);
    }

    fn put_text(buf: &mut BytesMut, name: &str, value: &str) {
        put_field(buf, name, Kind::Text);
        buf.put_u32_le(value.len() as u32);
        buf.put_slice(value.as_bytes());
    }

    fn assert_decode_error(result: Result<Entry>, expected_field: &str) {
        match result {
            Err(LoggerError::Decode { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected decode error on {}, got {:?}", expected_field, other),
        }
    }

    #[test]
    fn test_round_trip() {
        let entry = sample("hello world");
        let decoded = decode(&encode(&entry).unwrap()).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_null_content_type_round_trips() {
        let entry = Entry::builder()
            .thread_name("main")
            .content_type(None)
            .build()
            .unwrap();

        let decoded = decode(&encode(&entry).unwrap()).unwrap();
        assert_eq!(decoded.content_type(), None);
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_sequential_reads_then_end_of_stream() {
        let queue = MemoryQueue::new();
        let mut writer = EntryWriter::new(queue.appender());
        for i in 0..5 {
            writer.write(&sample(&format!("message {}", i))).unwrap();
        }

        let mut reader = EntryReader::new(queue.tailer());
        for i in 0..5 {
            let entry = reader.read().unwrap().unwrap();
            assert_eq!(entry.content().as_ref(), format!("message {}", i).as_bytes());
        }
        assert!(reader.read().unwrap().is_none());
        assert!(reader.read().unwrap().is_none());
        assert_eq!(reader.entries_read(), 5);
    }

    #[test]
    fn test_iterator() {
        let queue = MemoryQueue::new();
        let mut writer = EntryWriter::new(queue.appender());
        writer.write(&sample("a")).unwrap();
        writer.write(&sample("b")).unwrap();

        let entries: Vec<Entry> = EntryReader::new(queue.tailer())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_truncated_content_block() {
        let bytes = encode(&sample("a fairly long message body")).unwrap();

        // cut inside the content block, before content_type
        let cut = bytes.windows(6).position(|w| w == b"fairly").unwrap();
        assert_decode_error(decode(&bytes[..cut]), field::CONTENT);
    }

    #[test]
    fn test_every_truncation_is_an_error() {
        let bytes = encode(&sample("payload")).unwrap();
        for len in 0..bytes.len() {
            assert!(
                matches!(decode(&bytes[..len]), Err(LoggerError::Decode { .. })),
                "prefix of {} bytes decoded",
                len
            );
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&sample("x")).unwrap().to_vec();
        bytes[0] ^= 0xFF;
        assert_decode_error(decode(&bytes), field::HEADER);
    }

    #[test]
    fn test_missing_level() {
        let mut buf = BytesMut::new();
        header(&mut buf, 6);
        put_field(&mut buf, field::TIMESTAMP, Kind::Timestamp);
        buf.put_i64_le(1);
        buf.put_u32_le(0);
        put_text(&mut buf, field::THREAD_NAME, "main");
        put_text(&mut buf, field::LOGGER_NAME, "app");
        put_field(&mut buf, field::CONTENT, Kind::Bytes);
        buf.put_u32_le(2);
        buf.put_slice(b"hi");
        put_field(&mut buf, field::CONTENT_TYPE, Kind::Null);
        put_text(&mut buf, field::CONTENT_ENCODING, "identity");

        assert_decode_error(decode(&buf), field::LEVEL);
    }

    #[test]
    fn test_wrong_kind() {
        let mut buf = BytesMut::new();
        header(&mut buf, 1);
        put_text(&mut buf, field::LEVEL, "INFO");

        assert_decode_error(decode(&buf), field::LEVEL);
    }

    #[test]
    fn test_duplicate_field() {
        let mut buf = BytesMut::new();
        header(&mut buf, 2);
        put_text(&mut buf, field::THREAD_NAME, "a");
        put_text(&mut buf, field::THREAD_NAME, "b");

        assert_decode_error(decode(&buf), field::THREAD_NAME);
    }

    #[test]
    fn test_unknown_fields_skipped_and_order_free() {
        let mut buf = BytesMut::new();
        header(&mut buf, 8);
        put_text(&mut buf, field::CONTENT_ENCODING, "identity");
        put_text(&mut buf, "host", "node-1");
        put_field(&mut buf, field::CONTENT_TYPE, Kind::Null);
        put_field(&mut buf, field::CONTENT, Kind::Bytes);
        buf.put_u32_le(2);
        buf.put_slice(b"hi");
        put_text(&mut buf, field::LOGGER_NAME, "");
        put_text(&mut buf, field::THREAD_NAME, "main");
        put_field(&mut buf, field::LEVEL, Kind::Int);
        buf.put_i32_le(900);
        put_field(&mut buf, field::TIMESTAMP, Kind::Timestamp);
        buf.put_i64_le(10);
        buf.put_u32_le(5);

        let entry = decode(&buf).unwrap();
        assert_eq!(entry.level(), 900);
        assert_eq!(entry.thread_name(), "main");
        assert_eq!(entry.logger_name(), "");
        assert_eq!(entry.timestamp().timestamp_subsec_nanos(), 5);
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = encode(&sample("x")).unwrap().to_vec();
        bytes.push(0);
        assert_decode_error(decode(&bytes), field::HEADER);
    }

    #[test]
    fn test_corrupt_record_in_stream() {
        let queue = MemoryQueue::new();
        let mut appender = queue.appender();
        crate::store::AppendSink::append(&mut appender, b"garbage").unwrap();

        let mut reader = EntryReader::new(queue.tailer());
        assert!(matches!(reader.read(), Err(LoggerError::Decode { .. })));
    }

    proptest! {
        #[test]
        fn round_trip_preserves_every_field(
            secs in -62_135_596_800i64..253_402_300_799i64,
            nanos in 0u32..1_000_000_000,
            level in any::<i32>(),
            thread_name in ".{0,32}",
            logger_name in ".{0,32}",
            content in proptest::collection::vec(any::<u8>(), 0..256),
            content_type in proptest::option::of("[a-z/]{1,16}(; charset=[A-Z0-9-]{1,12})?"),
            content_encoding in "[a-z0-9-]{1,12}",
        ) {
            let entry = Entry::builder()
                .timestamp(DateTime::<Utc>::from_timestamp(secs, nanos).unwrap())
                .level(level)
                .thread_name(thread_name)
                .logger_name(logger_name)
                .content(content)
                .content_type(content_type)
                .content_encoding(content_encoding)
                .build()
                .unwrap();

            let decoded = decode(&encode(&entry).unwrap()).unwrap();
            prop_assert_eq!(decoded, entry);
        }
    }
}
