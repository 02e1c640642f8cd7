// src/store/mod.rs
//! Record stores
//!
//! The entry pipeline only needs two capabilities from storage: append one
//! record, and read the next record in order. These are [`AppendSink`] and
//! [`RecordSource`].
//!
//! - **MemoryQueue**: shared in-process queue, used by tests and tools
//! - **MmapAppender / MmapTailer**: memory-mapped file with `u32` length framing
//!
//! A sink serves one writer and a source one reader. Callers sharing a sink
//! across threads must serialize access themselves (appenders hold it in a
//! mutex).

pub mod memory;
pub mod mmap;

pub use memory::{MemoryAppender, MemoryQueue, MemoryTailer};
pub use mmap::{MmapAppender, MmapTailer};

use crate::utils::errors::Result;
use bytes::Bytes;

/// Append-only destination for encoded records
pub trait AppendSink {
    /// Append exactly one record
    fn append(&mut self, record: &[u8]) -> Result<()>;

    /// Push buffered records to durable storage
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sequential cursor over stored records
pub trait RecordSource {
    /// Next record, or `None` at end of stream
    fn read_next(&mut self) -> Result<Option<Bytes>>;
}

impl<S: AppendSink + ?Sized> AppendSink for Box<S> {
    fn append(&mut self, record: &[u8]) -> Result<()> {
        (**self).append(record)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<R: RecordSource + ?Sized> RecordSource for Box<R> {
    fn read_next(&mut self) -> Result<Option<Bytes>> {
        (**self).read_next()
    }
}

/// Type-erased sink used by appenders
pub type BoxedSink = Box<dyn AppendSink + Send>;
