// src/store/memory.rs
//! In-memory record queue

use crate::store::{AppendSink, RecordSource};
use crate::utils::errors::{LoggerError, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared, growable list of records
#[derive(Debug, Clone, Default)]
pub struct MemoryQueue {
    records: Arc<Mutex<Vec<Bytes>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink appending to the end of this queue
    pub fn appender(&self) -> MemoryAppender {
        MemoryAppender {
            records: Arc::clone(&self.records),
        }
    }

    /// Source reading this queue from the first record
    pub fn tailer(&self) -> MemoryTailer {
        MemoryTailer {
            records: Arc::clone(&self.records),
            index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

/// Write half of a [`MemoryQueue`]
#[derive(Debug, Clone)]
pub struct MemoryAppender {
    records: Arc<Mutex<Vec<Bytes>>>,
}

impl AppendSink for MemoryAppender {
    fn append(&mut self, record: &[u8]) -> Result<()> {
        if record.is_empty() {
            return Err(LoggerError::storage("refusing to append an empty record"));
        }
        self.records.lock().push(Bytes::copy_from_slice(record));
        Ok(())
    }
}

/// Read half of a [`MemoryQueue`]
#[derive(Debug, Clone)]
pub struct MemoryTailer {
    records: Arc<Mutex<Vec<Bytes>>>,
    index: usize,
}

impl RecordSource for MemoryTailer {
    fn read_next(&mut self) -> Result<Option<Bytes>> {
        let record = self.records.lock().get(self.index).cloned();
        if record.is_some() {
            self.index += 1;
        }
        Ok(record)
    }
}
