// src/store/mmap.rs
//! Memory-mapped record file
//!
//! Records are framed as `len:u32 LE` followed by `len` bytes. The file is
//! pre-sized and zero-filled, so a zero length prefix marks the end of
//! written data. Records are never empty.

use crate::store::{AppendSink, RecordSource};
use crate::utils::errors::{LoggerError, Result};
use bytes::Bytes;
use memmap2::{Mmap, MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FRAME_HEADER: usize = 4;

/// Walk frames from `start`; returns the offset just past the last complete frame
fn scan_frames(data: &[u8], mut offset: usize) -> usize {
    while let Some(len) = frame_len(data, offset) {
        if len == 0 || offset + FRAME_HEADER + len > data.len() {
            break;
        }
        offset += FRAME_HEADER + len;
    }
    offset
}

fn frame_len(data: &[u8], offset: usize) -> Option<usize> {
    let header = data.get(offset..offset + FRAME_HEADER)?;
    let mut raw = [0u8; FRAME_HEADER];
    raw.copy_from_slice(header);
    Some(u32::from_le_bytes(raw) as usize)
}

/// Append-only writer over a memory-mapped file
pub struct MmapAppender {
    path: PathBuf,
    file: File,
    mmap: Option<MmapMut>,
    position: usize,
    capacity: usize,
}

impl MmapAppender {
    /// Open or create `path`, resuming after any records already present
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| LoggerError::storage(format!("Failed to open {:?}: {}", path, e)))?;

        let existing = file.metadata()?.len() as usize;
        let capacity = capacity.max(existing).max(FRAME_HEADER);
        if existing < capacity {
            file.set_len(capacity as u64).map_err(|e| {
                LoggerError::storage(format!("Failed to set file size: {}", e))
            })?;
        }

        // SAFETY: the appender is the only writer of this file
        let mmap = unsafe {
            MmapOptions::new().map_mut(&file).map_err(|e| {
                LoggerError::storage(format!("Failed to create memory map: {}", e))
            })?
        };

        let position = scan_frames(&mmap, 0);
        info!(
            "Opened record file {:?} (capacity {} bytes, resuming at {})",
            path, capacity, position
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            mmap: Some(mmap),
            position,
            capacity,
        })
    }

    /// Grow the mapped file so that `additional` more bytes fit
    fn grow(&mut self, additional: usize) -> Result<()> {
        warn!("Growing record file {:?} by {} bytes", self.path, additional);

        self.mmap = None;

        // keep room for the terminating zero prefix
        let needed = self.position + additional + FRAME_HEADER;
        let new_capacity = needed.max(self.capacity * 2);
        self.file.set_len(new_capacity as u64).map_err(|e| {
            LoggerError::storage(format!("Failed to grow file: {}", e))
        })?;

        // SAFETY: see `open`
        let mmap = unsafe {
            MmapOptions::new().map_mut(&self.file).map_err(|e| {
                LoggerError::storage(format!("Failed to remap file: {}", e))
            })?
        };

        self.mmap = Some(mmap);
        self.capacity = new_capacity;

        debug!("Record file grown to {} bytes", new_capacity);

        Ok(())
    }

    /// Offset of the next frame
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AppendSink for MmapAppender {
    fn append(&mut self, record: &[u8]) -> Result<()> {
        if record.is_empty() {
            return Err(LoggerError::storage("refusing to append an empty record"));
        }
        let len = u32::try_from(record.len()).map_err(|_| {
            LoggerError::storage(format!("record of {} bytes is too large", record.len()))
        })?;

        let frame_len = FRAME_HEADER + record.len();
        if self.position + frame_len + FRAME_HEADER > self.capacity {
            self.grow(frame_len)?;
        }

        let mmap = self
            .mmap
            .as_mut()
            .ok_or_else(|| LoggerError::storage("Memory map not available"))?;

        let start = self.position;
        mmap[start + FRAME_HEADER..start + frame_len].copy_from_slice(record);
        mmap[start..start + FRAME_HEADER].copy_from_slice(&len.to_le_bytes());
        self.position += frame_len;

        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mmap) = self.mmap {
            mmap.flush().map_err(|e| {
                LoggerError::storage(format!("Failed to flush memory map: {}", e))
            })?;
        }

        self.file.sync_all().map_err(|e| {
            LoggerError::storage(format!("Failed to sync file: {}", e))
        })?;

        Ok(())
    }
}

impl Drop for MmapAppender {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("Failed to flush {:?} on drop: {}", self.path, e);
        }
    }
}

/// Sequential reader over a record file
pub struct MmapTailer {
    path: PathBuf,
    mmap: Option<Mmap>,
    position: usize,
}

impl MmapTailer {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mmap = Self::map(&path)?;

        debug!("Opened record file {:?} for reading", path);

        Ok(Self {
            path,
            mmap,
            position: 0,
        })
    }

    fn map(path: &Path) -> Result<Option<Mmap>> {
        let file = File::open(path)
            .map_err(|e| LoggerError::storage(format!("Failed to open {:?}: {}", path, e)))?;
        if file.metadata()?.len() == 0 {
            return Ok(None);
        }

        // SAFETY: read-only mapping; writers only ever fill zeroed space past our position
        let mmap = unsafe {
            MmapOptions::new().map(&file).map_err(|e| {
                LoggerError::storage(format!("Failed to create memory map: {}", e))
            })?
        };
        Ok(Some(mmap))
    }

    fn mapped_len(&self) -> usize {
        self.mmap.as_ref().map_or(0, |m| m.len())
    }

    /// Remap if the file grew since it was mapped
    fn refresh(&mut self) -> Result<bool> {
        let len = std::fs::metadata(&self.path)?.len() as usize;
        if len <= self.mapped_len() {
            return Ok(false);
        }
        self.mmap = Self::map(&self.path)?;
        Ok(true)
    }

    /// Offset of the next frame
    pub fn position(&self) -> usize {
        self.position
    }

    fn next_frame(&mut self) -> Result<Option<Bytes>> {
        let data: &[u8] = match self.mmap {
            Some(ref mmap) => mmap,
            None => return Ok(None),
        };

        let len = match frame_len(data, self.position) {
            Some(0) | None => return Ok(None),
            Some(len) => len,
        };

        let start = self.position + FRAME_HEADER;
        let end = start + len;
        if end > data.len() {
            return Err(LoggerError::decode(
                "frame",
                format!(
                    "truncated at offset {}: {} byte frame, {} bytes left",
                    self.position,
                    len,
                    data.len() - start
                ),
            ));
        }

        let record = Bytes::copy_from_slice(&data[start..end]);
        self.position = end;
        Ok(Some(record))
    }
}

impl RecordSource for MmapTailer {
    fn read_next(&mut self) -> Result<Option<Bytes>> {
        match self.next_frame()? {
            Some(record) => Ok(Some(record)),
            None if self.refresh()? => self.next_frame(),
            None => Ok(None),
        }
    }
}
