// src/codec/zstd.rs
//! zstd codecs for entry content
//!
//! [`ZstdCodec`] writes self-contained frames. [`ZstdDictCodec`] trains nothing
//! itself: it loads a dictionary from disk once and uses it for every frame,
//! which pays off for short, repetitive log lines.

use crate::codec::Codec;
use crate::utils::errors::{LoggerError, Result};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const ZSTD: &str = "zstd";

fn check_level(level: i32) -> Result<i32> {
    let range = ::zstd::compression_level_range();
    if range.contains(&level) {
        Ok(level)
    } else {
        Err(LoggerError::config(format!(
            "zstd level {} outside {}..={}",
            level,
            range.start(),
            range.end()
        )))
    }
}

fn log_ratio(raw: usize, compressed: usize) {
    let ratio = raw as f64 / compressed.max(1) as f64;
    debug!(
        "Compressed {} bytes -> {} bytes (ratio: {:.2}x)",
        raw, compressed, ratio
    );
}

/// Plain zstd codec
#[derive(Debug, Clone)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    /// Create a codec compressing at `level`
    pub fn new(level: i32) -> Result<Self> {
        Ok(Self {
            level: check_level(level)?,
        })
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl Codec for ZstdCodec {
    fn name(&self) -> &str {
        ZSTD
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let compressed = ::zstd::encode_all(data, self.level).map_err(|e| {
            LoggerError::Compression(format!("zstd compression error: {}", e))
        })?;

        log_ratio(data.len(), compressed.len());

        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let decompressed = ::zstd::decode_all(data).map_err(|e| {
            LoggerError::Compression(format!("zstd decompression error: {}", e))
        })?;

        debug!(
            "Decompressed {} bytes -> {} bytes",
            data.len(),
            decompressed.len()
        );

        Ok(decompressed)
    }
}

/// zstd codec bound to a dictionary file
#[derive(Debug, Clone)]
pub struct ZstdDictCodec {
    name: String,
    level: i32,
    path: PathBuf,
    dictionary: Arc<[u8]>,
}

impl ZstdDictCodec {
    /// Load the dictionary at `path`; a missing or empty file is a resource error
    pub fn open(name: impl Into<String>, level: i32, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let level = check_level(level)?;

        let dictionary = std::fs::read(path).map_err(|e| {
            LoggerError::resource(format!("cannot read zstd dictionary {:?}: {}", path, e))
        })?;
        if dictionary.is_empty() {
            return Err(LoggerError::resource(format!(
                "zstd dictionary {:?} is empty",
                path
            )));
        }

        let name = name.into();
        info!(
            "Loaded zstd dictionary {:?} ({} bytes) for codec '{}'",
            path,
            dictionary.len(),
            name
        );

        Ok(Self {
            name,
            level,
            path: path.to_path_buf(),
            dictionary: dictionary.into(),
        })
    }

    pub fn dictionary_path(&self) -> &Path {
        &self.path
    }
}

impl Codec for ZstdDictCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let map_err =
            |e: std::io::Error| LoggerError::Compression(format!("zstd dictionary compression error: {}", e));

        let mut encoder =
            ::zstd::stream::Encoder::with_dictionary(Vec::new(), self.level, &self.dictionary)
                .map_err(map_err)?;
        encoder.write_all(data).map_err(map_err)?;
        let compressed = encoder.finish().map_err(map_err)?;

        log_ratio(data.len(), compressed.len());

        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let map_err = |e: std::io::Error| {
            LoggerError::Compression(format!("zstd dictionary decompression error: {}", e))
        };

        let mut decoder =
            ::zstd::stream::Decoder::with_dictionary(data, &self.dictionary).map_err(map_err)?;
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).map_err(map_err)?;

        debug!(
            "Decompressed {} bytes -> {} bytes",
            data.len(),
            decompressed.len()
        );

        Ok(decompressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_keeps_multiline_message() {
        let codec = ZstdCodec::default();
        let message = "upload aborted user=alice attempt=3\nerror: write failed\n  caused by: disk full\n";

        let compressed = codec.compress(message.as_bytes()).unwrap();
        assert_ne!(compressed, message.as_bytes());
        assert_eq!(codec.decompress(&compressed).unwrap(), message.as_bytes());
        assert!(codec.decompress(&codec.compress(b"").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn test_log_line_compression() {
        let codec = ZstdCodec::new(3).unwrap();

        let lines = "2024-01-01T00:00:00Z INFO [main] app - request served in 12ms\n".repeat(1000);

        let compressed = codec.compress(lines.as_bytes()).unwrap();

        let ratio = lines.len() as f64 / compressed.len() as f64;
        assert!(ratio > 5.0);
    }

    #[test]
    fn test_invalid_level() {
        assert!(matches!(ZstdCodec::new(100), Err(LoggerError::Config(_))));
    }

    #[test]
    fn test_garbage_is_compression_error() {
        let result = ZstdCodec::default().decompress(b"definitely not zstd");
        assert!(matches!(result, Err(LoggerError::Compression(_))));
    }

    #[test]
    fn test_dictionary_round_trip() {
        let dir = tempdir().unwrap();
        let dict_path = dir.path().join("logs.dict");
        std::fs::write(
            &dict_path,
            "INFO WARN ERROR DEBUG request served in ms connection closed by peer ".repeat(20),
        )
        .unwrap();

        let codec = ZstdDictCodec::open("zstd-dict", 3, &dict_path).unwrap();
        assert_eq!(codec.name(), "zstd-dict");
        assert_eq!(codec.dictionary_path(), dict_path.as_path());

        let data = b"WARN connection closed by peer";
        let compressed = codec.compress(data).unwrap();
        let decompressed = codec.decompress(&compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn test_missing_dictionary_is_resource_error() {
        let dir = tempdir().unwrap();
        let result = ZstdDictCodec::open("zstd-dict", 3, dir.path().join("absent.dict"));
        assert!(matches!(result, Err(LoggerError::Resource(_))));
    }

    #[test]
    fn test_empty_dictionary_is_resource_error() {
        let dir = tempdir().unwrap();
        let dict_path = dir.path().join("empty.dict");
        std::fs::write(&dict_path, b"").unwrap();

        let result = ZstdDictCodec::open("zstd-dict", 3, &dict_path);
        assert!(matches!(result, Err(LoggerError::Resource(_))));
    }
}
