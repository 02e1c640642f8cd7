// src/codec/mod.rs
//! Content codecs
//!
//! A codec is a named, reversible byte transform applied to entry content.
//! The name is what gets stamped into an entry's `content_encoding`, and the
//! [`CodecRegistry`] resolves it back to an instance at decode time.
//!
//! - **identity**: pass-through
//! - **zstd**: plain zstd frames
//! - **zstd_dict**: zstd frames built against a shared dictionary file

pub mod identity;
pub mod registry;
pub mod zstd;

pub use identity::IdentityCodec;
pub use registry::{CodecRegistry, CodecRegistryBuilder};
pub use self::zstd::{ZstdCodec, ZstdDictCodec};

use crate::utils::errors::Result;

/// Named compression transform
///
/// Codecs are built once and shared between threads, so implementations must
/// not keep per-call state.
pub trait Codec: Send + Sync {
    /// Name stored in `content_encoding`
    fn name(&self) -> &str;

    /// Compress raw bytes
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Reverse [`Codec::compress`]
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}
