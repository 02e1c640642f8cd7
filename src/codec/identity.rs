// src/codec/identity.rs
//! No-op codec

use crate::codec::Codec;
use crate::utils::errors::Result;

pub const IDENTITY: &str = "identity";

/// Passes bytes through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl Codec for IdentityCodec {
    fn name(&self) -> &str {
        IDENTITY
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}
