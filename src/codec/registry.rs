// src/codec/registry.rs
//! Name → codec lookup
//!
//! The registry is assembled once through [`CodecRegistryBuilder`] and is
//! immutable afterwards. Share it as `Arc<CodecRegistry>`; lookups take no
//! locks.

use crate::codec::{Codec, IdentityCodec, ZstdCodec, ZstdDictCodec};
use crate::utils::config::CodecConfig;
use crate::utils::errors::{LoggerError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable table of codecs keyed by encoding name
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::default()
    }

    /// Registry with `identity` and `zstd`
    pub fn with_defaults() -> Self {
        let identity: Arc<dyn Codec> = Arc::new(IdentityCodec);
        let zstd: Arc<dyn Codec> = Arc::new(ZstdCodec::default());

        let codecs = [identity, zstd]
            .into_iter()
            .map(|codec| (codec.name().to_string(), codec))
            .collect();

        Self { codecs }
    }

    /// Build from configuration; any failing codec aborts the whole registry
    pub fn from_configs(configs: &[CodecConfig]) -> Result<Self> {
        configs
            .iter()
            .try_fold(Self::builder(), |builder, config| builder.with_config(config))?
            .build()
    }

    /// Resolve an encoding name
    pub fn find(&self, name: &str) -> Result<Arc<dyn Codec>> {
        self.codecs
            .get(name)
            .cloned()
            .ok_or_else(|| LoggerError::not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.codecs.contains_key(name)
    }

    /// Registered encoding names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.names())
            .finish()
    }
}

/// Collects codecs before freezing them into a [`CodecRegistry`]
#[derive(Default)]
pub struct CodecRegistryBuilder {
    codecs: Vec<Arc<dyn Codec>>,
}

impl CodecRegistryBuilder {
    /// Add an already constructed codec
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codecs.push(codec);
        self
    }

    /// Construct and add the codec described by `config`
    pub fn with_config(self, config: &CodecConfig) -> Result<Self> {
        let codec: Arc<dyn Codec> = match config {
            CodecConfig::Identity => Arc::new(IdentityCodec),
            CodecConfig::Zstd { level } => Arc::new(ZstdCodec::new(*level)?),
            CodecConfig::ZstdDict {
                name,
                level,
                dictionary,
            } => Arc::new(ZstdDictCodec::open(name.clone(), *level, dictionary)?),
        };
        Ok(self.with_codec(codec))
    }

    /// Add `identity` and `zstd`
    pub fn with_defaults(self) -> Result<Self> {
        CodecConfig::defaults()
            .iter()
            .try_fold(self, |builder, config| builder.with_config(config))
    }

    /// Freeze the registry; duplicate names are rejected
    pub fn build(self) -> Result<CodecRegistry> {
        let mut codecs = HashMap::with_capacity(self.codecs.len());

        for codec in self.codecs {
            let name = codec.name().to_string();
            if name.trim().is_empty() {
                return Err(LoggerError::config("codec name must not be empty"));
            }
            if codecs.contains_key(&name) {
                return Err(LoggerError::config(format!(
                    "codec '{}' registered twice",
                    name
                )));
            }
            debug!("Registered codec '{}'", name);
            codecs.insert(name, codec);
        }

        let registry = CodecRegistry { codecs };
        info!("Codec registry ready: {:?}", registry.names());

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let registry = CodecRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["identity", "zstd"]);
        assert_eq!(registry.find("identity").unwrap().name(), "identity");
        assert_eq!(registry.find("zstd").unwrap().name(), "zstd");
    }

    #[test]
    fn test_unknown_encoding_is_not_found() {
        let registry = CodecRegistry::with_defaults();
        match registry.find("bogus") {
            Err(LoggerError::NotFound(name)) => assert_eq!(name, "bogus"),
            other => panic!("expected NotFound, got {:?}", other.map(|c| c.name().to_string())),
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = CodecRegistry::builder()
            .with_codec(Arc::new(IdentityCodec))
            .with_codec(Arc::new(IdentityCodec))
            .build();
        assert!(matches!(result, Err(LoggerError::Config(_))));
    }

    #[test]
    fn test_missing_dictionary_fails_whole_registry() {
        let dir = tempdir().unwrap();
        let configs = vec![
            CodecConfig::Identity,
            CodecConfig::ZstdDict {
                name: "zstd-dict".to_string(),
                level: 3,
                dictionary: dir.path().join("missing.dict"),
            },
        ];

        let result = CodecRegistry::from_configs(&configs);
        assert!(matches!(result, Err(LoggerError::Resource(_))));
    }

    #[test]
    fn test_dictionary_codec_from_config() {
        let dir = tempdir().unwrap();
        let dict = dir.path().join("app.dict");
        std::fs::write(&dict, "thread main logger app level INFO ".repeat(16)).unwrap();

        let registry = CodecRegistry::builder()
            .with_defaults()
            .unwrap()
            .with_config(&CodecConfig::ZstdDict {
                name: "zstd-app".to_string(),
                level: 5,
                dictionary: dict,
            })
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(registry.len(), 3);
        assert!(registry.contains("zstd-app"));
    }

    #[test]
    fn test_concurrent_lookups() {
        let registry = Arc::new(CodecRegistry::with_defaults());
        let mut handles = vec![];

        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let codec = registry.find("zstd").unwrap();
                    let compressed = codec.compress(b"shared registry").unwrap();
                    assert_eq!(codec.decompress(&compressed).unwrap(), b"shared registry");
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
