// src/utils/config.rs
//! Configuration for codecs and appenders
//!
//! Configuration is explicit: it is loaded once (file + environment) and
//! handed to the registry and appenders at construction. Nothing here is a
//! process-wide singleton.

use crate::utils::errors::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix of the appender config persisted next to a store file
pub const SIDECAR_SUFFIX: &str = ".yaml";

/// Environment variable prefix (`LOGBRIDGE__APPENDER__CONTENT_ENCODING=zstd`)
pub const ENV_PREFIX: &str = "LOGBRIDGE";

pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";
pub const DEFAULT_CONTENT_ENCODING: &str = "identity";

/// One codec to register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CodecConfig {
    /// Pass-through codec, always named `identity`
    Identity,

    /// Plain zstd, named `zstd`
    Zstd {
        #[serde(default = "default_zstd_level")]
        level: i32,
    },

    /// zstd with a shared dictionary loaded from `dictionary`
    ZstdDict {
        name: String,

        #[serde(default = "default_zstd_level")]
        level: i32,

        dictionary: PathBuf,
    },
}

fn default_zstd_level() -> i32 {
    3
}

impl CodecConfig {
    /// Identity and zstd at the default level
    pub fn defaults() -> Vec<CodecConfig> {
        vec![
            CodecConfig::Identity,
            CodecConfig::Zstd {
                level: default_zstd_level(),
            },
        ]
    }
}

/// Appender settings shared by every framework binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppenderConfig {
    /// Appender name, used in diagnostics
    pub name: String,

    /// Store file; an appender without a path refuses to start
    pub path: Option<PathBuf>,

    /// Content type stamped on every entry
    pub content_type: String,

    /// Codec applied to content before it is written
    pub content_encoding: String,

    /// Initial size of the memory-mapped store file
    pub initial_capacity: usize,
}

impl Default for AppenderConfig {
    fn default() -> Self {
        Self {
            name: "logbridge".to_string(),
            path: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            content_encoding: DEFAULT_CONTENT_ENCODING.to_string(),
            initial_capacity: 1024 * 1024, // 1MB
        }
    }
}

impl AppenderConfig {
    /// Config file belonging to `store`: `app.binlog` → `app.binlog.yaml`
    pub fn sidecar_path(store: &Path) -> PathBuf {
        let mut name = store.as_os_str().to_owned();
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }

    /// Persist this config beside `store` so readers can find its defaults
    pub fn write_beside(&self, store: &Path) -> Result<PathBuf> {
        let path = Self::sidecar_path(store);
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(&path, yaml)?;

        debug!("Wrote appender config to {:?}", path);

        Ok(path)
    }

    /// Read the config persisted with [`AppenderConfig::write_beside`] for `store`
    pub fn read_beside(store: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(Self::sidecar_path(store))?;
        Ok(serde_yaml::from_str(&yaml)?)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Codecs to register
    pub codecs: Vec<CodecConfig>,

    /// Appender settings
    pub appender: AppenderConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            codecs: CodecConfig::defaults(),
            appender: AppenderConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// Load from an optional file layered with `LOGBRIDGE__*` environment variables
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(file) = file {
            if !file.exists() {
                return Err(LoggerError::config(format!(
                    "config file {:?} does not exist",
                    file
                )));
            }
            builder = builder.add_source(::config::File::from(file));
        }

        let settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let loaded: LoggerConfig = settings.try_deserialize()?;
        loaded.validate()?;

        info!(
            "Configuration loaded: {} codecs, encoding '{}'",
            loaded.codecs.len(),
            loaded.appender.content_encoding
        );

        Ok(loaded)
    }

    /// Reject configs that can never produce a working appender
    pub fn validate(&self) -> Result<()> {
        if self.codecs.is_empty() {
            return Err(LoggerError::config("no codecs configured"));
        }
        if self.appender.content_encoding.trim().is_empty() {
            return Err(LoggerError::config("content_encoding must not be empty"));
        }
        if self.appender.initial_capacity == 0 {
            return Err(LoggerError::config("initial_capacity must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();
        assert_eq!(config.appender.content_type, "text/plain; charset=UTF-8");
        assert_eq!(config.appender.content_encoding, "identity");
        assert_eq!(config.codecs.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("logbridge.toml");
        fs::write(
            &file,
            r#"
[appender]
name = "app"
path = "/var/log/app.binlog"
content_encoding = "zstd"

[[codecs]]
type = "identity"

[[codecs]]
type = "zstd"
level = 9
"#,
        )
        .unwrap();

        let config = LoggerConfig::load(Some(&file)).unwrap();
        assert_eq!(config.appender.name, "app");
        assert_eq!(config.appender.content_encoding, "zstd");
        assert_eq!(config.appender.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(config.codecs[1], CodecConfig::Zstd { level: 9 });
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempdir().unwrap();
        let result = LoggerConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(LoggerError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_codecs() {
        let config = LoggerConfig {
            codecs: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_appender_config_persisted_beside_store() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("app.binlog");
        let config = AppenderConfig {
            content_encoding: "zstd".to_string(),
            ..Default::default()
        };

        let path = config.write_beside(&store).unwrap();
        assert_eq!(path, dir.path().join("app.binlog.yaml"));

        let read = AppenderConfig::read_beside(&store).unwrap();
        assert_eq!(read, config);
    }

    #[test]
    fn test_sidecars_are_per_store() {
        let dir = tempdir().unwrap();
        let plain = AppenderConfig {
            name: "plain".to_string(),
            ..Default::default()
        };
        let packed = AppenderConfig {
            name: "packed".to_string(),
            content_encoding: "zstd".to_string(),
            ..Default::default()
        };

        plain.write_beside(&dir.path().join("a.binlog")).unwrap();
        packed.write_beside(&dir.path().join("b.binlog")).unwrap();

        assert_eq!(AppenderConfig::read_beside(&dir.path().join("a.binlog")).unwrap(), plain);
        assert_eq!(AppenderConfig::read_beside(&dir.path().join("b.binlog")).unwrap(), packed);
        assert!(AppenderConfig::read_beside(&dir.path().join("c.binlog")).is_err());
    }

    #[test]
    fn test_sidecar_of_bare_file_name() {
        assert_eq!(
            AppenderConfig::sidecar_path(Path::new("app.binlog")),
            PathBuf::from("app.binlog.yaml")
        );
    }
}
