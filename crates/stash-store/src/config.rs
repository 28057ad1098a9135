//! Store selection.
//!
//! [`StoreConfig`] picks the store variant and identifier strategy once, at
//! construction time, and hands back a ready `Arc<dyn BlobStore>`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::id::{IdGenerator, SequentialGenerator, TimeOrderedGenerator, UuidGenerator};
use crate::memory::MemoryStore;
use crate::traits::BlobStore;
use crate::uuid_store::UuidStore;

/// Errors from loading or applying a [`StoreConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings are individually valid but cannot be combined.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How blobs are keyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Keying {
    /// Any non-empty string; see [`MemoryStore`].
    #[default]
    Text,
    /// UUIDs only; see [`UuidStore`].
    Uuid,
}

/// Identifier strategy for blobs created without a caller-chosen identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GeneratorConfig {
    /// Random UUID v4.
    #[default]
    Random,
    /// UUID v7.
    TimeOrdered,
    /// `<prefix>1`, `<prefix>2`, ...
    Sequential {
        #[serde(default)]
        prefix: String,
    },
}

impl GeneratorConfig {
    /// Instantiate the configured generator.
    pub fn build(&self) -> Box<dyn IdGenerator> {
        match self {
            Self::Random => Box::new(UuidGenerator),
            Self::TimeOrdered => Box::new(TimeOrderedGenerator),
            Self::Sequential { prefix } => Box::new(SequentialGenerator::new(prefix.clone())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub keying: Keying,
    pub generator: GeneratorConfig,
}

impl StoreConfig {
    /// Parse a config from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "loaded store config");
        Self::from_toml_str(&text)
    }

    /// Reject combinations that cannot be honored.
    ///
    /// The UUID-keyed store always generates random UUIDs, so any other
    /// generator would be silently ignored.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keying == Keying::Uuid && self.generator != GeneratorConfig::Random {
            return Err(ConfigError::Invalid(
                "uuid keying only supports the random generator".into(),
            ));
        }
        Ok(())
    }

    /// Construct the configured store.
    pub fn build(&self) -> Result<Arc<dyn BlobStore>, ConfigError> {
        self.validate()?;
        let store: Arc<dyn BlobStore> = match self.keying {
            Keying::Text => Arc::new(MemoryStore::with_generator(self.generator.build())),
            Keying::Uuid => Arc::new(UuidStore::new()),
        };
        debug!(keying = ?self.keying, generator = ?self.generator, "built blob store");
        Ok(store)
    }
}
