//! Startup configuration for docq.
//!
//! Configuration is a single TOML file read once at process start; nothing is
//! hot-reloaded. Every table is optional and falls back to the defaults below.
//!
//! ```toml
//! [cache]
//! capacity = 10
//! memory_budget_mb = 100
//!
//! [streaming]
//! enabled = true
//! chunk_size = 4096
//!
//! [docs]
//! root = "/var/lib/docq"
//! standard_packages = ["core", "stdlib"]
//! generator = ["docq-extract", "{name}", "{version}", "{output}"]
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use docq_memory::{MemoryBudget, MemoryEstimator, FALLBACK_BYTES_PER_OBJECT};
use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod logging;

pub use logging::{init_tracing, LoggingConfig};

/// A byte size which accepts both raw byte counts and human-friendly suffixes (`"64MiB"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteSize(pub u64);

impl Serialize for ByteSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bytes(u64),
            Human(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bytes(value) => Ok(ByteSize(value)),
            Repr::Human(value) => docq_memory::parse_byte_size(&value)
                .map(ByteSize)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Bounds for the in-memory registry cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of resident registries. `0` disables caching entirely.
    #[serde(default = "CacheConfig::default_capacity")]
    pub capacity: usize,

    /// Estimated memory budget in MiB.
    #[serde(default = "CacheConfig::default_memory_budget_mb")]
    pub memory_budget_mb: u64,

    /// Exact budget in bytes (or a human size); wins over `memory_budget_mb` when set.
    #[serde(default)]
    pub memory_budget: Option<ByteSize>,

    /// Bytes charged per documented object when a registry cannot be measured.
    #[serde(default = "CacheConfig::default_fallback_bytes_per_object")]
    pub fallback_bytes_per_object: u64,
}

impl CacheConfig {
    fn default_capacity() -> usize {
        10
    }

    fn default_memory_budget_mb() -> u64 {
        MemoryBudget::DEFAULT_MB
    }

    fn default_fallback_bytes_per_object() -> u64 {
        FALLBACK_BYTES_PER_OBJECT
    }

    pub fn budget(&self) -> MemoryBudget {
        match self.memory_budget {
            Some(ByteSize(bytes)) => MemoryBudget::from_bytes(bytes),
            None => MemoryBudget::from_mb(self.memory_budget_mb),
        }
    }

    pub fn estimator(&self) -> MemoryEstimator {
        MemoryEstimator::new(self.fallback_bytes_per_object)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
            memory_budget_mb: Self::default_memory_budget_mb(),
            memory_budget: None,
            fallback_bytes_per_object: Self::default_fallback_bytes_per_object(),
        }
    }
}

/// Chunking of large text payloads (docstrings, rendered listings).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamingConfig {
    #[serde(default = "StreamingConfig::default_enabled")]
    pub enabled: bool,

    /// Chunk size in bytes. Must be non-zero.
    #[serde(default = "StreamingConfig::default_chunk_size")]
    pub chunk_size: usize,
}

impl StreamingConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_chunk_size() -> usize {
        4096
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            chunk_size: Self::default_chunk_size(),
        }
    }
}

/// Where documentation artifacts live and how missing ones are produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocsConfig {
    /// Artifact root; artifacts live at `<root>/<name>-<version>/registry.bin`.
    ///
    /// Defaults to `$HOME/.local/share/docq`.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Optional JSON list of installed packages (`[{"name": .., "version": ..}]`).
    ///
    /// When unset, packages are enumerated from the directories under `root`.
    #[serde(default)]
    pub packages_manifest: Option<PathBuf>,

    /// Packages scanned first when resolving an unknown object path.
    #[serde(default = "DocsConfig::default_standard_packages")]
    pub standard_packages: Vec<String>,

    /// External extraction command run when an artifact is missing.
    ///
    /// `{name}`, `{version}` and `{output}` are substituted in every argument.
    #[serde(default)]
    pub generator: Option<Vec<String>>,
}

impl DocsConfig {
    fn default_standard_packages() -> Vec<String> {
        vec!["core".to_owned(), "stdlib".to_owned()]
    }

    pub fn root(&self) -> PathBuf {
        if let Some(root) = &self.root {
            return root.clone();
        }
        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".local/share/docq"),
            None => PathBuf::from(".docq"),
        }
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [&mut self.root, &mut self.packages_manifest]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            root: None,
            packages_manifest: None,
            standard_packages: Self::default_standard_packages(),
            generator: None,
        }
    }
}

/// Top-level docq configuration loaded from TOML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocqConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    #[serde(default)]
    pub docs: DocsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid value for `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // Keep only the message; the default `Display` embeds a source snippet.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl DocqConfig {
    /// Load a config file from TOML. Relative paths are resolved against the file's directory.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::load_from_str(&text)?;
        if let Some(dir) = path.parent() {
            config.docs.resolve_relative_to(dir);
        }
        Ok(config)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: DocqConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streaming.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "streaming.chunk_size",
                message: "must be at least 1 byte".to_owned(),
            });
        }
        if self.cache.capacity == 0 {
            tracing::warn!(
                target: "docq.config",
                "cache.capacity = 0; every loaded registry is evicted immediately"
            );
        }
        if self
            .docs
            .generator
            .as_ref()
            .is_some_and(|argv| argv.is_empty())
        {
            return Err(ConfigError::Invalid {
                field: "docs.generator",
                message: "command must name a program".to_owned(),
            });
        }
        Ok(())
    }
}

pub const DOCQ_CONFIG_ENV_VAR: &str = "DOCQ_CONFIG_PATH";

static CONFIG_ENV_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

fn config_env_lock() -> &'static ReentrantMutex<()> {
    CONFIG_ENV_LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Run `f` while holding the config environment lock.
///
/// Tests that set [`DOCQ_CONFIG_ENV_VAR`] must wrap the mutation and the discovery call in this
/// helper; environment variables are process-global.
pub fn with_config_env_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = config_env_lock().lock();
    f()
}

/// Discover the config file for a working directory.
///
/// Search order:
/// 1) `DOCQ_CONFIG_PATH` (absolute or relative to `dir`)
/// 2) `docq.toml` in `dir`
/// 3) `.docq.toml` in `dir`
pub fn discover_config_path(dir: &Path) -> Option<PathBuf> {
    let _guard = config_env_lock().lock();
    if let Some(value) = std::env::var_os(DOCQ_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            dir.join(candidate)
        };
        return Some(path);
    }

    ["docq.toml", ".docq.toml"]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load the configuration for `dir`; returns defaults and `None` when no file is found.
pub fn load_for_dir(dir: &Path) -> Result<(DocqConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(dir) else {
        return Ok((DocqConfig::default(), None));
    };

    let config = DocqConfig::load_from_path(&path)?;
    tracing::debug!(target: "docq.config", path = %path.display(), "loaded config");
    Ok((config, Some(path)))
}
