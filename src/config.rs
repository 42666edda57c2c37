//! Store configuration
//!
//! The harness hands the store its whole property set; only the keys
//! below are interpreted and everything else is ignored.
//!
//! | key                     | default  |
//! |-------------------------|----------|
//! | `store_dir`             | required |
//! | `cache_type`            | `lru`    |
//! | `cache_size_mb`         | 64       |
//! | `bulk_load_batch_size`  | 30000    |
//! | `type_cache_capacity`   | 1024     |
//! | `lock_timeout_ms`       | 1000     |
//! | `max_payload_bytes`     | 16 MiB   |
//! | `engine.*`              | passed through to the engine |

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Harness property set
pub type Properties = HashMap<String, String>;

pub const KEY_STORE_DIR: &str = "store_dir";
pub const KEY_CACHE_TYPE: &str = "cache_type";
pub const KEY_CACHE_SIZE_MB: &str = "cache_size_mb";
pub const KEY_BULK_LOAD_BATCH_SIZE: &str = "bulk_load_batch_size";
pub const KEY_TYPE_CACHE_CAPACITY: &str = "type_cache_capacity";
pub const KEY_LOCK_TIMEOUT_MS: &str = "lock_timeout_ms";
pub const KEY_MAX_PAYLOAD_BYTES: &str = "max_payload_bytes";
pub const ENGINE_KEY_PREFIX: &str = "engine.";

pub const DEFAULT_BULK_LOAD_BATCH_SIZE: usize = 30_000;
pub const DEFAULT_CACHE_SIZE_MB: usize = 64;
pub const DEFAULT_TYPE_CACHE_CAPACITY: usize = 1_024;
pub const DEFAULT_LOCK_TIMEOUT_MS: i64 = 1_000;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required key absent
    #[error("Missing configuration key: {0}")]
    MissingKey(&'static str),

    /// Value does not parse or is out of range
    #[error("Invalid value {value:?} for key {key}")]
    InvalidValue { key: String, value: String },

    /// Config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Harness phase the store is initialized for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Initial bulk load
    Load,
    /// Request/measurement phase
    Request,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Load => write!(f, "load"),
            Phase::Request => write!(f, "request"),
        }
    }
}

/// Block cache strategy for the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheStrategy {
    /// No block cache
    None,
    /// Shared LRU block cache
    Lru,
}

impl FromStr for CacheStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(CacheStrategy::None),
            // Legacy strategy names all map onto the LRU cache
            "lru" | "gcr" | "strong" | "soft" | "weak" => Ok(CacheStrategy::Lru),
            _ => Err(ConfigError::InvalidValue {
                key: KEY_CACHE_TYPE.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Compression applied to engine data blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compression {
    None,
    Lz4,
    Zstd,
}

impl FromStr for Compression {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "lz4" => Ok(Compression::Lz4),
            "zstd" => Ok(Compression::Zstd),
            _ => Err(ConfigError::InvalidValue {
                key: format!("{}compression", ENGINE_KEY_PREFIX),
                value: s.to_string(),
            }),
        }
    }
}

/// Engine tuning taken from `engine.*` keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineTuning {
    pub write_buffer_size: Option<usize>,
    pub max_write_buffer_number: Option<i32>,
    pub max_background_jobs: Option<i32>,
    pub compression: Option<Compression>,
    /// Keys the store does not interpret, kept verbatim
    pub passthrough: BTreeMap<String, String>,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage directory
    pub store_dir: PathBuf,
    /// Block cache strategy
    pub cache_type: CacheStrategy,
    /// Block cache capacity in megabytes
    pub cache_size_mb: usize,
    /// Chunk size advertised to bulk loaders
    pub bulk_load_batch_size: usize,
    /// Capacity of the link-type tag cache
    pub type_cache_capacity: usize,
    /// Engine lock wait in milliseconds
    pub lock_timeout_ms: i64,
    /// Upper bound on node and link payloads
    pub max_payload_bytes: usize,
    /// Engine tuning
    pub engine: EngineTuning,
}

impl StoreConfig {
    /// Configuration with defaults for everything but the storage directory
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
            cache_type: CacheStrategy::Lru,
            cache_size_mb: DEFAULT_CACHE_SIZE_MB,
            bulk_load_batch_size: DEFAULT_BULK_LOAD_BATCH_SIZE,
            type_cache_capacity: DEFAULT_TYPE_CACHE_CAPACITY,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            engine: EngineTuning::default(),
        }
    }

    /// Build a configuration from a harness property set
    pub fn from_properties(props: &Properties) -> ConfigResult<Self> {
        let store_dir = props
            .get(KEY_STORE_DIR)
            .filter(|dir| !dir.trim().is_empty())
            .ok_or(ConfigError::MissingKey(KEY_STORE_DIR))?;

        let mut config = Self::new(store_dir.trim());

        if let Some(value) = props.get(KEY_CACHE_TYPE) {
            config.cache_type = value.parse()?;
        }
        if let Some(value) = props.get(KEY_CACHE_SIZE_MB) {
            config.cache_size_mb = parse_positive(KEY_CACHE_SIZE_MB, value)?;
            config.cache_bytes()?;
        }
        if let Some(value) = props.get(KEY_BULK_LOAD_BATCH_SIZE) {
            config.bulk_load_batch_size = parse_positive(KEY_BULK_LOAD_BATCH_SIZE, value)?;
        }
        if let Some(value) = props.get(KEY_TYPE_CACHE_CAPACITY) {
            config.type_cache_capacity = parse_positive(KEY_TYPE_CACHE_CAPACITY, value)?;
        }
        if let Some(value) = props.get(KEY_LOCK_TIMEOUT_MS) {
            config.lock_timeout_ms = parse_value(KEY_LOCK_TIMEOUT_MS, value)?;
        }
        if let Some(value) = props.get(KEY_MAX_PAYLOAD_BYTES) {
            config.max_payload_bytes = parse_positive(KEY_MAX_PAYLOAD_BYTES, value)?;
        }

        for (key, value) in props {
            if let Some(name) = key.strip_prefix(ENGINE_KEY_PREFIX) {
                config.engine.apply(key, name, value)?;
            }
        }

        Ok(config)
    }

    /// Block cache capacity in bytes
    pub fn cache_bytes(&self) -> ConfigResult<usize> {
        self.cache_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: KEY_CACHE_SIZE_MB.to_string(),
                value: self.cache_size_mb.to_string(),
            })
    }

    /// Load a configuration from a flat YAML mapping of the same keys
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Parse a configuration from YAML text
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let raw: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(text)?;
        let mut props = Properties::new();
        for (key, value) in raw {
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Null => continue,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key,
                        value: format!("{:?}", other),
                    })
                }
            };
            props.insert(key, value);
        }
        Self::from_properties(&props)
    }
}

impl EngineTuning {
    fn apply(&mut self, key: &str, name: &str, value: &str) -> ConfigResult<()> {
        match name {
            "write_buffer_size" => self.write_buffer_size = Some(parse_positive(key, value)?),
            "max_write_buffer_number" => self.max_write_buffer_number = Some(parse_value(key, value)?),
            "max_background_jobs" => self.max_background_jobs = Some(parse_value(key, value)?),
            "compression" => self.compression = Some(value.parse()?),
            _ => {
                debug!("Keeping uninterpreted engine option {}={}", key, value);
                self.passthrough.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_positive(key: &str, value: &str) -> ConfigResult<usize> {
    let parsed: usize = parse_value(key, value)?;
    if parsed == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_properties(&props(&[("store_dir", "/tmp/lg")])).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/tmp/lg"));
        assert_eq!(config.cache_type, CacheStrategy::Lru);
        assert_eq!(config.bulk_load_batch_size, DEFAULT_BULK_LOAD_BATCH_SIZE);
        assert_eq!(config.type_cache_capacity, DEFAULT_TYPE_CACHE_CAPACITY);
        assert_eq!(config.lock_timeout_ms, DEFAULT_LOCK_TIMEOUT_MS);
        assert_eq!(config.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
        assert_eq!(config.engine, EngineTuning::default());
    }

    #[test]
    fn test_missing_store_dir() {
        let err = StoreConfig::from_properties(&props(&[("cache_type", "lru")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(KEY_STORE_DIR)));

        let err = StoreConfig::from_properties(&props(&[("store_dir", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(KEY_STORE_DIR)));
    }

    #[test]
    fn test_cache_strategy_aliases() {
        assert_eq!("gcr".parse::<CacheStrategy>().unwrap(), CacheStrategy::Lru);
        assert_eq!("SOFT".parse::<CacheStrategy>().unwrap(), CacheStrategy::Lru);
        assert_eq!("none".parse::<CacheStrategy>().unwrap(), CacheStrategy::None);
        assert!("arc".parse::<CacheStrategy>().is_err());
    }

    #[test]
    fn test_overrides_and_unrelated_keys() {
        let config = StoreConfig::from_properties(&props(&[
            ("store_dir", "/data"),
            ("cache_type", "none"),
            ("bulk_load_batch_size", "500"),
            ("lock_timeout_ms", "250"),
            ("requesters", "16"),
        ]))
        .unwrap();

        assert_eq!(config.cache_type, CacheStrategy::None);
        assert_eq!(config.bulk_load_batch_size, 500);
        assert_eq!(config.lock_timeout_ms, 250);
    }

    #[test]
    fn test_invalid_numbers() {
        let err = StoreConfig::from_properties(&props(&[
            ("store_dir", "/data"),
            ("bulk_load_batch_size", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = StoreConfig::from_properties(&props(&[
            ("store_dir", "/data"),
            ("bulk_load_batch_size", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_cache_size_overflow() {
        let huge = usize::MAX.to_string();
        let err = StoreConfig::from_properties(&props(&[
            ("store_dir", "/data"),
            ("cache_size_mb", huge.as_str()),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == KEY_CACHE_SIZE_MB));

        let mut config = StoreConfig::new("/data");
        assert_eq!(config.cache_bytes().unwrap(), DEFAULT_CACHE_SIZE_MB * 1024 * 1024);
        config.cache_size_mb = usize::MAX / 2;
        assert!(config.cache_bytes().is_err());
    }

    #[test]
    fn test_engine_passthrough() {
        let config = StoreConfig::from_properties(&props(&[
            ("store_dir", "/data"),
            ("engine.write_buffer_size", "1048576"),
            ("engine.compression", "zstd"),
            ("engine.bloom_bits", "10"),
        ]))
        .unwrap();

        assert_eq!(config.engine.write_buffer_size, Some(1_048_576));
        assert_eq!(config.engine.compression, Some(Compression::Zstd));
        assert_eq!(
            config.engine.passthrough.get("engine.bloom_bits").map(String::as_str),
            Some("10")
        );
    }

    #[test]
    fn test_yaml() {
        let config = StoreConfig::from_yaml_str(
            "store_dir: /var/lib/linkgraph\ncache_type: gcr\nbulk_load_batch_size: 1000\n",
        )
        .unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/var/lib/linkgraph"));
        assert_eq!(config.bulk_load_batch_size, 1000);

        let err = StoreConfig::from_yaml_str("store_dir: [a, b]\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Load.to_string(), "load");
        assert_eq!(Phase::Request.to_string(), "request");
    }
}
