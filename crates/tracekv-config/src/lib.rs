// tracekv-config - Runtime configuration
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority, TRACEKV_ prefix)
// 2. Config file path from TRACEKV_CONFIG env var (or --config on the CLI)
// 3. Config file contents from TRACEKV_CONFIG_CONTENT env var
// 4. Default config file location (./tracekv.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub server: ServerConfig,
    pub request: RequestConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub buckets: BucketConfig,
    pub stats: StatsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8090".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

/// Request handling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub max_payload_bytes: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Drain loop scheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tick_interval_ms: u64,
    pub max_batches_per_tick: usize,
}

impl PipelineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            max_batches_per_tick: 1000,
        }
    }
}

/// Day-sharded key/value store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Number of most recent day shards kept.
    pub retention_days: usize,
    /// Separator placed between merged values.
    pub merge_delimiter: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            retention_days: 7,
            merge_delimiter: ",".to_string(),
        }
    }
}

/// Calendar bucketing of timestamps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Offset from UTC, in seconds, used for day shards and hour buckets.
    pub utc_offset_secs: i32,
}

/// In-memory statistics aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Alarm messages retained per kind.
    pub recent_alarms: usize,
    /// Newest hour buckets kept by the API and SQL counters.
    pub retention_hours: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            recent_alarms: 100,
            retention_hours: 48,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from an explicit file (CLI `--config`), then apply
    /// environment overrides.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Parse TOML content on top of defaults without consulting the environment.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = RuntimeConfig::default();
        assert_eq!(config.pipeline.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.pipeline.max_batches_per_tick, 1000);
        assert_eq!(config.storage.merge_delimiter, ",");
        assert_eq!(config.server.log_format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RuntimeConfig::from_toml(
            r#"
            [server]
            log_format = "json"

            [pipeline]
            max_batches_per_tick = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.server.listen_addr, "0.0.0.0:8090");
        assert_eq!(config.pipeline.max_batches_per_tick, 250);
        assert_eq!(config.pipeline.tick_interval_ms, 500);
        assert_eq!(config.stats.recent_alarms, 100);
        assert_eq!(config.stats.retention_hours, 48);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
