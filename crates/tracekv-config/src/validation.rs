// Configuration validation
//
// Validates that values are sensible before the server starts

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_server_config(&config.server)?;
    validate_request_config(&config.request)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_storage_config(&config.storage)?;
    validate_bucket_config(&config.buckets)?;
    validate_stats_config(&config.stats)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.listen_addr.is_empty() {
        bail!("server.listen_addr must not be empty");
    }

    // Basic validation that it looks like an address
    if !config.listen_addr.contains(':') {
        bail!("server.listen_addr must be in format 'host:port'");
    }

    Ok(())
}

fn validate_request_config(config: &RequestConfig) -> Result<()> {
    if config.max_payload_bytes == 0 {
        bail!("request.max_payload_bytes must be greater than 0");
    }

    if config.max_payload_bytes > 100 * 1024 * 1024 {
        // 100 MB
        warn!(
            max_payload_bytes = config.max_payload_bytes,
            "request.max_payload_bytes is very large; may cause issues"
        );
    }

    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<()> {
    if config.tick_interval_ms == 0 {
        bail!("pipeline.tick_interval_ms must be greater than 0");
    }

    if config.max_batches_per_tick == 0 {
        bail!("pipeline.max_batches_per_tick must be greater than 0");
    }

    if config.max_batches_per_tick > 100_000 {
        warn!(
            max_batches_per_tick = config.max_batches_per_tick,
            "pipeline.max_batches_per_tick is very large; ticks may run long under backlog"
        );
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    if config.retention_days == 0 {
        bail!("storage.retention_days must be greater than 0");
    }

    if config.merge_delimiter.is_empty() {
        bail!("storage.merge_delimiter must not be empty");
    }

    Ok(())
}

fn validate_bucket_config(config: &BucketConfig) -> Result<()> {
    const MAX_OFFSET_SECS: i32 = 24 * 3600;

    if config.utc_offset_secs.abs() >= MAX_OFFSET_SECS {
        bail!("buckets.utc_offset_secs must be within ±24 hours");
    }

    Ok(())
}

fn validate_stats_config(config: &StatsConfig) -> Result<()> {
    if config.retention_hours == 0 {
        bail!("stats.retention_hours must be greater than 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_pipeline_config() {
        assert!(validate_pipeline_config(&PipelineConfig::default()).is_ok());

        let no_budget = PipelineConfig {
            tick_interval_ms: 500,
            max_batches_per_tick: 0,
        };
        assert!(validate_pipeline_config(&no_budget).is_err());

        let no_interval = PipelineConfig {
            tick_interval_ms: 0,
            max_batches_per_tick: 1000,
        };
        assert!(validate_pipeline_config(&no_interval).is_err());
    }

    #[test]
    fn test_validate_storage_config() {
        let empty_delimiter = StorageConfig {
            retention_days: 7,
            merge_delimiter: String::new(),
        };
        assert!(validate_storage_config(&empty_delimiter).is_err());

        let no_retention = StorageConfig {
            retention_days: 0,
            merge_delimiter: ",".into(),
        };
        assert!(validate_storage_config(&no_retention).is_err());
    }

    #[test]
    fn test_validate_server_and_buckets() {
        let mut config = RuntimeConfig::default();
        config.server.listen_addr = "localhost".into();
        assert!(validate_config(&config).is_err());

        let mut config = RuntimeConfig::default();
        config.buckets.utc_offset_secs = 86_400;
        assert!(validate_config(&config).is_err());

        config.buckets.utc_offset_secs = -8 * 3600;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_stats_config() {
        let no_window = StatsConfig {
            recent_alarms: 100,
            retention_hours: 0,
        };
        assert!(validate_stats_config(&no_window).is_err());
        assert!(validate_stats_config(&StatsConfig::default()).is_ok());
    }
}
