use super::{LogFormat, RuntimeConfig};
use anyhow::{anyhow, Context, Result};
use std::str::FromStr;

pub const ENV_PREFIX: &str = "TRACEKV_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    /// Look up `key` with the `TRACEKV_` prefix applied.
    fn get(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Server configuration (listen addr, log level/format)
    if let Some(addr) = env.get("LISTEN_ADDR") {
        config.server.listen_addr = addr;
    }
    if let Some(level) = env.get("LOG_LEVEL") {
        config.server.log_level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.server.log_format = format
            .parse::<LogFormat>()
            .context("Invalid TRACEKV_LOG_FORMAT value")?;
    }

    // Request configuration
    if let Some(val) = get_env_parsed::<usize, _>(env, "MAX_PAYLOAD_BYTES")? {
        config.request.max_payload_bytes = val;
    }

    // Drain loop
    if let Some(val) = get_env_parsed::<u64, _>(env, "TICK_INTERVAL_MS")? {
        config.pipeline.tick_interval_ms = val;
    }
    if let Some(val) = get_env_parsed::<usize, _>(env, "MAX_BATCHES_PER_TICK")? {
        config.pipeline.max_batches_per_tick = val;
    }

    // Storage
    if let Some(val) = get_env_parsed::<usize, _>(env, "RETENTION_DAYS")? {
        config.storage.retention_days = val;
    }
    if let Some(delimiter) = env.get("MERGE_DELIMITER") {
        config.storage.merge_delimiter = delimiter;
    }

    if let Some(val) = get_env_parsed::<i32, _>(env, "UTC_OFFSET_SECS")? {
        config.buckets.utc_offset_secs = val;
    }

    if let Some(val) = get_env_parsed::<usize, _>(env, "RECENT_ALARMS")? {
        config.stats.recent_alarms = val;
    }
    if let Some(val) = get_env_parsed::<usize, _>(env, "STATS_RETENTION_HOURS")? {
        config.stats.retention_hours = val;
    }

    Ok(())
}

fn get_env_parsed<T, E>(env: &E, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    E: EnvSource,
{
    match env.get(key) {
        Some(val) => {
            let parsed = val
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
