// Initialization utilities
//
// Pipeline wiring and logging/tracing setup

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracekv_batch::{BatchProcessor, IntakeQueue};
use tracekv_config::{LogFormat, RuntimeConfig};
use tracekv_core::{CalendarBucketer, TimeBucketer};
use tracekv_stats::{StatsDispatcher, StatsHub};
use tracekv_storage::{MemoryStore, StorageRouter};
use tracing::info;

use crate::AppState;

/// Everything the HTTP surface and the drain scheduler share.
pub(crate) struct Pipeline {
    pub state: AppState,
    pub processor: Arc<BatchProcessor>,
}

/// Build the queue, store, aggregators and drain processor from config.
pub(crate) fn init_pipeline(config: &RuntimeConfig) -> Result<Pipeline> {
    let offset = config.buckets.utc_offset_secs;
    let bucketer: Arc<dyn TimeBucketer> = Arc::new(
        CalendarBucketer::with_offset_secs(offset)
            .ok_or_else(|| anyhow!("invalid buckets.utc_offset_secs: {}", offset))?,
    );

    let queue = Arc::new(IntakeQueue::new());
    let store = Arc::new(MemoryStore::new(
        bucketer.clone(),
        config.storage.retention_days,
        config.storage.merge_delimiter.clone(),
    ));
    let stats = Arc::new(StatsHub::new(
        config.stats.recent_alarms,
        config.stats.retention_hours,
    ));

    info!(
        retention_days = config.storage.retention_days,
        utc_offset_secs = offset,
        max_batches_per_tick = config.pipeline.max_batches_per_tick,
        "Initialized in-memory store and statistics"
    );

    let processor = BatchProcessor::new(
        queue.clone(),
        StorageRouter::new(store.clone()),
        StatsDispatcher::from_hub(stats.clone()),
        bucketer,
    )
    .with_max_batches_per_tick(config.pipeline.max_batches_per_tick);

    Ok(Pipeline {
        state: AppState {
            queue,
            store,
            stats,
            max_payload_bytes: config.request.max_payload_bytes,
        },
        processor: Arc::new(processor),
    })
}

/// Initialize tracing/logging from RuntimeConfig
pub fn init_tracing(config: &RuntimeConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // A second initialization (tests, embedding) keeps the first subscriber.
    let _ = match config.server.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(fmt::layer()).try_init(),
    };
}
