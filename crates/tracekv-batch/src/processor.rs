use std::ops::AddAssign;
use std::sync::Arc;

use metrics::counter;
use tracekv_core::{Batch, TimeBucketer};
use tracekv_stats::StatsDispatcher;
use tracekv_storage::StorageRouter;
use tracing::{debug, warn};

use crate::IntakeQueue;

/// Most batches a single drain pops before yielding to the next tick.
pub const DEFAULT_MAX_BATCHES_PER_TICK: usize = 1000;

/// What one drain did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub batches: usize,
    pub records_stored: usize,
    pub records_dropped: usize,
    /// Records whose storage write failed. Their sub-events are still
    /// dispatched.
    pub storage_failures: usize,
    pub sub_events_dispatched: usize,
    pub sub_events_dropped: usize,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.batches == 0
    }
}

impl AddAssign for DrainReport {
    fn add_assign(&mut self, other: Self) {
        self.batches += other.batches;
        self.records_stored += other.records_stored;
        self.records_dropped += other.records_dropped;
        self.storage_failures += other.storage_failures;
        self.sub_events_dispatched += other.sub_events_dispatched;
        self.sub_events_dropped += other.sub_events_dropped;
    }
}

/// The single consumer of an [`IntakeQueue`].
///
/// Not re-entrant: callers must serialize [`drain`](Self::drain) calls, which
/// [`DrainScheduler`](crate::DrainScheduler) does.
pub struct BatchProcessor {
    queue: Arc<IntakeQueue>,
    router: StorageRouter,
    dispatcher: StatsDispatcher,
    bucketer: Arc<dyn TimeBucketer>,
    max_batches_per_tick: usize,
}

impl BatchProcessor {
    pub fn new(
        queue: Arc<IntakeQueue>,
        router: StorageRouter,
        dispatcher: StatsDispatcher,
        bucketer: Arc<dyn TimeBucketer>,
    ) -> Self {
        Self {
            queue,
            router,
            dispatcher,
            bucketer,
            max_batches_per_tick: DEFAULT_MAX_BATCHES_PER_TICK,
        }
    }

    pub fn with_max_batches_per_tick(mut self, max_batches_per_tick: usize) -> Self {
        self.max_batches_per_tick = max_batches_per_tick.max(1);
        self
    }

    pub fn queue(&self) -> &Arc<IntakeQueue> {
        &self.queue
    }

    /// Pop and process batches until the queue is empty or the per-tick
    /// budget is spent. Whatever is left stays queued, in order.
    pub fn drain(&self) -> DrainReport {
        let mut report = DrainReport::default();

        while report.batches < self.max_batches_per_tick {
            let Some(batch) = self.queue.pop() else {
                break;
            };
            self.process_batch(&batch, &mut report);
            report.batches += 1;
        }

        if !report.is_empty() {
            counter!("tracekv.drain.batches", report.batches as u64);
            debug!(
                batches = report.batches,
                records_stored = report.records_stored,
                records_dropped = report.records_dropped,
                storage_failures = report.storage_failures,
                sub_events_dispatched = report.sub_events_dispatched,
                sub_events_dropped = report.sub_events_dropped,
                queue_depth = self.queue.len(),
                "Drained intake queue"
            );
        }

        report
    }

    /// Repeat budget-sized drains until the queue is empty.
    pub fn drain_all(&self) -> DrainReport {
        let mut total = DrainReport::default();
        loop {
            let pass = self.drain();
            if pass.is_empty() {
                return total;
            }
            total += pass;
        }
    }

    fn process_batch(&self, batch: &Batch, report: &mut DrainReport) {
        // Every record of the batch stores the same whole-batch value.
        let raw_batch = batch.to_json();

        for record in batch.records() {
            let record = match record {
                Ok(record) => record,
                Err(reason) => {
                    debug!(reason = %reason, "Dropped record");
                    counter!("tracekv.drain.records_dropped", 1, "reason" => reason.reason());
                    report.records_dropped += 1;
                    continue;
                }
            };

            match self.router.write(
                &record.trace_id,
                &record.rpc_id,
                record.timestamp,
                &raw_batch,
            ) {
                Ok(()) => {
                    counter!("tracekv.drain.records_stored", 1);
                    report.records_stored += 1;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        trace_id = %record.trace_id,
                        rpc_id = %record.rpc_id,
                        timestamp = record.timestamp,
                        "Failed to store record"
                    );
                    counter!("tracekv.drain.storage_failures", 1);
                    report.storage_failures += 1;
                }
            }

            if record.sub_event_count() == 0 {
                continue;
            }

            let hour_bucket = self.bucketer.hour_bucket(record.timestamp);
            for event in record.sub_events() {
                match event {
                    Ok(event) => {
                        let sink = self.dispatcher.dispatch(&record, hour_bucket, &event);
                        counter!("tracekv.drain.sub_events", 1, "sink" => sink.as_str());
                        report.sub_events_dispatched += 1;
                    }
                    Err(reason) => {
                        debug!(
                            reason = %reason,
                            trace_id = %record.trace_id,
                            rpc_id = %record.rpc_id,
                            "Dropped sub-event"
                        );
                        counter!("tracekv.drain.sub_events_dropped", 1, "reason" => reason.reason());
                        report.sub_events_dropped += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tracekv_core::CalendarBucketer;
    use tracekv_stats::StatsHub;
    use tracekv_storage::{MemoryStore, ShardResolver, StorageError, StorageShard};

    const TS: i64 = 1_700_000_000;
    const HOUR: i64 = 2023111422;

    struct Fixture {
        queue: Arc<IntakeQueue>,
        store: Arc<MemoryStore>,
        hub: Arc<StatsHub>,
        processor: BatchProcessor,
    }

    fn fixture() -> Fixture {
        let bucketer: Arc<dyn TimeBucketer> = Arc::new(CalendarBucketer::utc());
        let queue = Arc::new(IntakeQueue::new());
        let store = Arc::new(MemoryStore::new(bucketer.clone(), 7, ","));
        let hub = Arc::new(StatsHub::new(10, 24));
        let processor = BatchProcessor::new(
            queue.clone(),
            StorageRouter::new(store.clone()),
            StatsDispatcher::from_hub(hub.clone()),
            bucketer,
        );
        Fixture {
            queue,
            store,
            hub,
            processor,
        }
    }

    fn record(trace: &str, rpc: &str, val: Value) -> Value {
        json!({"key": trace, "rpcid": rpc, "timestamp": TS.to_string(), "val": val})
    }

    fn curl(url: &str) -> Value {
        json!({
            "t": 9, "p": "/a.php", "l": "1", "g": "curl", "e": 0, "c": 12.5,
            "m": {"url": url, "info": {"http_code": "200"}}
        })
    }

    #[test]
    fn test_budget_bounds_one_drain() {
        let f = fixture();
        for i in 0..1005 {
            f.queue
                .submit(Some(Batch::new(vec![record(&format!("t{i}"), "r", json!([]))])));
        }

        let report = f.processor.drain();
        assert_eq!(report.batches, 1000);
        assert_eq!(report.records_stored, 1000);
        assert_eq!(f.queue.len(), 5);

        // Leftovers keep their submission order.
        let leftover: Vec<String> = std::iter::from_fn(|| f.queue.pop())
            .map(|b| b.entries()[0]["key"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(leftover, vec!["t1000", "t1001", "t1002", "t1003", "t1004"]);
    }

    #[test]
    fn test_drain_all_spans_several_budgets() {
        let f = fixture();
        let processor = f.processor.with_max_batches_per_tick(2);
        for i in 0..5 {
            f.queue
                .submit(Some(Batch::new(vec![record(&format!("t{i}"), "r", json!([]))])));
        }

        assert_eq!(processor.drain().batches, 2);
        let report = processor.drain_all();
        assert_eq!(report.batches, 3);
        assert!(f.queue.is_empty());
        assert!(processor.drain().is_empty());
    }

    #[test]
    fn test_invalid_record_does_not_abort_batch() {
        let f = fixture();
        f.queue.submit(Some(Batch::new(vec![
            record("t1", "r1", json!([curl("/a")])),
            record("", "r2", json!([curl("/b")])),
            json!("not an object"),
            record("t3", "r3", json!([])),
        ])));

        let report = f.processor.drain();
        assert_eq!(report.records_stored, 2);
        assert_eq!(report.records_dropped, 2);
        assert_eq!(report.sub_events_dispatched, 1);

        let shard = f.store.shard_for(TS).unwrap();
        assert!(shard.get("t1_r1").is_some());
        assert!(shard.get("t3_r3").is_some());
        assert!(shard.get("_r2").is_none());
        assert_eq!(shard.len(), 4);
        assert!(f.hub.api().get("/b", HOUR).is_none());
    }

    #[test]
    fn test_every_record_stores_whole_batch() {
        let f = fixture();
        let batch = Batch::new(vec![
            record("t1", "r1", json!([])),
            record("t1", "r2", json!([])),
        ]);
        let raw = batch.to_json();
        f.queue.submit(Some(batch));
        f.processor.drain();

        let shard = f.store.shard_for(TS).unwrap();
        assert_eq!(shard.get("t1_r1"), Some(raw.clone()));
        assert_eq!(shard.get("t1_r2"), Some(raw));
        assert_eq!(shard.get("t1_index").as_deref(), Some("r1,r2"));
    }

    #[test]
    fn test_alarm_enrichment_does_not_leak_into_stored_batch() {
        let f = fixture();
        let batch = Batch::new(vec![
            record(
                "t1",
                "r1",
                json!([{"t": 5, "p": "/a.php", "l": "3", "m": {"msg": "boom"}}]),
            ),
            record("t1", "r2", json!([])),
        ]);
        f.queue.submit(Some(batch));
        f.processor.drain();

        let stored = f.store.shard_for(TS).unwrap().get("t1_r2").unwrap();
        assert!(!stored.contains("mytraceid"));
        assert_eq!(f.hub.alarms().count(5), 1);
    }

    #[test]
    fn test_dropped_sub_events_are_counted() {
        let f = fixture();
        f.queue.submit(Some(Batch::new(vec![record(
            "t1",
            "r1",
            json!([
                curl("/ok"),
                {"t": 9, "p": "a", "l": "1", "g": "curl", "e": 0, "c": 1,
                 "m": {"url": "/x", "info": {"http_code": null}}},
                {"t": 2, "p": "a", "l": "1"},
                {"t": 9, "p": "a", "l": "1", "g": "mysql", "e": 0, "c": 2,
                 "m": "{\"sql\":\"select 1\"}"}
            ]),
        )])));

        let report = f.processor.drain();
        assert_eq!(report.sub_events_dispatched, 2);
        assert_eq!(report.sub_events_dropped, 2);
        assert!(f.hub.api().get("/x", HOUR).is_none());
        assert_eq!(f.hub.sql().get("select 1", HOUR).unwrap().count, 1);
    }

    struct BrokenStore;

    impl ShardResolver for BrokenStore {
        fn shard(&self, timestamp: i64) -> tracekv_storage::Result<Arc<dyn StorageShard>> {
            Err(StorageError::ShardUnavailable {
                timestamp,
                reason: "offline".into(),
            })
        }
    }

    #[test]
    fn test_storage_failure_keeps_stats_and_later_records() {
        let bucketer: Arc<dyn TimeBucketer> = Arc::new(CalendarBucketer::utc());
        let queue = Arc::new(IntakeQueue::new());
        let hub = Arc::new(StatsHub::new(10, 24));
        let processor = BatchProcessor::new(
            queue.clone(),
            StorageRouter::new(Arc::new(BrokenStore)),
            StatsDispatcher::from_hub(hub.clone()),
            bucketer,
        );

        queue.submit(Some(Batch::new(vec![
            record("t1", "r1", json!([curl("/a")])),
            record("t2", "r2", json!([curl("/a")])),
        ])));
        queue.submit(Some(Batch::new(vec![record("t3", "r3", json!([]))])));

        let report = processor.drain();
        assert_eq!(report.batches, 2);
        assert_eq!(report.storage_failures, 3);
        assert_eq!(report.records_stored, 0);
        assert_eq!(hub.api().get("/a", HOUR).unwrap().cost.count, 2);
    }
}
