use std::sync::Arc;

use tracing::trace;

use crate::{Result, ShardResolver};

/// Writes a record's primary value and index entry to its time shard.
#[derive(Clone)]
pub struct StorageRouter {
    resolver: Arc<dyn ShardResolver>,
}

impl StorageRouter {
    pub fn new(resolver: Arc<dyn ShardResolver>) -> Self {
        Self { resolver }
    }

    /// Put `raw_batch_json` under `{trace_id}_{rpc_id}` and merge `rpc_id`
    /// into `{trace_id}_index`.
    ///
    /// Both writes are attempted even when the first fails; the first error
    /// is returned. The pair is not atomic.
    pub fn write(
        &self,
        trace_id: &str,
        rpc_id: &str,
        timestamp: i64,
        raw_batch_json: &str,
    ) -> Result<()> {
        let shard = self.resolver.shard(timestamp)?;

        let primary_key = format!("{}_{}", trace_id, rpc_id);
        let index_key = format!("{}_index", trace_id);

        let put = shard.put(&primary_key, raw_batch_json);
        let merge = shard.merge(&index_key, rpc_id);

        trace!(
            key = %primary_key,
            index = %index_key,
            bytes = raw_batch_json.len(),
            "Wrote record"
        );

        put.and(merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StorageError, StorageShard};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingShard {
        calls: Mutex<Vec<(&'static str, String, String)>>,
        fail_put: bool,
    }

    impl StorageShard for RecordingShard {
        fn put(&self, key: &str, value: &str) -> Result<()> {
            self.calls.lock().push(("put", key.into(), value.into()));
            if self.fail_put {
                return Err(StorageError::write("put", key, "disk full"));
            }
            Ok(())
        }

        fn merge(&self, key: &str, value: &str) -> Result<()> {
            self.calls.lock().push(("merge", key.into(), value.into()));
            Ok(())
        }
    }

    struct SingleShard {
        shard: Arc<RecordingShard>,
        seen: Mutex<Vec<i64>>,
    }

    impl ShardResolver for SingleShard {
        fn shard(&self, timestamp: i64) -> Result<Arc<dyn StorageShard>> {
            self.seen.lock().push(timestamp);
            let shard: Arc<dyn StorageShard> = self.shard.clone();
            Ok(shard)
        }
    }

    struct NoShard;

    impl ShardResolver for NoShard {
        fn shard(&self, timestamp: i64) -> Result<Arc<dyn StorageShard>> {
            Err(StorageError::ShardUnavailable {
                timestamp,
                reason: "closed".into(),
            })
        }
    }

    fn router_with(shard: RecordingShard) -> (StorageRouter, Arc<SingleShard>) {
        let resolver = Arc::new(SingleShard {
            shard: Arc::new(shard),
            seen: Mutex::new(Vec::new()),
        });
        (StorageRouter::new(resolver.clone()), resolver)
    }

    #[test]
    fn test_write_issues_put_and_merge() {
        let (router, resolver) = router_with(RecordingShard::default());
        router.write("t1", "r1", 1_700_000_000, "[{}]").unwrap();

        assert_eq!(*resolver.seen.lock(), vec![1_700_000_000]);
        assert_eq!(
            *resolver.shard.calls.lock(),
            vec![
                ("put", "t1_r1".to_string(), "[{}]".to_string()),
                ("merge", "t1_index".to_string(), "r1".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_attempted_when_put_fails() {
        let (router, resolver) = router_with(RecordingShard {
            fail_put: true,
            ..Default::default()
        });
        let err = router.write("t1", "r1", 1, "[]").unwrap_err();

        assert!(matches!(err, StorageError::Write { op: "put", .. }));
        assert_eq!(resolver.shard.calls.lock().len(), 2);
    }

    #[test]
    fn test_resolver_failure_is_surfaced() {
        let router = StorageRouter::new(Arc::new(NoShard));
        let err = router.write("t1", "r1", 42, "[]").unwrap_err();
        assert!(err.to_string().contains("42"));
    }
}
