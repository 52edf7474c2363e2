use std::sync::Arc;

use crate::Result;

/// Handle to one time shard of the key/value store.
///
/// Implementations must be safe for concurrent use: read-side queries may
/// run while the drain loop writes.
pub trait StorageShard: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Combine `value` with whatever is already stored under `key`.
    fn merge(&self, key: &str, value: &str) -> Result<()>;
}

/// Selects the shard owning an epoch-second timestamp.
pub trait ShardResolver: Send + Sync {
    fn shard(&self, timestamp: i64) -> Result<Arc<dyn StorageShard>>;
}
