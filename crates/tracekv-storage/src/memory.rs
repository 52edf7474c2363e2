// In-memory day-sharded store
//
// One shard per calendar day, newest `retention_days` kept. Merge appends
// with a delimiter, the way a string-append merge operator would.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracekv_core::{ShardKey, TimeBucketer};
use tracing::info;

use crate::{Result, ShardResolver, StorageError, StorageShard};

/// One day of key/value data.
#[derive(Debug)]
pub struct MemoryShard {
    key: ShardKey,
    delimiter: String,
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryShard {
    pub fn new(key: ShardKey, delimiter: impl Into<String>) -> Self {
        Self {
            key,
            delimiter: delimiter.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn key(&self) -> ShardKey {
        self.key
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StorageShard for MemoryShard {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn merge(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(existing) => {
                existing.push_str(&self.delimiter);
                existing.push_str(value);
            }
            None => {
                entries.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }
}

/// [`ShardResolver`] keeping day shards in memory.
pub struct MemoryStore {
    bucketer: Arc<dyn TimeBucketer>,
    retention_days: usize,
    delimiter: String,
    shards: RwLock<BTreeMap<ShardKey, Arc<MemoryShard>>>,
}

impl MemoryStore {
    pub fn new(
        bucketer: Arc<dyn TimeBucketer>,
        retention_days: usize,
        delimiter: impl Into<String>,
    ) -> Self {
        Self {
            bucketer,
            retention_days: retention_days.max(1),
            delimiter: delimiter.into(),
            shards: RwLock::new(BTreeMap::new()),
        }
    }

    /// Live shards, oldest first.
    pub fn shard_keys(&self) -> Vec<ShardKey> {
        self.shards.read().keys().copied().collect()
    }

    pub fn get_shard(&self, key: ShardKey) -> Option<Arc<MemoryShard>> {
        self.shards.read().get(&key).cloned()
    }

    /// Shard that would hold `timestamp`, if it is open.
    pub fn shard_for(&self, timestamp: i64) -> Option<Arc<MemoryShard>> {
        self.get_shard(self.bucketer.shard_key(timestamp))
    }

    fn open(&self, key: ShardKey) -> Result<Arc<MemoryShard>> {
        let mut shards = self.shards.write();
        if let Some(shard) = shards.get(&key) {
            return Ok(shard.clone());
        }

        let full = shards.len() >= self.retention_days;
        if full && shards.keys().next().is_some_and(|oldest| key < *oldest) {
            return Err(StorageError::ShardExpired {
                shard: key,
                retention_days: self.retention_days,
            });
        }

        let shard = Arc::new(MemoryShard::new(key, self.delimiter.clone()));
        shards.insert(key, shard.clone());
        info!(shard = %key, "Opened storage shard");

        while shards.len() > self.retention_days {
            if let Some((evicted, _)) = shards.pop_first() {
                info!(shard = %evicted, "Evicted storage shard past retention");
            }
        }

        Ok(shard)
    }
}

impl ShardResolver for MemoryStore {
    fn shard(&self, timestamp: i64) -> Result<Arc<dyn StorageShard>> {
        let key = self.bucketer.shard_key(timestamp);
        let existing = self.shards.read().get(&key).cloned();
        let shard: Arc<dyn StorageShard> = match existing {
            Some(shard) => shard,
            None => self.open(key)?,
        };
        Ok(shard)
    }
}
