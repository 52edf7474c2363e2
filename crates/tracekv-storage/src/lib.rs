//! Storage routing for trace records.
//!
//! A record is persisted as a pair of writes against the shard owning its
//! timestamp: the batch JSON under `{traceId}_{rpcId}` and the rpc id merged
//! into `{traceId}_index`. The shard engine is abstracted behind
//! [`ShardResolver`] / [`StorageShard`]; [`MemoryStore`] is the bundled
//! implementation.

mod error;
mod memory;
mod router;
mod shard;

pub use error::{Result, StorageError};
pub use memory::{MemoryShard, MemoryStore};
pub use router::StorageRouter;
pub use shard::{ShardResolver, StorageShard};
