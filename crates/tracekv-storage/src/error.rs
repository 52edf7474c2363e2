//! Error types for the storage crate

use thiserror::Error;
use tracekv_core::ShardKey;

/// Errors returned by shard resolution and shard writes
#[derive(Debug, Error)]
pub enum StorageError {
    /// No shard could be opened for the timestamp
    #[error("no shard available for timestamp {timestamp}: {reason}")]
    ShardUnavailable { timestamp: i64, reason: String },

    /// The timestamp belongs to a day older than the retained shards
    #[error("shard {shard} is outside the {retention_days}-day retention window")]
    ShardExpired {
        shard: ShardKey,
        retention_days: usize,
    },

    /// A put or merge was refused by the shard
    #[error("{op} of `{key}` failed: {reason}")]
    Write {
        op: &'static str,
        key: String,
        reason: String,
    },
}

impl StorageError {
    pub fn write(op: &'static str, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Write {
            op,
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for StorageError
pub type Result<T> = std::result::Result<T, StorageError>;
