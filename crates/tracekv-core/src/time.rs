//! Calendar bucketing of record timestamps.
//!
//! Storage is sharded per day and statistics are aggregated per hour. Both
//! buckets are plain integers in `YYYYMMDD` / `YYYYMMDDHH` form so they sort
//! chronologically and read well in dashboards.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use serde::Serialize;

/// Maps epoch-second timestamps to storage shards and statistics hours.
pub trait TimeBucketer: Send + Sync {
    /// Hour-granularity bucket, `YYYYMMDDHH`.
    fn hour_bucket(&self, timestamp: i64) -> i64;

    /// Day shard owning the timestamp.
    fn shard_key(&self, timestamp: i64) -> ShardKey;
}

/// Day identifier, `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ShardKey(u32);

impl ShardKey {
    /// Key used when a timestamp cannot be mapped to a calendar day.
    pub const UNKNOWN: ShardKey = ShardKey(0);

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Self {
        let year = year.clamp(0, 9999) as u32;
        Self(year * 10_000 + month * 100 + day)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

/// [`TimeBucketer`] over a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct CalendarBucketer {
    offset: FixedOffset,
}

impl CalendarBucketer {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// `None` when the offset is outside ±24h.
    pub fn with_offset_secs(offset_secs: i32) -> Option<Self> {
        FixedOffset::east_opt(offset_secs).map(|offset| Self { offset })
    }

    fn local(&self, timestamp: i64) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(&self.offset))
    }
}

impl Default for CalendarBucketer {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeBucketer for CalendarBucketer {
    fn hour_bucket(&self, timestamp: i64) -> i64 {
        match self.local(timestamp) {
            Some(dt) => {
                i64::from(dt.year()) * 1_000_000
                    + i64::from(dt.month()) * 10_000
                    + i64::from(dt.day()) * 100
                    + i64::from(dt.hour())
            }
            None => 0,
        }
    }

    fn shard_key(&self, timestamp: i64) -> ShardKey {
        match self.local(timestamp) {
            Some(dt) => ShardKey::from_ymd(dt.year(), dt.month(), dt.day()),
            None => ShardKey::UNKNOWN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-11-14 22:13:20 UTC
    const TS: i64 = 1_700_000_000;

    #[test]
    fn test_utc_buckets() {
        let bucketer = CalendarBucketer::utc();
        assert_eq!(bucketer.hour_bucket(TS), 2023111422);
        assert_eq!(bucketer.shard_key(TS), ShardKey::from_ymd(2023, 11, 14));
        assert_eq!(bucketer.shard_key(TS).to_string(), "20231114");
    }

    #[test]
    fn test_offset_moves_day_boundary() {
        let bucketer = CalendarBucketer::with_offset_secs(8 * 3600).unwrap();
        assert_eq!(bucketer.hour_bucket(TS), 2023111506);
        assert_eq!(bucketer.shard_key(TS).as_u32(), 20231115);
    }

    #[test]
    fn test_invalid_offset() {
        assert!(CalendarBucketer::with_offset_secs(90_000).is_none());
    }

    #[test]
    fn test_out_of_range_timestamp() {
        let bucketer = CalendarBucketer::default();
        assert_eq!(bucketer.hour_bucket(i64::MAX), 0);
        assert_eq!(bucketer.shard_key(i64::MAX), ShardKey::UNKNOWN);
        assert_eq!(ShardKey::UNKNOWN.to_string(), "00000000");
    }

    #[test]
    fn test_shard_keys_sort_chronologically() {
        let bucketer = CalendarBucketer::utc();
        let earlier = bucketer.shard_key(TS - 86_400 * 40);
        let later = bucketer.shard_key(TS);
        assert!(earlier < later);
    }
}
