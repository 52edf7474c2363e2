use parking_lot::Mutex;
use serde::Serialize;

use crate::hourly::HourlyWindow;
use crate::{CostSummary, SqlStatsSink};

/// Aggregate for one SQL statement within one hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlEntry {
    pub sql: String,
    pub hour_bucket: i64,
    #[serde(flatten)]
    pub cost: CostSummary,
}

/// Per-statement, per-hour latency counters over the newest
/// `retention_hours` hours.
#[derive(Debug)]
pub struct SqlStats {
    entries: Mutex<HourlyWindow<CostSummary>>,
}

impl SqlStats {
    pub fn new(retention_hours: usize) -> Self {
        Self {
            entries: Mutex::new(HourlyWindow::new(retention_hours)),
        }
    }

    pub fn get(&self, sql: &str, hour_bucket: i64) -> Option<CostSummary> {
        self.entries.lock().get(sql, hour_bucket).copied()
    }

    /// Hours currently held, oldest first.
    pub fn hours(&self) -> Vec<i64> {
        self.entries.lock().hours()
    }

    /// Slowest statements (by total cost) first, then newest hour.
    pub fn snapshot(&self) -> Vec<SqlEntry> {
        let entries = self.entries.lock();
        let mut out: Vec<SqlEntry> = entries
            .iter()
            .map(|(sql, hour, cost)| SqlEntry {
                sql: sql.to_string(),
                hour_bucket: hour,
                cost: *cost,
            })
            .collect();
        out.sort_by(|a, b| {
            b.cost
                .total_cost
                .total_cmp(&a.cost.total_cost)
                .then(b.hour_bucket.cmp(&a.hour_bucket))
                .then_with(|| a.sql.cmp(&b.sql))
        });
        out
    }
}

impl SqlStatsSink for SqlStats {
    fn record_sql(&self, sql: &str, hour_bucket: i64, cost: f64) {
        if let Some(summary) = self.entries.lock().entry(sql, hour_bucket) {
            summary.observe(cost);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregates_per_statement() {
        let stats = SqlStats::new(24);
        stats.record_sql("select 1", 7, 2.0);
        stats.record_sql("select 1", 7, 4.0);
        stats.record_sql("select 2", 7, 100.0);

        let summary = stats.get("select 1", 7).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean(), 3.0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot[0].sql, "select 2");
        assert_eq!(snapshot[1].cost.total_cost, 6.0);
    }

    #[test]
    fn test_snapshot_serializes_flat() {
        let stats = SqlStats::new(24);
        stats.record_sql("select 1", 2023111422, 1.5);
        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json[0]["sql"], "select 1");
        assert_eq!(json[0]["count"], 1);
        assert_eq!(json[0]["max_cost"], 1.5);
    }

    #[test]
    fn test_old_hours_are_evicted() {
        let stats = SqlStats::new(3);
        for hour in 2023111400..2023111410 {
            stats.record_sql("select 1", hour, 1.0);
        }

        assert_eq!(stats.hours(), vec![2023111407, 2023111408, 2023111409]);
        assert_eq!(stats.snapshot().len(), 3);
        assert!(stats.get("select 1", 2023111406).is_none());
        assert_eq!(stats.get("select 1", 2023111409).unwrap().count, 1);
    }
}
