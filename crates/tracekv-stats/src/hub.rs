use serde::Serialize;

use crate::{
    AlarmSink, AlarmSnapshot, AlarmStats, ApiEntry, ApiStats, ApiStatsSink, SqlEntry, SqlStats,
    SqlStatsSink,
};

/// Point-in-time view of every aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub alarms: AlarmSnapshot,
    pub api: Vec<ApiEntry>,
    pub sql: Vec<SqlEntry>,
}

/// The bundled aggregators behind one handle, usable as all three sinks.
#[derive(Debug)]
pub struct StatsHub {
    alarms: AlarmStats,
    api: ApiStats,
    sql: SqlStats,
}

impl StatsHub {
    /// `recent_alarms` messages are kept per alarm kind; API and SQL
    /// counters cover the newest `retention_hours` hour buckets.
    pub fn new(recent_alarms: usize, retention_hours: usize) -> Self {
        Self {
            alarms: AlarmStats::new(recent_alarms),
            api: ApiStats::new(retention_hours),
            sql: SqlStats::new(retention_hours),
        }
    }

    pub fn alarms(&self) -> &AlarmStats {
        &self.alarms
    }

    pub fn api(&self) -> &ApiStats {
        &self.api
    }

    pub fn sql(&self) -> &SqlStats {
        &self.sql
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            alarms: self.alarms.snapshot(),
            api: self.api.snapshot(),
            sql: self.sql.snapshot(),
        }
    }
}

impl AlarmSink for StatsHub {
    fn record_alarm(&self, kind: i64, message: &str, timestamp: i64) {
        self.alarms.record_alarm(kind, message, timestamp);
    }
}

impl ApiStatsSink for StatsHub {
    fn record_api_call(&self, url: &str, hour_bucket: i64, cost: f64, http_code: &str) {
        self.api.record_api_call(url, hour_bucket, cost, http_code);
    }
}

impl SqlStatsSink for StatsHub {
    fn record_sql(&self, sql: &str, hour_bucket: i64, cost: f64) {
        self.sql.record_sql(sql, hour_bucket, cost);
    }
}
