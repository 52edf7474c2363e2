// Aggregation sinks fed by the dispatcher. Calls are fire-and-forget: sinks
// handle their own failures and must not block for long, since they run on
// the drain loop.

/// Receives alarm-class sub-events (kinds 5, 6, 7).
pub trait AlarmSink: Send + Sync {
    fn record_alarm(&self, kind: i64, message: &str, timestamp: i64);
}

/// Receives `curl` performance samples.
pub trait ApiStatsSink: Send + Sync {
    fn record_api_call(&self, url: &str, hour_bucket: i64, cost: f64, http_code: &str);
}

/// Receives `mysql` performance samples.
pub trait SqlStatsSink: Send + Sync {
    fn record_sql(&self, sql: &str, hour_bucket: i64, cost: f64);
}
