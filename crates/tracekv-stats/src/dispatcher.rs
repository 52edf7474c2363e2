use std::sync::Arc;

use tracekv_core::{enrich_alarm, Payload, Record, SubEvent};

use crate::{AlarmSink, ApiStatsSink, SqlStatsSink, StatsHub};

/// Which sink received a sub-event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Alarm,
    ApiCall,
    Sql,
}

impl Dispatched {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dispatched::Alarm => "alarm",
            Dispatched::ApiCall => "api",
            Dispatched::Sql => "sql",
        }
    }
}

/// Stateless router from classified sub-events to aggregation sinks.
#[derive(Clone)]
pub struct StatsDispatcher {
    alarms: Arc<dyn AlarmSink>,
    api: Arc<dyn ApiStatsSink>,
    sql: Arc<dyn SqlStatsSink>,
}

impl StatsDispatcher {
    pub fn new(
        alarms: Arc<dyn AlarmSink>,
        api: Arc<dyn ApiStatsSink>,
        sql: Arc<dyn SqlStatsSink>,
    ) -> Self {
        Self { alarms, api, sql }
    }

    /// Route every sub-event kind to the bundled in-memory aggregators.
    pub fn from_hub(hub: Arc<StatsHub>) -> Self {
        Self {
            alarms: hub.clone(),
            api: hub.clone(),
            sql: hub,
        }
    }

    /// Forward one sub-event of `record`.
    ///
    /// `hour_bucket` is the caller's bucketing of the record timestamp and is
    /// passed through to the performance sinks untouched.
    pub fn dispatch(&self, record: &Record<'_>, hour_bucket: i64, event: &SubEvent) -> Dispatched {
        match &event.payload {
            Payload::Alarm(detail) => {
                let message = enrich_alarm(
                    detail,
                    &record.trace_id,
                    &record.rpc_id,
                    &event.path,
                    &event.line,
                );
                self.alarms
                    .record_alarm(event.kind, &message, record.timestamp);
                Dispatched::Alarm
            }
            Payload::Api(call) => {
                self.api
                    .record_api_call(&call.url, hour_bucket, call.cost, &call.http_code);
                Dispatched::ApiCall
            }
            Payload::Sql(call) => {
                self.sql.record_sql(&call.sql, hour_bucket, call.cost);
                Dispatched::Sql
            }
        }
    }
}
