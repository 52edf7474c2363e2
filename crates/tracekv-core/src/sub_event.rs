use serde_json::{Map, Value};

use crate::json::{self, as_object, Object};
use crate::Rejected;

/// Kinds routed to the alarm sink.
pub const ALARM_KINDS: [i64; 3] = [5, 6, 7];
/// Kind carrying a performance sample.
pub const PERFORMANCE_KIND: i64 = 9;
/// Outbound HTTP call performance category.
pub const CATEGORY_CURL: &str = "curl";
/// SQL statement performance category.
pub const CATEGORY_MYSQL: &str = "mysql";

/// A classified entry of a record's `val` array.
#[derive(Debug, Clone, PartialEq)]
pub struct SubEvent {
    pub kind: i64,
    /// Source file that emitted the event (advisory).
    pub path: String,
    /// Source line that emitted the event (advisory).
    pub line: String,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw alarm detail, enriched with record context when dispatched.
    Alarm(Map<String, Value>),
    Api(ApiCall),
    Sql(SqlCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub url: String,
    pub http_code: String,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlCall {
    pub sql: String,
    pub cost: f64,
}

impl SubEvent {
    /// Classify a wire entry (`t`, `p`, `l`, `m`, `g`, `c`, `e`).
    pub fn parse(value: &Value) -> Result<Self, Rejected> {
        let obj = as_object(value)?;
        let kind = json::as_i64(json::required(obj, "t")?).ok_or(Rejected::WrongType("t"))?;

        let payload = match kind {
            k if ALARM_KINDS.contains(&k) => parse_alarm(obj)?,
            PERFORMANCE_KIND => parse_performance(obj)?,
            other => return Err(Rejected::UnsupportedKind(other)),
        };

        Ok(Self {
            kind,
            path: json::optional_string(obj, "p"),
            line: json::optional_string(obj, "l"),
            payload,
        })
    }

    pub fn is_alarm(&self) -> bool {
        matches!(self.payload, Payload::Alarm(_))
    }
}

/// Serialize an alarm detail with the trace context and source location
/// merged in. Existing keys of the same name are overwritten.
pub fn enrich_alarm(
    detail: &Map<String, Value>,
    trace_id: &str,
    rpc_id: &str,
    path: &str,
    line: &str,
) -> String {
    let mut detail = detail.clone();
    detail.insert("mytraceid".into(), Value::String(trace_id.to_string()));
    detail.insert("myrpcid".into(), Value::String(rpc_id.to_string()));
    detail.insert("filepath".into(), Value::String(path.to_string()));
    detail.insert("fileline".into(), Value::String(line.to_string()));
    Value::Object(detail).to_string()
}

fn parse_alarm(obj: &Object) -> Result<Payload, Rejected> {
    match json::required(obj, "m")? {
        Value::Object(detail) => Ok(Payload::Alarm(detail.clone())),
        _ => Err(Rejected::WrongType("m")),
    }
}

fn parse_performance(obj: &Object) -> Result<Payload, Rejected> {
    let category = json::required_string(obj, "g")?;
    // `e` must be present, its value is not used.
    json::required(obj, "e")?;
    let cost = json::required_f64(obj, "c")?;
    let message = parse_message(json::required(obj, "m")?)?;

    match category.as_str() {
        CATEGORY_CURL => parse_curl(&message, cost).map(Payload::Api),
        CATEGORY_MYSQL => parse_mysql(&message, cost).map(Payload::Sql),
        _ => Err(Rejected::UnsupportedCategory(category)),
    }
}

/// `m` is either an object or a string holding a JSON object.
fn parse_message(value: &Value) -> Result<Object, Rejected> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(Rejected::BadMessage),
        },
        _ => Err(Rejected::BadMessage),
    }
}

fn parse_curl(message: &Object, cost: f64) -> Result<ApiCall, Rejected> {
    let url = json::required_string(message, "url")?;
    let info = match json::required(message, "info")? {
        Value::Object(info) => info,
        _ => return Err(Rejected::WrongType("info")),
    };
    let http_code = json::required_string(info, "http_code")?;

    Ok(ApiCall {
        url,
        http_code,
        cost,
    })
}

fn parse_mysql(message: &Object, cost: f64) -> Result<SqlCall, Rejected> {
    let sql = json::required_string(message, "sql")?;
    Ok(SqlCall { sql, cost })
}
