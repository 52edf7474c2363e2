use serde_json::Value;

use crate::json::{self, as_object};
use crate::{Rejected, SubEvent};

/// One traced operation inside a [`Batch`](crate::Batch).
///
/// Sub-events are borrowed from the batch and parsed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<'a> {
    pub trace_id: String,
    pub rpc_id: String,
    /// Epoch seconds.
    pub timestamp: i64,
    sub_events: &'a [Value],
}

impl<'a> Record<'a> {
    /// Validate the required fields of a wire entry.
    ///
    /// `key`, `rpcid` and `timestamp` must be present and non-empty, and the
    /// timestamp must be an integer. A missing or non-array `val` is treated as
    /// a record without sub-events.
    pub fn parse(entry: &'a Value) -> Result<Self, Rejected> {
        let obj = as_object(entry)?;
        let trace_id = json::non_empty_string(obj, "key")?;
        let rpc_id = json::non_empty_string(obj, "rpcid")?;
        let raw_timestamp = json::non_empty_string(obj, "timestamp")?;
        let timestamp = raw_timestamp
            .trim()
            .parse::<i64>()
            .map_err(|_| Rejected::BadTimestamp(raw_timestamp.clone()))?;

        let sub_events = match obj.get("val") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };

        Ok(Self {
            trace_id,
            rpc_id,
            timestamp,
            sub_events,
        })
    }

    pub fn sub_event_count(&self) -> usize {
        self.sub_events.len()
    }

    pub fn sub_events(&self) -> impl Iterator<Item = Result<SubEvent, Rejected>> + 'a {
        let items: &'a [Value] = self.sub_events;
        items.iter().map(SubEvent::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_record() {
        let entry = json!({
            "key": "t1",
            "rpcid": "0.1",
            "timestamp": "1700000000",
            "val": [{"t": 1}, {"t": 2}]
        });
        let record = Record::parse(&entry).unwrap();
        assert_eq!(record.trace_id, "t1");
        assert_eq!(record.rpc_id, "0.1");
        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(record.sub_event_count(), 2);
    }

    #[test]
    fn test_numeric_fields_are_accepted() {
        let entry = json!({"key": "t1", "rpcid": 1, "timestamp": 1700000000});
        let record = Record::parse(&entry).unwrap();
        assert_eq!(record.rpc_id, "1");
        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(record.sub_event_count(), 0);
    }

    #[test]
    fn test_empty_required_fields_are_rejected() {
        let entry = json!({"key": "", "rpcid": "r1", "timestamp": "1"});
        assert_eq!(Record::parse(&entry), Err(Rejected::Empty("key")));

        let entry = json!({"key": "t1", "rpcid": "", "timestamp": "1"});
        assert_eq!(Record::parse(&entry), Err(Rejected::Empty("rpcid")));

        let entry = json!({"key": "t1", "rpcid": "r1", "timestamp": ""});
        assert_eq!(Record::parse(&entry), Err(Rejected::Empty("timestamp")));
    }

    #[test]
    fn test_missing_and_null_fields_are_rejected() {
        let entry = json!({"rpcid": "r1", "timestamp": "1"});
        assert_eq!(Record::parse(&entry), Err(Rejected::Missing("key")));

        let entry = json!({"key": "t1", "rpcid": null, "timestamp": "1"});
        assert_eq!(Record::parse(&entry), Err(Rejected::Null("rpcid")));

        let entry = json!({"key": ["t1"], "rpcid": "r1", "timestamp": "1"});
        assert_eq!(Record::parse(&entry), Err(Rejected::WrongType("key")));
    }

    #[test]
    fn test_unparseable_timestamp_is_rejected() {
        let entry = json!({"key": "t1", "rpcid": "r1", "timestamp": "yesterday"});
        assert_eq!(
            Record::parse(&entry),
            Err(Rejected::BadTimestamp("yesterday".into()))
        );

        let entry = json!({"key": "t1", "rpcid": "r1", "timestamp": 1.5});
        assert_eq!(
            Record::parse(&entry),
            Err(Rejected::BadTimestamp("1.5".into()))
        );
    }

    #[test]
    fn test_non_array_val_means_no_sub_events() {
        let entry = json!({"key": "t1", "rpcid": "r1", "timestamp": "1", "val": "oops"});
        let record = Record::parse(&entry).unwrap();
        assert_eq!(record.sub_events().count(), 0);
    }
}
