use serde_json::Value;
use thiserror::Error;

use crate::{Record, Rejected};

/// Errors raised when a request body cannot become a [`Batch`] at all.
#[derive(Debug, Error)]
pub enum BatchParseError {
    #[error("invalid batch JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("batch must be a JSON array, got {0}")]
    NotAnArray(&'static str),
}

/// One producer submission: an ordered list of raw record entries.
///
/// Entries stay untyped until the drain loop walks them with
/// [`Batch::records`], so one malformed entry never invalidates its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Always a `Value::Array`.
    raw: Value,
}

impl Batch {
    pub fn new(entries: Vec<Value>) -> Self {
        Self {
            raw: Value::Array(entries),
        }
    }

    /// Parse a wire body. JSON `null` is an absent batch and yields `None`.
    pub fn from_json(body: &[u8]) -> Result<Option<Self>, BatchParseError> {
        match serde_json::from_slice::<Value>(body)? {
            Value::Null => Ok(None),
            raw @ Value::Array(_) => Ok(Some(Self { raw })),
            other => Err(BatchParseError::NotAnArray(type_name(&other))),
        }
    }

    pub fn entries(&self) -> &[Value] {
        match &self.raw {
            Value::Array(entries) => entries,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Compact JSON of the whole batch, the value persisted under every
    /// record key of this batch.
    pub fn to_json(&self) -> String {
        self.raw.to_string()
    }

    /// Parse each entry in order.
    pub fn records(&self) -> impl Iterator<Item = Result<Record<'_>, Rejected>> {
        self.entries().iter().map(Record::parse)
    }
}

impl From<Vec<Value>> for Batch {
    fn from(entries: Vec<Value>) -> Self {
        Self::new(entries)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
