//! Typed model of a bizlog trace batch.
//!
//! Producers submit a [`Batch`]: a JSON array of records, each describing one
//! traced RPC (`key`, `rpcid`, `timestamp`, `val`). Records and the
//! sub-events nested inside them are parsed lazily by the drain loop, and
//! every parse returns either a typed value or a [`Rejected`] drop decision.
//! Nothing in this crate performs I/O.

mod batch;
mod json;
mod record;
mod rejected;
mod sub_event;
pub mod time;

pub use batch::{Batch, BatchParseError};
pub use record::Record;
pub use rejected::Rejected;
pub use sub_event::{
    enrich_alarm, ApiCall, Payload, SqlCall, SubEvent, ALARM_KINDS, CATEGORY_CURL,
    CATEGORY_MYSQL, PERFORMANCE_KIND,
};
pub use time::{CalendarBucketer, ShardKey, TimeBucketer};
