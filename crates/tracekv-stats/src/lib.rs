//! Statistics fan-out.
//!
//! [`StatsDispatcher`] routes classified sub-events to one of three sinks:
//! alarms, outbound API calls and SQL statements. The bundled aggregators
//! ([`AlarmStats`], [`ApiStats`], [`SqlStats`], grouped in [`StatsHub`]) keep
//! counters in memory and expose serializable snapshots.

mod alarm;
mod api;
mod dispatcher;
mod hourly;
mod hub;
mod sink;
mod sql;
mod summary;

pub use alarm::{AlarmEntry, AlarmKindSnapshot, AlarmSnapshot, AlarmStats};
pub use api::{ApiEntry, ApiStats};
pub use dispatcher::{Dispatched, StatsDispatcher};
pub use hub::{StatsHub, StatsSnapshot};
pub use sink::{AlarmSink, ApiStatsSink, SqlStatsSink};
pub use sql::{SqlEntry, SqlStats};
pub use summary::CostSummary;
