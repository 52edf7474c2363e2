use std::collections::{BTreeMap, HashMap, VecDeque};

use parking_lot::Mutex;
use serde::Serialize;

use crate::AlarmSink;

/// One retained alarm message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmEntry {
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlarmKindSnapshot {
    pub count: u64,
    /// Newest first.
    pub recent: Vec<AlarmEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlarmSnapshot {
    pub kinds: BTreeMap<i64, AlarmKindSnapshot>,
}

#[derive(Debug, Default)]
struct KindState {
    count: u64,
    recent: VecDeque<AlarmEntry>,
}

/// Counts alarms per kind and keeps the latest messages of each.
#[derive(Debug)]
pub struct AlarmStats {
    recent_limit: usize,
    kinds: Mutex<HashMap<i64, KindState>>,
}

impl AlarmStats {
    pub fn new(recent_limit: usize) -> Self {
        Self {
            recent_limit,
            kinds: Mutex::new(HashMap::new()),
        }
    }

    pub fn count(&self, kind: i64) -> u64 {
        self.kinds.lock().get(&kind).map_or(0, |state| state.count)
    }

    pub fn snapshot(&self) -> AlarmSnapshot {
        let kinds = self.kinds.lock();
        AlarmSnapshot {
            kinds: kinds
                .iter()
                .map(|(kind, state)| {
                    let snapshot = AlarmKindSnapshot {
                        count: state.count,
                        recent: state.recent.iter().rev().cloned().collect(),
                    };
                    (*kind, snapshot)
                })
                .collect(),
        }
    }
}

impl AlarmSink for AlarmStats {
    fn record_alarm(&self, kind: i64, message: &str, timestamp: i64) {
        let mut kinds = self.kinds.lock();
        let state = kinds.entry(kind).or_default();
        state.count += 1;

        if self.recent_limit == 0 {
            return;
        }
        if state.recent.len() == self.recent_limit {
            state.recent.pop_front();
        }
        state.recent.push_back(AlarmEntry {
            timestamp,
            message: message.to_string(),
        });
    }
}
