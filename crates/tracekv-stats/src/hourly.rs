// Hour-bucketed keyed state
//
// Only the newest `retention_hours` hour buckets are kept. Creating a newer
// hour evicts the oldest, and samples for hours older than every retained
// hour are refused once the window is full.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
pub(crate) struct HourlyWindow<T> {
    retention_hours: usize,
    hours: BTreeMap<i64, HashMap<String, T>>,
}

impl<T: Default> HourlyWindow<T> {
    pub(crate) fn new(retention_hours: usize) -> Self {
        Self {
            retention_hours: retention_hours.max(1),
            hours: BTreeMap::new(),
        }
    }

    /// State for `key` within `hour_bucket`, `None` when the hour has
    /// already fallen out of the window.
    pub(crate) fn entry(&mut self, key: &str, hour_bucket: i64) -> Option<&mut T> {
        if !self.hours.contains_key(&hour_bucket) {
            let full = self.hours.len() >= self.retention_hours;
            if full
                && self
                    .hours
                    .keys()
                    .next()
                    .is_some_and(|oldest| hour_bucket < *oldest)
            {
                return None;
            }

            self.hours.insert(hour_bucket, HashMap::new());
            while self.hours.len() > self.retention_hours {
                self.hours.pop_first();
            }
        }

        let keys = self.hours.get_mut(&hour_bucket)?;
        Some(keys.entry(key.to_string()).or_default())
    }

    pub(crate) fn get(&self, key: &str, hour_bucket: i64) -> Option<&T> {
        self.hours.get(&hour_bucket)?.get(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, i64, &T)> {
        self.hours.iter().flat_map(|(hour, keys)| {
            keys.iter()
                .map(move |(key, state)| (key.as_str(), *hour, state))
        })
    }

    /// Retained hours, oldest first.
    pub(crate) fn hours(&self) -> Vec<i64> {
        self.hours.keys().copied().collect()
    }
}
