use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::Serialize;

use crate::hourly::HourlyWindow;
use crate::{ApiStatsSink, CostSummary};

/// Aggregate for one URL within one hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiEntry {
    pub url: String,
    pub hour_bucket: i64,
    #[serde(flatten)]
    pub cost: CostSummary,
    pub http_codes: BTreeMap<String, u64>,
}

#[derive(Debug, Default)]
struct ApiState {
    cost: CostSummary,
    http_codes: BTreeMap<String, u64>,
}

/// Per-URL, per-hour latency and status code counters over the newest
/// `retention_hours` hours.
#[derive(Debug)]
pub struct ApiStats {
    entries: Mutex<HourlyWindow<ApiState>>,
}

impl ApiStats {
    pub fn new(retention_hours: usize) -> Self {
        Self {
            entries: Mutex::new(HourlyWindow::new(retention_hours)),
        }
    }

    pub fn get(&self, url: &str, hour_bucket: i64) -> Option<ApiEntry> {
        let entries = self.entries.lock();
        entries
            .get(url, hour_bucket)
            .map(|state| to_entry(url, hour_bucket, state))
    }

    /// Hours currently held, oldest first.
    pub fn hours(&self) -> Vec<i64> {
        self.entries.lock().hours()
    }

    /// Newest hour first, busiest URL first within an hour.
    pub fn snapshot(&self) -> Vec<ApiEntry> {
        let entries = self.entries.lock();
        let mut out: Vec<ApiEntry> = entries
            .iter()
            .map(|(url, hour, state)| to_entry(url, hour, state))
            .collect();
        out.sort_by(|a, b| {
            b.hour_bucket
                .cmp(&a.hour_bucket)
                .then(b.cost.count.cmp(&a.cost.count))
                .then_with(|| a.url.cmp(&b.url))
        });
        out
    }
}

fn to_entry(url: &str, hour_bucket: i64, state: &ApiState) -> ApiEntry {
    ApiEntry {
        url: url.to_string(),
        hour_bucket,
        cost: state.cost,
        http_codes: state.http_codes.clone(),
    }
}

impl ApiStatsSink for ApiStats {
    fn record_api_call(&self, url: &str, hour_bucket: i64, cost: f64, http_code: &str) {
        let mut entries = self.entries.lock();
        let Some(state) = entries.entry(url, hour_bucket) else {
            return;
        };
        state.cost.observe(cost);
        *state.http_codes.entry(http_code.to_string()).or_insert(0) += 1;
    }
}
