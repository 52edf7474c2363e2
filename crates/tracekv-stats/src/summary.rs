use serde::Serialize;

/// Running count / total / max of a cost series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostSummary {
    pub count: u64,
    pub total_cost: f64,
    pub max_cost: f64,
}

impl CostSummary {
    pub fn observe(&mut self, cost: f64) {
        self.count += 1;
        self.total_cost += cost;
        if self.count == 1 || cost > self.max_cost {
            self.max_cost = cost;
        }
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_cost / self.count as f64
        }
    }
}
