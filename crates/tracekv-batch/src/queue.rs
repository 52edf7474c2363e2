use std::collections::VecDeque;

use parking_lot::Mutex;
use tracekv_core::Batch;

/// Unbounded FIFO of pending batches.
///
/// Safe for any number of concurrent producers alongside the single
/// consumer. The lock is only held for a push or a pop.
#[derive(Debug, Default)]
pub struct IntakeQueue {
    inner: Mutex<VecDeque<Batch>>,
}

impl IntakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch to the tail. An absent batch is ignored.
    pub fn submit(&self, batch: Option<Batch>) {
        if let Some(batch) = batch {
            self.inner.lock().push_back(batch);
        }
    }

    /// Current depth.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub(crate) fn pop(&self) -> Option<Batch> {
        self.inner.lock().pop_front()
    }
}
