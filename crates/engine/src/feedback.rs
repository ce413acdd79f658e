//! In-memory feedback buffer

use parking_lot::Mutex;

use geo_router_core::{FeedbackRecord, FeedbackSink};

/// Accumulates feedback until the engine drains it
///
/// When `capacity` is reached the oldest record is dropped.
#[derive(Debug)]
pub struct FeedbackBuffer {
    records: Mutex<Vec<FeedbackRecord>>,
    capacity: usize,
}

impl Default for FeedbackBuffer {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl FeedbackBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }
}

impl FeedbackSink for FeedbackBuffer {
    fn submit(&self, record: FeedbackRecord) {
        let mut records = self.records.lock();
        if records.len() >= self.capacity {
            records.remove(0);
            tracing::warn!(capacity = self.capacity, "Feedback buffer full, dropped oldest record");
        }
        records.push(record);
    }

    fn drain(&self) -> Vec<FeedbackRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    fn pending(&self) -> usize {
        self.records.lock().len()
    }
}
