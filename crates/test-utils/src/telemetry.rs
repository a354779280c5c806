//! Telemetry sink that keeps every batch for assertions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::bail;
use autosched::engine::{TelemetryRecord, TelemetrySink};
use autosched::store::StoreFuture;

#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetrySink {
    batches: Arc<Mutex<Vec<Vec<TelemetryRecord>>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `record` call fail (after capturing the batch).
    pub fn fail_sends(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<Vec<TelemetryRecord>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches().iter().map(Vec::len).collect()
    }

    /// All records received so far, flattened in arrival order.
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.batches().into_iter().flatten().collect()
    }
}

impl TelemetrySink for RecordingTelemetrySink {
    fn record(&self, batch: Vec<TelemetryRecord>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.batches.lock().unwrap().push(batch);
            if self.failing.load(Ordering::SeqCst) {
                bail!("telemetry endpoint unavailable");
            }
            Ok(())
        })
    }
}
