// src/engine/telemetry.rs

//! Execution telemetry: records, the sink collaborator and the batching
//! buffer owned by the command history.
//!
//! Delivery is best-effort. A batch is taken out of the buffer before it is
//! sent, so a failed send is logged and the batch is gone; it is never
//! retried and never fails the operation it describes.

use std::fmt::Debug;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::engine::command::{Command, CommandId, CommandKind, HistoryAction};
use crate::store::StoreFuture;

/// Outcome of one execute, undo or redo.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub command_id: CommandId,
    pub kind: CommandKind,
    pub action: HistoryAction,
    pub success: bool,
    pub duration: Duration,
    pub affected_tasks: usize,
    pub recorded_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl TelemetryRecord {
    pub fn for_command(
        command: &dyn Command,
        action: HistoryAction,
        duration: Duration,
        error: Option<String>,
    ) -> Self {
        Self {
            command_id: command.id(),
            kind: command.kind(),
            action,
            success: error.is_none(),
            duration,
            affected_tasks: command.affected_task_ids().len(),
            recorded_at: Utc::now(),
            error,
        }
    }
}

/// Best-effort destination for telemetry batches.
pub trait TelemetrySink: Send + Sync + Debug {
    fn record(&self, batch: Vec<TelemetryRecord>) -> StoreFuture<'_, ()>;
}

/// Default sink: one structured `info` event per record.
#[derive(Debug, Clone, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn record(&self, batch: Vec<TelemetryRecord>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            for r in batch {
                info!(
                    target: "autosched::telemetry",
                    command_id = %r.command_id,
                    kind = %r.kind,
                    action = %r.action,
                    success = r.success,
                    duration_ms = r.duration.as_secs_f64() * 1000.0,
                    affected_tasks = r.affected_tasks,
                    error = r.error.as_deref().unwrap_or(""),
                    "command telemetry"
                );
            }
            Ok(())
        })
    }
}

/// Client-side buffer flushed in fixed-size batches.
#[derive(Debug)]
pub struct TelemetryBuffer {
    sink: Arc<dyn TelemetrySink>,
    pending: Vec<TelemetryRecord>,
    batch_size: usize,
}

impl TelemetryBuffer {
    pub fn new(sink: Arc<dyn TelemetrySink>, batch_size: usize) -> Self {
        Self {
            sink,
            pending: Vec::new(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Buffer a record and send a batch once `batch_size` records are
    /// waiting.
    pub async fn push(&mut self, record: TelemetryRecord) {
        self.pending.push(record);
        if self.pending.len() >= self.batch_size {
            self.flush().await;
        }
    }

    /// Send everything buffered. Returns the number of records handed to the
    /// sink.
    pub async fn flush(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let batch = mem::take(&mut self.pending);
        let count = batch.len();
        debug!(count, "flushing telemetry batch");

        if let Err(err) = self.sink.record(batch).await {
            warn!(count, error = %err, "telemetry batch dropped after send failure");
        }
        count
    }
}
