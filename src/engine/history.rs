// src/engine/history.rs

//! Bounded linear undo/redo history.
//!
//! The history holds commands in execution order plus a cursor. Entries
//! `[0, applied)` are executed and can be undone, newest first; entries
//! `[applied, len)` have been undone and can be redone, oldest first.
//! Executing a new command discards everything after the cursor.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engine::command::{Command, CommandId, CommandKind, CommandState, HistoryAction};
use crate::engine::telemetry::{TelemetryBuffer, TelemetryRecord};
use crate::errors::{AutoschedError, Result};

/// Summary of one history entry for UI affordances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: CommandId,
    pub kind: CommandKind,
    pub description: String,
    pub state: CommandState,
}

/// Operation currently running on the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Busy {
    Executing,
    Undoing,
    Redoing,
}

/// Clears the busy flag when the operation finishes or its future is
/// dropped.
struct BusyGuard<'a> {
    slot: &'a mut Option<Busy>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(slot: &'a mut Option<Busy>, op: Busy) -> Option<Self> {
        if slot.is_some() {
            return None;
        }
        *slot = Some(op);
        Some(Self { slot })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.slot = None;
    }
}

#[derive(Debug)]
pub struct CommandHistory {
    entries: Vec<Box<dyn Command>>,
    /// Number of entries currently applied; the cursor is `applied - 1`.
    applied: usize,
    max_size: usize,
    busy: Option<Busy>,
    telemetry: TelemetryBuffer,
}

impl CommandHistory {
    pub fn new(max_size: usize, telemetry: TelemetryBuffer) -> Self {
        Self {
            entries: Vec::new(),
            applied: 0,
            max_size: max_size.max(1),
            busy: None,
            telemetry,
        }
    }

    /// Validate and execute `command`, then record it.
    ///
    /// Redo-able entries after the cursor are discarded and the oldest
    /// entries are evicted once the history exceeds its maximum size. A
    /// command that fails validation or execution is not recorded.
    pub async fn execute_command(&mut self, mut command: Box<dyn Command>) -> Result<CommandId> {
        let id = command.id();
        let Some(_guard) = BusyGuard::acquire(&mut self.busy, Busy::Executing) else {
            return Err(AutoschedError::HistoryBusy(format!(
                "cannot execute {id} while another history operation is running"
            )));
        };

        let started = Instant::now();
        let outcome = match command.validate() {
            Ok(()) => command.execute().await,
            Err(err) => Err(err),
        };

        let error = outcome.as_ref().err().map(ToString::to_string);
        let record = TelemetryRecord::for_command(
            command.as_ref(),
            HistoryAction::Execute,
            started.elapsed(),
            error,
        );
        self.telemetry.push(record).await;

        if let Err(err) = outcome {
            warn!(command_id = %id, error = %err, "command failed; not recorded in history");
            return Err(err);
        }

        let discarded = self.entries.len() - self.applied;
        if discarded > 0 {
            debug!(discarded, "discarding redo entries");
            self.entries.truncate(self.applied);
        }

        info!(command_id = %id, description = %command.description(), "command executed");
        self.entries.push(command);
        self.applied = self.entries.len();
        enforce_max_size(&mut self.entries, &mut self.applied, self.max_size);

        Ok(id)
    }

    /// Undo the command at the cursor.
    ///
    /// Returns `Ok(false)` without doing anything when the history is empty,
    /// busy, or the command cannot be undone. A collaborator failure is
    /// returned as an error and leaves the cursor where it was.
    pub async fn undo(&mut self) -> Result<bool> {
        if self.applied == 0 || !self.entries[self.applied - 1].can_undo() {
            return Ok(false);
        }
        let Some(_guard) = BusyGuard::acquire(&mut self.busy, Busy::Undoing) else {
            return Ok(false);
        };

        let index = self.applied - 1;
        let command = &mut self.entries[index];
        let started = Instant::now();
        let outcome = command.undo().await;

        let error = outcome.as_ref().err().map(ToString::to_string);
        let record = TelemetryRecord::for_command(
            command.as_ref(),
            HistoryAction::Undo,
            started.elapsed(),
            error,
        );
        let id = command.id();
        self.telemetry.push(record).await;

        outcome?;
        self.applied = index;
        info!(command_id = %id, "command undone");
        Ok(true)
    }

    /// Redo the command just after the cursor. Mirrors [`Self::undo`].
    pub async fn redo(&mut self) -> Result<bool> {
        if self.applied >= self.entries.len() || !self.entries[self.applied].can_redo() {
            return Ok(false);
        }
        let Some(_guard) = BusyGuard::acquire(&mut self.busy, Busy::Redoing) else {
            return Ok(false);
        };

        let index = self.applied;
        let command = &mut self.entries[index];
        let started = Instant::now();
        let outcome = command.redo().await;

        let error = outcome.as_ref().err().map(ToString::to_string);
        let record = TelemetryRecord::for_command(
            command.as_ref(),
            HistoryAction::Redo,
            started.elapsed(),
            error,
        );
        let id = command.id();
        self.telemetry.push(record).await;

        outcome?;
        self.applied = index + 1;
        info!(command_id = %id, "command redone");
        Ok(true)
    }

    /// Flush telemetry, then drop every entry.
    pub async fn clear_history(&mut self) {
        self.telemetry.flush().await;
        self.entries.clear();
        self.applied = 0;
        info!("command history cleared");
    }

    /// Send any buffered telemetry.
    pub async fn flush_telemetry(&mut self) -> usize {
        self.telemetry.flush().await
    }

    /// Periodic memory cleanup.
    ///
    /// Re-applies the size bound, then prunes entries that no sequence of
    /// undo/redo calls can reach from the cursor: everything at or below the
    /// newest applied entry that cannot be undone, and everything from the
    /// oldest undone entry that cannot be redone. Returns the number of
    /// entries removed.
    pub fn cleanup(&mut self) -> usize {
        let before = self.entries.len();
        enforce_max_size(&mut self.entries, &mut self.applied, self.max_size);

        if let Some(last) = self.entries[..self.applied]
            .iter()
            .rposition(|c| !c.can_undo())
        {
            self.entries.drain(..=last);
            self.applied -= last + 1;
        }

        if let Some(offset) = self.entries[self.applied..]
            .iter()
            .position(|c| !c.can_redo())
        {
            self.entries.truncate(self.applied + offset);
        }

        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "pruned unreachable history entries");
        }
        removed
    }

    pub fn can_undo(&self) -> bool {
        self.busy.is_none() && self.applied > 0 && self.entries[self.applied - 1].can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.busy.is_none()
            && self
                .entries
                .get(self.applied)
                .is_some_and(|c| c.can_redo())
    }

    pub fn history_count(&self) -> usize {
        self.entries.len()
    }

    /// Index of the newest applied entry; `None` when nothing is applied.
    pub fn current_index(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn is_executing(&self) -> bool {
        self.busy == Some(Busy::Executing)
    }

    pub fn is_undoing(&self) -> bool {
        self.busy == Some(Busy::Undoing)
    }

    pub fn is_redoing(&self) -> bool {
        self.busy == Some(Busy::Redoing)
    }

    pub fn pending_telemetry(&self) -> usize {
        self.telemetry.pending()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .map(|c| HistoryEntry {
                id: c.id(),
                kind: c.kind(),
                description: c.description(),
                state: c.state(),
            })
            .collect()
    }
}

/// FIFO eviction down to `max_size`, keeping the cursor on the same entry.
fn enforce_max_size(entries: &mut Vec<Box<dyn Command>>, applied: &mut usize, max_size: usize) {
    if entries.len() <= max_size {
        return;
    }
    let excess = entries.len() - max_size;
    entries.drain(..excess);
    *applied = applied.saturating_sub(excess);
    debug!(evicted = excess, "evicted oldest history entries");
}
