// src/engine/command.rs

//! Reversible units of work.
//!
//! A [`Command`] applies one or more task windows through the
//! [`TaskStore`] collaborator and knows how to put them back. The history
//! only ever talks to commands through this trait, so plain single-task
//! edits and composite auto-scheduling edits are interchangeable.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::dag::{Dependency, TaskId, TaskSchedule};
use crate::errors::{AutoschedError, Result};
use crate::store::TaskStore;

/// Boxed future returned by command actions.
pub type CommandFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Session-unique command identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd-{}", self.0)
    }
}

/// Type tag of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    BarMove,
    BarResize,
    /// A bar move or resize bundled with every edit it cascades into.
    AutoSchedule,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandKind::BarMove => "bar-move",
            CommandKind::BarResize => "bar-resize",
            CommandKind::AutoSchedule => "auto-schedule",
        };
        f.write_str(s)
    }
}

/// Lifecycle state of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// Created, never applied.
    Pending,
    /// Applied; the next step is undo.
    Executed,
    /// Reverted; the next step is redo.
    Undone,
    /// A write and its compensation both failed. Task windows may be
    /// inconsistent, so the command can neither be undone nor redone.
    Failed,
}

/// The history operation being performed on a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryAction {
    Execute,
    Undo,
    Redo,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HistoryAction::Execute => "execute",
            HistoryAction::Undo => "undo",
            HistoryAction::Redo => "redo",
        };
        f.write_str(s)
    }
}

/// Timestamps and free-form metadata carried into telemetry.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub created_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub metadata: BTreeMap<String, String>,
}

impl CommandContext {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            last_run_at: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }

    pub(crate) fn touch(&mut self) {
        self.last_run_at = Some(Utc::now());
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A reversible unit of work held by the command history.
///
/// `redo` defaults to `execute`: applying the same target windows twice
/// yields the same result.
pub trait Command: Send + fmt::Debug {
    fn id(&self) -> CommandId;

    fn kind(&self) -> CommandKind;

    fn description(&self) -> String;

    fn context(&self) -> &CommandContext;

    fn state(&self) -> CommandState;

    /// Checked by the history before `execute`. A failing command never
    /// enters the history.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self) -> CommandFuture<'_>;

    fn undo(&mut self) -> CommandFuture<'_>;

    fn redo(&mut self) -> CommandFuture<'_> {
        self.execute()
    }

    fn can_undo(&self) -> bool {
        self.state() == CommandState::Executed
    }

    fn can_redo(&self) -> bool {
        self.state() == CommandState::Undone
    }

    /// Every task whose window this command writes, primary task first.
    fn affected_task_ids(&self) -> Vec<TaskId>;

    /// Dependency edges traversed to derive the command's edits.
    fn dependency_chain(&self) -> Vec<Dependency> {
        Vec::new()
    }
}

/// One task's window before and after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleStep {
    pub task_id: TaskId,
    pub previous: TaskSchedule,
    pub target: TaskSchedule,
}

impl ScheduleStep {
    pub fn new(task_id: impl Into<TaskId>, previous: TaskSchedule, target: TaskSchedule) -> Self {
        Self {
            task_id: task_id.into(),
            previous,
            target,
        }
    }
}

/// Which side of a step a write moves the task to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn destination(self, step: &ScheduleStep) -> TaskSchedule {
        match self {
            Direction::Forward => step.target,
            Direction::Backward => step.previous,
        }
    }

    fn origin(self, step: &ScheduleStep) -> TaskSchedule {
        match self {
            Direction::Forward => step.previous,
            Direction::Backward => step.target,
        }
    }
}

/// Why [`apply_steps`] failed.
#[derive(Debug)]
pub(crate) struct ApplyFailure {
    pub error: AutoschedError,
    /// `true` when every write made before the failure was reverted.
    pub compensated: bool,
}

/// Apply `steps` in order (forward) or reverse order (backward), one
/// sequential `update_task` call per step.
///
/// If a write fails, the writes already made by this call are reverted
/// newest-first before returning, so the store ends where it started.
pub(crate) async fn apply_steps(
    store: &dyn TaskStore,
    steps: &[ScheduleStep],
    direction: Direction,
) -> std::result::Result<(), ApplyFailure> {
    let ordered: Vec<&ScheduleStep> = match direction {
        Direction::Forward => steps.iter().collect(),
        Direction::Backward => steps.iter().rev().collect(),
    };

    for (i, step) in ordered.iter().enumerate() {
        let window = direction.destination(step);
        debug!(task = %step.task_id, %window, ?direction, "applying task window");

        if let Err(source) = store.update_task(step.task_id.clone(), window).await {
            let error = AutoschedError::Collaborator {
                task: step.task_id.clone(),
                source,
            };
            let compensated = compensate(store, &ordered[..i], direction).await;
            return Err(ApplyFailure { error, compensated });
        }
    }

    Ok(())
}

/// Revert `applied` newest first. Every step is attempted even after a
/// failed revert; returns `false` if any of them failed.
async fn compensate(
    store: &dyn TaskStore,
    applied: &[&ScheduleStep],
    direction: Direction,
) -> bool {
    let mut all_reverted = true;
    for step in applied.iter().rev() {
        let window = direction.origin(step);
        debug!(task = %step.task_id, %window, "rolling back task window");
        if let Err(err) = store.update_task(step.task_id.clone(), window).await {
            error!(
                task = %step.task_id,
                error = %err,
                "rollback failed; task window left at its new value"
            );
            all_reverted = false;
        }
    }
    all_reverted
}
