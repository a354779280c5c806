// src/engine/session.rs

//! Per-project orchestrator for bar gestures.
//!
//! For every move or resize the session:
//! 1. takes the history lock (or reports contention),
//! 2. reads a fresh task/dependency snapshot,
//! 3. decides between a plain edit and auto-scheduling,
//! 4. runs impact analysis and applies the proceed/review/abort policy,
//! 5. computes the cascade and wraps it into one composite command,
//! 6. hands the command to the history.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{ProjectFile, SchedulingConfig, TelemetryConfig};
use crate::dag::{
    CascadePlan, DependencyGraph, ImpactAnalysis, ImpactAnalyzer, Recommendation, Scheduler,
    TaskId, TaskSchedule,
};
use crate::engine::command::{Command, CommandId, CommandKind, HistoryAction, ScheduleStep};
use crate::engine::commands::{AutoScheduleCommand, TaskScheduleCommand};
use crate::engine::history::{CommandHistory, HistoryEntry};
use crate::engine::maintenance::{MaintenanceHandle, spawn_maintenance};
use crate::engine::telemetry::{TelemetryBuffer, TelemetrySink};
use crate::errors::{AutoschedError, Result};
use crate::store::{DependencySource, TaskStore};
use crate::types::ReviewAction;

/// External systems the session talks to.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub tasks: Arc<dyn TaskStore>,
    pub dependencies: Arc<dyn DependencySource>,
    pub telemetry: Arc<dyn TelemetrySink>,
}

/// Notification emitted synchronously to the injected notifier.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A gesture was refused because its cascade runs through a cycle.
    CycleAborted { task_id: TaskId, path: Vec<TaskId> },
    /// Impact analysis recommended review. `proceeding` tells whether the
    /// session went ahead anyway.
    ReviewRequired {
        task_id: TaskId,
        analysis: ImpactAnalysis,
        proceeding: bool,
    },
    /// Dependents beyond the depth limit were left unmodified.
    CascadeTruncated {
        task_id: TaskId,
        truncated: Vec<TaskId>,
    },
    /// An execute, undo or redo failed after reaching the history.
    CommandFailed {
        action: HistoryAction,
        task_id: Option<TaskId>,
        error: String,
    },
    HistoryChanged {
        history_count: usize,
        current_index: Option<usize>,
        can_undo: bool,
        can_redo: bool,
    },
}

pub type Notifier = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Drag a bar to a new start; the duration is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarMove {
    pub task_id: TaskId,
    pub new_start: DateTime<Utc>,
}

/// Drag a bar edge; start and end are both given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarResize {
    pub task_id: TaskId,
    pub new_start: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    Move(BarMove),
    Resize(BarResize),
}

impl Gesture {
    pub fn task_id(&self) -> &str {
        match self {
            Gesture::Move(m) => &m.task_id,
            Gesture::Resize(r) => &r.task_id,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Gesture::Move(_) => CommandKind::BarMove,
            Gesture::Resize(_) => CommandKind::BarResize,
        }
    }

    /// The window the gesture asks for, given the task's current window.
    pub fn proposed(&self, current: TaskSchedule) -> TaskSchedule {
        match self {
            Gesture::Move(m) => TaskSchedule::new(m.new_start, m.new_start + current.duration()),
            Gesture::Resize(r) => TaskSchedule::new(r.new_start, r.new_end),
        }
    }
}

impl From<BarMove> for Gesture {
    fn from(m: BarMove) -> Self {
        Gesture::Move(m)
    }
}

impl From<BarResize> for Gesture {
    fn from(r: BarResize) -> Self {
        Gesture::Resize(r)
    }
}

/// What a successful gesture did.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureOutcome {
    pub command_id: CommandId,
    /// `true` when the composite auto-scheduling path was taken.
    pub auto_scheduled: bool,
    /// Primary task first, then derived tasks in application order.
    pub affected_task_ids: Vec<TaskId>,
    pub truncated_task_ids: Vec<TaskId>,
    pub impact: Option<ImpactAnalysis>,
}

/// Dry-run result for a gesture.
#[derive(Debug, Clone)]
pub struct Preview {
    pub current: TaskSchedule,
    pub proposed: TaskSchedule,
    pub impact: ImpactAnalysis,
    /// `None` when the cascade runs through a cycle.
    pub plan: Option<CascadePlan>,
}

pub struct SchedulingSession {
    project_id: String,
    config: SchedulingConfig,
    telemetry_config: TelemetryConfig,
    collaborators: Collaborators,
    history: Arc<Mutex<CommandHistory>>,
    next_command_id: AtomicU64,
    notifier: Option<Notifier>,
}

impl fmt::Debug for SchedulingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulingSession")
            .field("project_id", &self.project_id)
            .field("config", &self.config)
            .field("collaborators", &self.collaborators)
            .finish_non_exhaustive()
    }
}

impl SchedulingSession {
    pub fn new(
        project_id: impl Into<String>,
        config: SchedulingConfig,
        telemetry_config: TelemetryConfig,
        collaborators: Collaborators,
    ) -> Self {
        let buffer = TelemetryBuffer::new(
            Arc::clone(&collaborators.telemetry),
            telemetry_config.batch_size,
        );
        let history = CommandHistory::new(config.max_history_size, buffer);

        Self {
            project_id: project_id.into(),
            config,
            telemetry_config,
            collaborators,
            history: Arc::new(Mutex::new(history)),
            next_command_id: AtomicU64::new(1),
            notifier: None,
        }
    }

    pub fn from_project_file(cfg: &ProjectFile, collaborators: Collaborators) -> Self {
        Self::new(
            cfg.project.id.clone(),
            cfg.scheduling.clone(),
            cfg.telemetry.clone(),
            collaborators,
        )
    }

    pub fn with_notifier(
        mut self,
        notifier: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Read-only pre-flight estimate for moving `task_id`.
    pub async fn analyze_impact(&self, task_id: &str) -> Result<ImpactAnalysis> {
        let graph = self.snapshot().await?;
        if !graph.contains_task(task_id) {
            return Err(AutoschedError::TaskNotFound(task_id.to_string()));
        }
        Ok(self.analyzer().estimate_impact(&graph, task_id))
    }

    /// Compute what a gesture would do without executing anything.
    pub async fn preview(&self, gesture: &Gesture) -> Result<Preview> {
        let graph = self.snapshot().await?;
        let task_id = gesture.task_id();
        let current = graph
            .task(task_id)
            .ok_or_else(|| AutoschedError::TaskNotFound(task_id.to_string()))?
            .schedule;
        let proposed = gesture.proposed(current);

        let impact = self.analyzer().estimate_impact(&graph, task_id);
        let plan = if impact.has_cycle {
            None
        } else {
            Some(self.scheduler(&graph).compute_cascade(task_id, proposed)?)
        };

        Ok(Preview {
            current,
            proposed,
            impact,
            plan,
        })
    }

    pub async fn execute_bar_move(&self, params: BarMove) -> Result<GestureOutcome> {
        self.execute_gesture(Gesture::Move(params)).await
    }

    pub async fn execute_bar_resize(&self, params: BarResize) -> Result<GestureOutcome> {
        self.execute_gesture(Gesture::Resize(params)).await
    }

    pub async fn execute_gesture(&self, gesture: Gesture) -> Result<GestureOutcome> {
        let task_id = gesture.task_id().to_string();
        let mut history = self.history.try_lock().map_err(|_| {
            AutoschedError::HistoryBusy(format!(
                "cannot apply {} to '{}' while another history operation is running",
                gesture.kind(),
                task_id
            ))
        })?;

        let graph = self.snapshot().await?;
        let current = graph
            .task(&task_id)
            .ok_or_else(|| AutoschedError::TaskNotFound(task_id.clone()))?
            .schedule;
        let proposed = gesture.proposed(current);
        let primary = ScheduleStep::new(task_id.clone(), current, proposed);
        let id = self.next_command_id();
        let store = Arc::clone(&self.collaborators.tasks);

        let auto = self.config.enabled
            && ImpactAnalyzer::should_enable_auto_scheduling(&task_id, graph.dependencies());

        let mut impact = None;
        let mut truncated = Vec::new();
        let command: Box<dyn Command> = if !auto {
            debug!(task = %task_id, "no dependents or auto-scheduling disabled; plain edit");
            Box::new(TaskScheduleCommand::new(id, gesture.kind(), store, primary))
        } else {
            let analysis = self.check_impact(&graph, &task_id)?;
            impact = Some(analysis);

            let plan = self.scheduler(&graph).compute_cascade(&task_id, proposed)?;
            if plan.is_truncated() {
                info!(
                    task = %task_id,
                    truncated = plan.truncated.len(),
                    depth = self.config.max_cascading_depth,
                    "cascade truncated at depth limit"
                );
                truncated = plan.truncated.clone();
                self.notify(SessionEvent::CascadeTruncated {
                    task_id: task_id.clone(),
                    truncated: truncated.clone(),
                });
            }

            if plan.is_empty() {
                debug!(task = %task_id, "cascade moves no dependents; plain edit");
                Box::new(TaskScheduleCommand::new(id, gesture.kind(), store, primary))
            } else {
                Box::new(AutoScheduleCommand::from_plan(id, gesture.kind(), store, plan))
            }
        };

        let auto_scheduled = command.kind() == CommandKind::AutoSchedule;
        let affected_task_ids = command.affected_task_ids();

        match history.execute_command(command).await {
            Ok(command_id) => {
                self.notify_history(&history);
                Ok(GestureOutcome {
                    command_id,
                    auto_scheduled,
                    affected_task_ids,
                    truncated_task_ids: truncated,
                    impact,
                })
            }
            Err(err) => {
                self.notify(SessionEvent::CommandFailed {
                    action: HistoryAction::Execute,
                    task_id: Some(task_id),
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Undo the latest command. `Ok(false)` when there is nothing to undo or
    /// another history operation is in flight.
    pub async fn undo(&self) -> Result<bool> {
        self.step_history(HistoryAction::Undo).await
    }

    /// Redo the next command. `Ok(false)` when there is nothing to redo or
    /// another history operation is in flight.
    pub async fn redo(&self) -> Result<bool> {
        self.step_history(HistoryAction::Redo).await
    }

    /// `false` while another history operation is in flight.
    pub fn can_undo(&self) -> bool {
        self.history.try_lock().map(|h| h.can_undo()).unwrap_or(false)
    }

    /// `false` while another history operation is in flight.
    pub fn can_redo(&self) -> bool {
        self.history.try_lock().map(|h| h.can_redo()).unwrap_or(false)
    }

    pub async fn history_count(&self) -> usize {
        self.history.lock().await.history_count()
    }

    pub async fn current_index(&self) -> Option<usize> {
        self.history.lock().await.current_index()
    }

    pub async fn history_entries(&self) -> Vec<HistoryEntry> {
        self.history.lock().await.entries()
    }

    /// Flush telemetry and empty the history.
    pub async fn clear_history(&self) {
        let mut history = self.history.lock().await;
        history.clear_history().await;
        self.notify_history(&history);
    }

    /// Start periodic telemetry flushing and history cleanup using the
    /// configured intervals.
    pub fn spawn_maintenance(&self) -> MaintenanceHandle {
        spawn_maintenance(
            Arc::clone(&self.history),
            Duration::from_secs(self.telemetry_config.flush_interval_secs),
            Duration::from_secs(self.telemetry_config.cleanup_interval_secs),
        )
    }

    /// Teardown: send any buffered telemetry.
    pub async fn shutdown(&self) {
        let sent = self.history.lock().await.flush_telemetry().await;
        debug!(sent, "session shut down");
    }

    async fn step_history(&self, action: HistoryAction) -> Result<bool> {
        let Ok(mut history) = self.history.try_lock() else {
            debug!(%action, "history busy; ignoring request");
            return Ok(false);
        };

        let outcome = match action {
            HistoryAction::Redo => history.redo().await,
            _ => history.undo().await,
        };

        match outcome {
            Ok(true) => {
                self.notify_history(&history);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) => {
                warn!(%action, error = %err, "history step failed");
                self.notify(SessionEvent::CommandFailed {
                    action,
                    task_id: None,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Apply the proceed/review/abort policy to a fresh impact analysis.
    fn check_impact(&self, graph: &DependencyGraph, task_id: &str) -> Result<ImpactAnalysis> {
        let analysis = self.analyzer().estimate_impact(graph, task_id);

        match analysis.recommendation {
            Recommendation::Proceed => Ok(analysis),
            Recommendation::Abort => {
                let path = analysis.cycle.clone().unwrap_or_default();
                warn!(
                    task = %task_id,
                    cycle = %path.join(" -> "),
                    "refusing to cascade through a cycle"
                );
                self.notify(SessionEvent::CycleAborted {
                    task_id: task_id.to_string(),
                    path: path.clone(),
                });
                Err(AutoschedError::CycleDetected { path })
            }
            Recommendation::Review => {
                let proceeding = self.config.on_review == ReviewAction::Proceed;
                info!(
                    task = %task_id,
                    affected = analysis.estimated_affected_tasks,
                    estimated_ms = analysis.estimated_execution_time_ms,
                    proceeding,
                    "impact analysis recommends review"
                );
                self.notify(SessionEvent::ReviewRequired {
                    task_id: task_id.to_string(),
                    analysis: analysis.clone(),
                    proceeding,
                });
                if proceeding {
                    Ok(analysis)
                } else {
                    Err(AutoschedError::ThresholdExceeded {
                        affected: analysis.estimated_affected_tasks,
                        estimated_ms: analysis.estimated_execution_time_ms,
                        recommendation: analysis.recommendation,
                    })
                }
            }
        }
    }

    async fn snapshot(&self) -> Result<DependencyGraph> {
        let tasks = self.collaborators.tasks.load_tasks(&self.project_id).await?;
        let dependencies = self
            .collaborators
            .dependencies
            .load_dependencies(&self.project_id)
            .await?;
        debug!(
            tasks = tasks.len(),
            dependencies = dependencies.len(),
            "loaded project snapshot"
        );
        Ok(DependencyGraph::new(tasks, dependencies))
    }

    fn analyzer(&self) -> ImpactAnalyzer {
        ImpactAnalyzer::new(self.config.max_cascading_depth, self.config.impact_policy())
    }

    fn scheduler<'g>(&self, graph: &'g DependencyGraph) -> Scheduler<'g> {
        Scheduler::new(graph, self.config.scheduling_options())
    }

    fn next_command_id(&self) -> CommandId {
        CommandId(self.next_command_id.fetch_add(1, Ordering::Relaxed))
    }

    fn notify(&self, event: SessionEvent) {
        if let Some(notifier) = &self.notifier {
            notifier(&event);
        }
    }

    fn notify_history(&self, history: &CommandHistory) {
        self.notify(SessionEvent::HistoryChanged {
            history_count: history.history_count(),
            current_index: history.current_index(),
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
        });
    }
}
