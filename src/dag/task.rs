// src/dag/task.rs

//! Task windows, dependency edges and proposed updates.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::types::{DependencyType, Lag};

/// Canonical task identifier type used throughout the engine.
pub type TaskId = String;

/// A task bar's position on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskSchedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TaskSchedule {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Move both edges by `delta`, keeping the duration.
    pub fn shifted(&self, delta: Duration) -> Self {
        Self {
            start: self.start + delta,
            end: self.end + delta,
        }
    }

    /// A window is well formed when it does not end before it starts.
    pub fn is_well_formed(&self) -> bool {
        self.end >= self.start
    }
}

impl fmt::Display for TaskSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Read view of a task as held by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub schedule: TaskSchedule,
    /// Completion percentage, 0..=100.
    pub progress: u8,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            schedule: TaskSchedule::new(start, end),
            progress: 0,
        }
    }
}

/// Directed precedence edge `predecessor -> successor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub predecessor: TaskId,
    pub successor: TaskId,
    pub kind: DependencyType,
    /// Explicit lag; `None` falls back to the configured default lag.
    pub lag: Option<Lag>,
}

impl Dependency {
    pub fn new(
        predecessor: impl Into<TaskId>,
        successor: impl Into<TaskId>,
        kind: DependencyType,
    ) -> Self {
        Self {
            predecessor: predecessor.into(),
            successor: successor.into(),
            kind,
            lag: None,
        }
    }

    pub fn with_lag(mut self, lag: Lag) -> Self {
        self.lag = Some(lag);
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.predecessor == self.successor
    }

    pub fn effective_lag(&self, default_lag: Lag) -> Duration {
        self.lag.unwrap_or(default_lag).to_duration()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lag {
            Some(lag) => write!(
                f,
                "{} -{}({})-> {}",
                self.predecessor, self.kind, lag, self.successor
            ),
            None => write!(f, "{} -{}-> {}", self.predecessor, self.kind, self.successor),
        }
    }
}

/// A proposed (not yet committed) change to one task's window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub task_id: TaskId,
    pub previous: TaskSchedule,
    pub proposed: TaskSchedule,
}

impl TaskUpdate {
    pub fn new_start(&self) -> DateTime<Utc> {
        self.proposed.start
    }

    pub fn new_end(&self) -> DateTime<Utc> {
        self.proposed.end
    }
}
