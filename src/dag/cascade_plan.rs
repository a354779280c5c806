// src/dag/cascade_plan.rs

//! Result type for one cascade computation.

use crate::dag::task::{Dependency, TaskId, TaskSchedule, TaskUpdate};

/// Proposed schedule changes derived from moving or resizing one task.
///
/// Nothing here has been applied yet; the plan is turned into a composite
/// command by the session and only the command history commits it.
#[derive(Debug, Clone)]
pub struct CascadePlan {
    /// The task the user edited.
    pub root: TaskId,
    /// The root's window before the edit.
    pub root_previous: TaskSchedule,
    /// The root's window requested by the edit.
    pub root_proposed: TaskSchedule,
    /// Derived updates in application order: every task appears after all of
    /// its predecessors within the cascade. The root is not included.
    pub updates: Vec<TaskUpdate>,
    /// Edges traversed while computing the cascade.
    pub dependency_chain: Vec<Dependency>,
    /// Tasks left unmodified because they lie beyond the depth limit.
    pub truncated: Vec<TaskId>,
    /// Deepest level the cascade reached.
    pub max_depth_reached: usize,
}

impl CascadePlan {
    /// `true` when no dependent task has to move.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn affected_task_ids(&self) -> Vec<TaskId> {
        self.updates.iter().map(|u| u.task_id.clone()).collect()
    }

    pub fn is_truncated(&self) -> bool {
        !self.truncated.is_empty()
    }
}
