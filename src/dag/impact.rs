// src/dag/impact.rs

//! Pre-flight estimate of how far a schedule change would cascade.

use std::fmt;

use tracing::debug;

use crate::dag::graph::DependencyGraph;
use crate::dag::task::{Dependency, TaskId};
use crate::dag::traversal::walk_cascade;

/// What the orchestrator should do with a prospective cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Proceed,
    Review,
    Abort,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::Proceed => "proceed",
            Recommendation::Review => "review",
            Recommendation::Abort => "abort",
        })
    }
}

/// Thresholds and the linear cost model used to turn an impact estimate into
/// a [`Recommendation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactPolicy {
    pub max_affected_tasks: usize,
    pub performance_threshold_ms: f64,
    /// Fixed cost of any cascade.
    pub estimate_base_ms: f64,
    /// Cost added per affected task.
    pub estimate_per_task_ms: f64,
}

impl Default for ImpactPolicy {
    fn default() -> Self {
        Self {
            max_affected_tasks: 20,
            performance_threshold_ms: 500.0,
            estimate_base_ms: 10.0,
            estimate_per_task_ms: 20.0,
        }
    }
}

impl ImpactPolicy {
    /// Planning heuristic, not a measurement.
    pub fn estimate_time_ms(&self, affected_tasks: usize) -> f64 {
        self.estimate_base_ms + affected_tasks as f64 * self.estimate_per_task_ms
    }

    pub fn recommend(
        &self,
        has_cycle: bool,
        affected_tasks: usize,
        estimated_ms: f64,
    ) -> Recommendation {
        if has_cycle {
            Recommendation::Abort
        } else if affected_tasks > self.max_affected_tasks
            || estimated_ms > self.performance_threshold_ms
        {
            Recommendation::Review
        } else {
            Recommendation::Proceed
        }
    }
}

/// Result of [`ImpactAnalyzer::estimate_impact`]. Derived from the current
/// snapshot and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactAnalysis {
    /// Whether the task has any dependents at all.
    pub will_trigger: bool,
    pub estimated_affected_tasks: usize,
    pub max_cascade_levels: usize,
    pub has_cycle: bool,
    pub estimated_execution_time_ms: f64,
    pub recommendation: Recommendation,
    /// The offending cycle, when `has_cycle` is set.
    pub cycle: Option<Vec<TaskId>>,
    /// Dependents beyond the depth limit that would be left untouched.
    pub truncated_tasks: usize,
}

impl ImpactAnalysis {
    fn untriggered() -> Self {
        Self {
            will_trigger: false,
            estimated_affected_tasks: 0,
            max_cascade_levels: 0,
            has_cycle: false,
            estimated_execution_time_ms: 0.0,
            recommendation: Recommendation::Proceed,
            cycle: None,
            truncated_tasks: 0,
        }
    }
}

/// Walks the graph the way the scheduler would, without computing dates.
#[derive(Debug, Clone)]
pub struct ImpactAnalyzer {
    max_cascading_depth: usize,
    policy: ImpactPolicy,
}

impl ImpactAnalyzer {
    pub fn new(max_cascading_depth: usize, policy: ImpactPolicy) -> Self {
        Self {
            max_cascading_depth,
            policy,
        }
    }

    /// Fast short-circuit: only tasks with at least one outgoing dependency
    /// need the cascading machinery.
    pub fn should_enable_auto_scheduling(task_id: &str, dependencies: &[Dependency]) -> bool {
        dependencies.iter().any(|d| d.predecessor == task_id)
    }

    pub fn estimate_impact(&self, graph: &DependencyGraph, task_id: &str) -> ImpactAnalysis {
        if !graph.has_successors(task_id) {
            return ImpactAnalysis::untriggered();
        }

        let walk = walk_cascade(graph, task_id, self.max_cascading_depth);
        let affected = walk.reached.len();
        let estimated_ms = self.policy.estimate_time_ms(affected);
        let recommendation = self
            .policy
            .recommend(walk.has_cycle(), affected, estimated_ms);

        debug!(
            task = %task_id,
            affected,
            levels = walk.max_depth_reached,
            has_cycle = walk.has_cycle(),
            estimated_ms,
            %recommendation,
            "impact analysis complete"
        );

        ImpactAnalysis {
            will_trigger: true,
            estimated_affected_tasks: affected,
            max_cascade_levels: walk.max_depth_reached,
            has_cycle: walk.has_cycle(),
            estimated_execution_time_ms: estimated_ms,
            recommendation,
            truncated_tasks: walk.truncated.len(),
            cycle: walk.cycle,
        }
    }
}
