use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::dag::cascade_plan::CascadePlan;
use crate::dag::graph::DependencyGraph;
use crate::dag::task::{Dependency, TaskSchedule, TaskUpdate};
use crate::dag::traversal::walk_cascade;
use crate::errors::{AutoschedError, Result};
use crate::types::{DependencyType, Lag};

/// Knobs that change how a cascade is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingOptions {
    /// Number of dependency levels below the edited task that may move.
    pub max_cascading_depth: usize,
    /// Keep every dependent's duration; when `false`, a constraint moves only
    /// the edge of the bar it bounds.
    pub preserve_task_duration: bool,
    /// Lag used for dependencies that do not carry one.
    pub default_lag: Lag,
}

impl Default for SchedulingOptions {
    fn default() -> Self {
        Self {
            max_cascading_depth: 5,
            preserve_task_duration: true,
            default_lag: Lag::zero(),
        }
    }
}

/// Computes how a schedule change propagates through dependent tasks.
///
/// The scheduler is a pure function over a [`DependencyGraph`] snapshot: it
/// never talks to the task store and never mutates the graph. Each
/// dependency is treated as a lower bound on the successor ("start no earlier
/// than" / "finish no earlier than"); a successor that already satisfies all
/// of its bounds keeps its window, so user-set slack is preserved.
#[derive(Debug)]
pub struct Scheduler<'g> {
    graph: &'g DependencyGraph,
    options: SchedulingOptions,
}

impl<'g> Scheduler<'g> {
    pub fn new(graph: &'g DependencyGraph, options: SchedulingOptions) -> Self {
        Self { graph, options }
    }

    pub fn options(&self) -> &SchedulingOptions {
        &self.options
    }

    /// Compute the derived updates for moving `root` to `proposed`.
    ///
    /// Tasks are finalized in topological order of the cascade region, so a
    /// task with several predecessors is placed only after all of them, at
    /// the latest position any of them requires. Fails with
    /// [`AutoschedError::CycleDetected`] (and no partial result) if the
    /// region contains a cycle.
    pub fn compute_cascade(&self, root: &str, proposed: TaskSchedule) -> Result<CascadePlan> {
        let root_task = self
            .graph
            .task(root)
            .ok_or_else(|| AutoschedError::TaskNotFound(root.to_string()))?;

        let walk = walk_cascade(self.graph, root, self.options.max_cascading_depth);
        if let Some(path) = walk.cycle {
            return Err(AutoschedError::CycleDetected { path });
        }

        // BFS position of every region task; used to break ties so the output
        // order is breadth-first wherever the dependencies allow it.
        let mut order: HashMap<&str, usize> = HashMap::from([(root, 0)]);
        for (pos, (id, _)) in walk.reached.iter().enumerate() {
            order.insert(id.as_str(), pos + 1);
        }

        let mut incoming: HashMap<&str, Vec<&Dependency>> = HashMap::new();
        let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut pending_preds: HashMap<&str, usize> =
            order.keys().map(|&id| (id, 0)).collect();

        for dep in &walk.edges {
            incoming.entry(dep.successor.as_str()).or_default().push(dep);
            outgoing
                .entry(dep.predecessor.as_str())
                .or_default()
                .push(dep.successor.as_str());
            if let Some(count) = pending_preds.get_mut(dep.successor.as_str()) {
                *count += 1;
            }
        }

        let mut windows: HashMap<&str, TaskSchedule> = HashMap::from([(root, proposed)]);
        let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::from([Reverse((0, root))]);
        let mut finalized = 0usize;
        let mut updates = Vec::new();

        while let Some(Reverse((_, id))) = ready.pop() {
            finalized += 1;

            if id != root {
                let Some(task) = self.graph.task(id) else {
                    continue;
                };
                let current = task.schedule;

                let constraints = incoming
                    .get(id)
                    .into_iter()
                    .flatten()
                    .filter_map(|dep| {
                        windows
                            .get(dep.predecessor.as_str())
                            .map(|w| (*dep, *w))
                    });
                let next = self.constrain(current, constraints);

                if next != current {
                    debug!(
                        task = %id,
                        from = %current,
                        to = %next,
                        "dependent task rescheduled"
                    );
                    updates.push(TaskUpdate {
                        task_id: id.to_string(),
                        previous: current,
                        proposed: next,
                    });
                }
                windows.insert(id, next);
            }

            for &succ in outgoing.get(id).into_iter().flatten() {
                if let Some(count) = pending_preds.get_mut(succ) {
                    *count -= 1;
                    if *count == 0 {
                        let pos = order.get(succ).copied().unwrap_or(usize::MAX);
                        ready.push(Reverse((pos, succ)));
                    }
                }
            }
        }

        if finalized < order.len() {
            // The walk guarantees an acyclic region; this only fires if the
            // snapshot is inconsistent.
            let stuck: Vec<String> = pending_preds
                .iter()
                .filter(|&(_, &count)| count > 0)
                .map(|(&id, _)| id.to_string())
                .collect();
            warn!(root = %root, ?stuck, "cascade region could not be ordered");
            return Err(AutoschedError::CycleDetected { path: stuck });
        }

        if !walk.truncated.is_empty() {
            info!(
                root = %root,
                max_depth = self.options.max_cascading_depth,
                truncated = ?walk.truncated,
                "tasks beyond the cascade depth limit left unmodified"
            );
        }

        Ok(CascadePlan {
            root: root.to_string(),
            root_previous: root_task.schedule,
            root_proposed: proposed,
            updates,
            dependency_chain: walk.edges,
            truncated: walk.truncated,
            max_depth_reached: walk.max_depth_reached,
        })
    }

    /// Smallest forward move of `current` that satisfies every constraint.
    fn constrain<'a>(
        &self,
        current: TaskSchedule,
        constraints: impl Iterator<Item = (&'a Dependency, TaskSchedule)>,
    ) -> TaskSchedule {
        let mut start_shift = Duration::zero();
        let mut end_shift = Duration::zero();

        for (dep, pred) in constraints {
            let lag = dep.effective_lag(self.options.default_lag);
            match dep.kind {
                DependencyType::FinishToStart => {
                    start_shift = start_shift.max(pred.end + lag - current.start);
                }
                DependencyType::StartToStart => {
                    start_shift = start_shift.max(pred.start + lag - current.start);
                }
                DependencyType::FinishToFinish => {
                    end_shift = end_shift.max(pred.end + lag - current.end);
                }
                DependencyType::StartToFinish => {
                    end_shift = end_shift.max(pred.start + lag - current.end);
                }
            }
        }

        if self.options.preserve_task_duration {
            return current.shifted(start_shift.max(end_shift));
        }

        let start = current.start + start_shift;
        let end = (current.end + end_shift).max(start);
        TaskSchedule::new(start, end)
    }
}
