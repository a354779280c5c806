// src/dag/traversal.rs

//! Bounded breadth-first walk over the successors of one task.
//!
//! Both the [`Scheduler`](crate::dag::Scheduler) and the
//! [`ImpactAnalyzer`](crate::dag::ImpactAnalyzer) use the same walk, so
//! the analyzer's prediction always covers exactly the tasks the scheduler
//! would consider.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::dag::DependencyGraph;
use crate::dag::task::{Dependency, TaskId};

/// Result of walking the cascade region below a root task.
#[derive(Debug, Clone, Default)]
pub struct CascadeWalk {
    /// Tasks reached within the depth limit, in BFS order, with their
    /// shortest hop distance from the root. The root itself is excluded.
    pub reached: Vec<(TaskId, usize)>,
    /// Every edge between tasks of the cascade region (root included).
    pub edges: Vec<Dependency>,
    /// Tasks reachable from the root but beyond the depth limit.
    pub truncated: Vec<TaskId>,
    /// Deepest level reached within the limit.
    pub max_depth_reached: usize,
    /// Task ids of the first cycle found, first id repeated at the end.
    pub cycle: Option<Vec<TaskId>>,
}

impl CascadeWalk {
    pub fn has_cycle(&self) -> bool {
        self.cycle.is_some()
    }
}

/// Walk successors of `root` up to `max_depth` levels.
///
/// When an edge leads back to a task already discovered in this walk, the
/// graph is asked whether that task reaches the edge's predecessor; if so
/// the edge closes a cycle and the walk stops immediately. A self-loop is
/// caught at its first hop the same way.
pub fn walk_cascade(graph: &DependencyGraph, root: &str, max_depth: usize) -> CascadeWalk {
    let mut walk = CascadeWalk::default();

    let mut depth_of: HashMap<&str, usize> = HashMap::from([(root, 0)]);
    let mut queue: VecDeque<&str> = VecDeque::from([root]);
    let mut boundary: Vec<&str> = Vec::new();

    while let Some(id) = queue.pop_front() {
        let depth = depth_of.get(id).copied().unwrap_or(0);

        for dep in graph.successors_of(id) {
            let succ = dep.successor.as_str();

            if depth_of.contains_key(succ) {
                if graph.is_reachable(succ, id) {
                    let mut path = graph
                        .path_between(succ, id)
                        .unwrap_or_else(|| vec![succ.to_string()]);
                    path.push(succ.to_string());
                    warn!(root = %root, cycle = ?path, "cycle detected in cascade");
                    walk.cycle = Some(path);
                    return walk;
                }
                // Second path into an already discovered task (fan-in).
                walk.edges.push(dep.clone());
                continue;
            }

            if !graph.contains_task(succ) {
                warn!(
                    predecessor = %id,
                    successor = %succ,
                    "dependency points at a task missing from the snapshot; skipping"
                );
                continue;
            }

            if depth + 1 > max_depth {
                boundary.push(succ);
                continue;
            }

            depth_of.insert(succ, depth + 1);
            walk.reached.push((succ.to_string(), depth + 1));
            walk.edges.push(dep.clone());
            walk.max_depth_reached = walk.max_depth_reached.max(depth + 1);
            queue.push_back(succ);
        }
    }

    walk.truncated = collect_beyond(graph, &depth_of, boundary);
    if !walk.truncated.is_empty() {
        debug!(
            root = %root,
            max_depth,
            truncated = walk.truncated.len(),
            "cascade truncated at depth limit"
        );
    }

    walk
}

/// Every task reachable from `boundary` that is not part of the region.
fn collect_beyond(
    graph: &DependencyGraph,
    region: &HashMap<&str, usize>,
    boundary: Vec<&str>,
) -> Vec<TaskId> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    let mut out = Vec::new();

    for id in boundary {
        if seen.insert(id) {
            queue.push_back(id);
        }
    }

    while let Some(id) = queue.pop_front() {
        out.push(id.to_string());
        for dep in graph.successors_of(id) {
            let succ = dep.successor.as_str();
            if region.contains_key(succ) || !graph.contains_task(succ) {
                continue;
            }
            if seen.insert(succ) {
                queue.push_back(succ);
            }
        }
    }

    out
}
