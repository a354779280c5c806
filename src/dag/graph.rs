// src/dag/graph.rs

use std::collections::{HashMap, HashSet, VecDeque};

use crate::dag::task::{Dependency, Task, TaskId};

/// Read-only snapshot of a project's tasks and dependency edges.
///
/// Tasks live in a map keyed by id and edges in a flat list; adjacency is an
/// index into that list. Nothing in here carries traversal state, so the same
/// snapshot can be walked any number of times. The graph is *not* assumed to
/// be acyclic; callers that follow edges must check for cycles themselves
/// (see [`DependencyGraph::is_reachable`]).
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    tasks: HashMap<TaskId, Task>,
    edges: Vec<Dependency>,
    /// Edge indices keyed by predecessor id.
    outgoing: HashMap<TaskId, Vec<usize>>,
    /// Edge indices keyed by successor id.
    incoming: HashMap<TaskId, Vec<usize>>,
}

impl DependencyGraph {
    /// Build a snapshot from the collaborators' point-in-time data.
    ///
    /// Edges naming tasks absent from `tasks` are kept (so reachability stays
    /// faithful to the dependency data) but can never be rescheduled.
    pub fn new(
        tasks: impl IntoIterator<Item = Task>,
        dependencies: impl IntoIterator<Item = Dependency>,
    ) -> Self {
        let tasks: HashMap<TaskId, Task> =
            tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        let edges: Vec<Dependency> = dependencies.into_iter().collect();

        let mut outgoing: HashMap<TaskId, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<TaskId, Vec<usize>> = HashMap::new();
        for (idx, dep) in edges.iter().enumerate() {
            outgoing.entry(dep.predecessor.clone()).or_default().push(idx);
            incoming.entry(dep.successor.clone()).or_default().push(idx);
        }

        Self {
            tasks,
            edges,
            outgoing,
            incoming,
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains_task(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.edges
    }

    /// All edges whose predecessor is `task_id` ("what depends on me").
    pub fn successors_of(&self, task_id: &str) -> Vec<&Dependency> {
        self.edges_at(self.outgoing.get(task_id))
    }

    /// All edges whose successor is `task_id` ("what do I depend on").
    pub fn predecessors_of(&self, task_id: &str) -> Vec<&Dependency> {
        self.edges_at(self.incoming.get(task_id))
    }

    pub fn has_successors(&self, task_id: &str) -> bool {
        self.outgoing.get(task_id).is_some_and(|e| !e.is_empty())
    }

    /// Directed reachability from `from` to `to` by depth-first search.
    ///
    /// A task always reaches itself (zero-length path), so an edge `A -> A`
    /// or any edge `p -> s` with `is_reachable(s, p)` closes a cycle.
    pub fn is_reachable(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }

        let mut stack: Vec<&str> = vec![from];
        let mut visited: HashSet<&str> = HashSet::new();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            for dep in self.successors_of(id) {
                if dep.successor == to {
                    return true;
                }
                stack.push(dep.successor.as_str());
            }
        }

        false
    }

    /// Shortest edge path `from -> ... -> to` as a list of task ids
    /// (both ends included). Used to describe cycles in diagnostics.
    pub fn path_between(&self, from: &str, to: &str) -> Option<Vec<TaskId>> {
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::from([from]);
        let mut seen: HashSet<&str> = HashSet::from([from]);

        while let Some(id) = queue.pop_front() {
            for dep in self.successors_of(id) {
                let next = dep.successor.as_str();
                if !seen.insert(next) {
                    continue;
                }
                parent.insert(next, id);
                if next == to {
                    let mut path = vec![to.to_string()];
                    let mut cursor = to;
                    while let Some(&prev) = parent.get(cursor) {
                        path.push(prev.to_string());
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }

        None
    }

    fn edges_at(&self, indices: Option<&Vec<usize>>) -> Vec<&Dependency> {
        indices
            .map(|idx| idx.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }
}
