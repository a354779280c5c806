// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::{AutoschedError, Result};

impl TryFrom<RawProjectFile> for ProjectFile {
    type Error = AutoschedError;

    fn try_from(raw: RawProjectFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_project(&raw)?;
        Ok(ProjectFile::new_unchecked(raw))
    }
}

fn validate_raw_project(cfg: &RawProjectFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_scheduling(cfg)?;
    validate_telemetry(cfg)?;
    validate_tasks(cfg)?;
    validate_dependencies(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> AutoschedError {
    AutoschedError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawProjectFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "project must contain at least one [task.<id>] section",
        ));
    }
    Ok(())
}

fn validate_scheduling(cfg: &RawProjectFile) -> Result<()> {
    let s = &cfg.scheduling;

    if s.max_cascading_depth == 0 {
        return Err(config_error(
            "[scheduling].max_cascading_depth must be >= 1 (got 0)",
        ));
    }
    if s.max_history_size == 0 {
        return Err(config_error(
            "[scheduling].max_history_size must be >= 1 (got 0)",
        ));
    }
    if s.max_affected_tasks == 0 {
        return Err(config_error(
            "[scheduling].max_affected_tasks must be >= 1 (got 0)",
        ));
    }
    if !(s.performance_threshold_ms > 0.0) {
        return Err(config_error(format!(
            "[scheduling].performance_threshold_ms must be > 0 (got {})",
            s.performance_threshold_ms
        )));
    }
    if !(s.estimate_base_ms >= 0.0) || !(s.estimate_per_task_ms >= 0.0) {
        return Err(config_error(
            "[scheduling].estimate_base_ms and estimate_per_task_ms must be >= 0",
        ));
    }

    Ok(())
}

fn validate_telemetry(cfg: &RawProjectFile) -> Result<()> {
    let t = &cfg.telemetry;

    if t.batch_size == 0 {
        return Err(config_error("[telemetry].batch_size must be >= 1 (got 0)"));
    }
    if t.flush_interval_secs == 0 || t.cleanup_interval_secs == 0 {
        return Err(config_error(
            "[telemetry].flush_interval_secs and cleanup_interval_secs must be >= 1",
        ));
    }

    Ok(())
}

fn validate_tasks(cfg: &RawProjectFile) -> Result<()> {
    for (id, task) in cfg.task.iter() {
        if task.end < task.start {
            return Err(config_error(format!(
                "task '{}' ends ({}) before it starts ({})",
                id,
                task.end.to_rfc3339(),
                task.start.to_rfc3339()
            )));
        }
        if task.progress > 100 {
            return Err(config_error(format!(
                "task '{}' has progress {} (expected 0..=100)",
                id, task.progress
            )));
        }
    }
    Ok(())
}

fn validate_dependencies(cfg: &RawProjectFile) -> Result<()> {
    for dep in cfg.dependency.iter() {
        for id in [&dep.from, &dep.to] {
            if !cfg.task.contains_key(id) {
                return Err(config_error(format!(
                    "dependency '{} -> {}' references unknown task '{}'",
                    dep.from, dep.to, id
                )));
            }
        }
    }
    Ok(())
}

/// Describe a dependency cycle in the project, if there is one.
///
/// Self-loops are reported too. This is diagnostics only; see
/// [`crate::config::load_and_validate`].
pub fn cycle_report(cfg: &ProjectFile) -> Option<String> {
    if let Some(dep) = cfg.dependency.iter().find(|d| d.from == d.to) {
        return Some(format!(
            "dependency graph has a self-loop on task '{}'",
            dep.from
        ));
    }

    // Edge direction: predecessor -> successor.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in cfg.task.keys() {
        graph.add_node(id.as_str());
    }
    for dep in cfg.dependency.iter() {
        graph.add_edge(dep.from.as_str(), dep.to.as_str(), ());
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => None,
        Err(cycle) => Some(format!(
            "dependency graph has a cycle involving task '{}'; moves reaching it will be refused",
            cycle.node_id()
        )),
    }
}
