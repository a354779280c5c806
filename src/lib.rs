// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod store;
pub mod types;

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ProjectFile, cycle_report, load_and_validate};
use crate::engine::{
    BarMove, BarResize, Collaborators, Gesture, GestureOutcome, Preview, SchedulingSession,
    TelemetrySink, TracingTelemetrySink,
};
use crate::store::InMemoryProject;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project file loading
/// - the in-memory task store
/// - a scheduling session (impact analysis, cascade, history)
/// - printing of the resulting schedule
pub async fn run(args: CliArgs) -> Result<()> {
    run_with_sink(args, Arc::new(TracingTelemetrySink)).await
}

/// [`run`] with an explicit telemetry sink.
///
/// Buffered telemetry is flushed before returning, whether or not the gesture
/// succeeded.
pub async fn run_with_sink(args: CliArgs, telemetry: Arc<dyn TelemetrySink>) -> Result<()> {
    let cfg = load_and_validate(&args.project)?;

    let Some(gesture) = gesture_from_args(&args)? else {
        print_project(&cfg);
        return Ok(());
    };

    let project = InMemoryProject::from_project_file(&cfg);
    let collaborators = Collaborators {
        tasks: Arc::new(project.clone()),
        dependencies: Arc::new(project.clone()),
        telemetry,
    };
    let session = SchedulingSession::from_project_file(&cfg, collaborators)
        .with_notifier(|event| info!(?event, "session event"));

    if args.dry_run {
        let preview = session.preview(&gesture).await?;
        print_preview(&cfg, gesture.task_id(), &preview);
        return Ok(());
    }

    let result = apply_gesture(&session, &project, gesture, args.undo).await;
    session.shutdown().await;
    debug!(ok = result.is_ok(), "run complete");
    result
}

async fn apply_gesture(
    session: &SchedulingSession,
    project: &InMemoryProject,
    gesture: Gesture,
    undo: bool,
) -> Result<()> {
    let outcome = session.execute_gesture(gesture).await?;
    print_outcome(&outcome);
    print_schedule("schedule", project);

    if undo {
        if session.undo().await? {
            print_schedule("schedule after undo", project);
        } else {
            println!("nothing to undo");
        }
    }
    Ok(())
}

/// Turn `--task` plus `--move-to` / `--resize` into a gesture.
///
/// `Ok(None)` when no task was given.
fn gesture_from_args(args: &CliArgs) -> Result<Option<Gesture>> {
    let Some(task_id) = args.task.clone() else {
        return Ok(None);
    };

    if let Some(new_start) = args.move_to {
        return Ok(Some(Gesture::Move(BarMove { task_id, new_start })));
    }

    match args.resize.as_deref() {
        Some([new_start, new_end]) => Ok(Some(Gesture::Resize(BarResize {
            task_id,
            new_start: *new_start,
            new_end: *new_end,
        }))),
        Some(other) => bail!("--resize takes exactly two instants, got {}", other.len()),
        None => bail!("--task '{task_id}' needs either --move-to or --resize"),
    }
}

fn print_project(cfg: &ProjectFile) {
    println!("project {}", cfg.project.id);
    println!(
        "  scheduling: enabled={} max_cascading_depth={} default_lag={} preserve_task_duration={}",
        cfg.scheduling.enabled,
        cfg.scheduling.max_cascading_depth,
        cfg.scheduling.default_lag,
        cfg.scheduling.preserve_task_duration
    );
    println!();

    println!("tasks ({}):", cfg.task.len());
    for task in cfg.tasks() {
        println!("  - {:<12} {} ({}%)", task.id, task.schedule, task.progress);
    }

    let deps = cfg.dependencies();
    if !deps.is_empty() {
        println!("dependencies ({}):", deps.len());
        for dep in deps {
            println!("  - {dep}");
        }
    }

    if let Some(report) = cycle_report(cfg) {
        println!();
        println!("warning: {report}");
    }
}

fn print_preview(cfg: &ProjectFile, task_id: &str, preview: &Preview) {
    println!("autosched dry-run for task {task_id}");
    println!("  current:  {}", preview.current);
    println!("  proposed: {}", preview.proposed);
    println!();

    let impact = &preview.impact;
    println!("impact:");
    println!("  will_trigger: {}", impact.will_trigger);
    println!("  affected_tasks: {}", impact.estimated_affected_tasks);
    println!("  max_cascade_levels: {}", impact.max_cascade_levels);
    println!("  truncated_tasks: {}", impact.truncated_tasks);
    println!("  estimated_ms: {:.0}", impact.estimated_execution_time_ms);
    println!("  recommendation: {}", impact.recommendation);
    if let Some(cycle) = &impact.cycle {
        println!("  cycle: {}", cycle.join(" -> "));
    }

    match &preview.plan {
        Some(plan) if !plan.is_empty() => {
            println!();
            println!("cascade ({} updates):", plan.updates.len());
            for update in &plan.updates {
                println!("  - {:<12} {} => {}", update.task_id, update.previous, update.proposed);
            }
            if plan.is_truncated() {
                println!("  depth-truncated: {}", plan.truncated.join(", "));
            }
        }
        Some(_) => println!("cascade: no dependent task moves"),
        None => println!("cascade: refused"),
    }

    if let Some(report) = cycle_report(cfg) {
        println!();
        println!("warning: {report}");
    }
}

fn print_outcome(outcome: &GestureOutcome) {
    let mode = if outcome.auto_scheduled {
        "auto-scheduled"
    } else {
        "plain edit"
    };
    println!(
        "{} applied ({mode}): {}",
        outcome.command_id,
        outcome.affected_task_ids.join(", ")
    );
    if !outcome.truncated_task_ids.is_empty() {
        println!(
            "  left unmodified beyond depth limit: {}",
            outcome.truncated_task_ids.join(", ")
        );
    }
}

fn print_schedule(title: &str, project: &InMemoryProject) {
    println!();
    println!("{title}:");
    for task in project.tasks() {
        println!("  - {:<12} {}", task.id, task.schedule);
    }
}
