// src/engine/commands.rs

//! Concrete commands: a plain single-task edit and the composite
//! auto-scheduling command.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::dag::{CascadePlan, Dependency, TaskId};
use crate::engine::command::{
    ApplyFailure, Command, CommandContext, CommandFuture, CommandId, CommandKind, CommandState,
    Direction, ScheduleStep, apply_steps,
};
use crate::errors::{AutoschedError, Result};
use crate::store::TaskStore;

/// Run `steps` in `direction` and move `state` to `on_success`.
///
/// On failure the state is kept when the partial writes were rolled back and
/// becomes [`CommandState::Failed`] when they could not be.
async fn transition(
    store: &dyn TaskStore,
    steps: &[ScheduleStep],
    direction: Direction,
    state: &mut CommandState,
    on_success: CommandState,
) -> Result<()> {
    match apply_steps(store, steps, direction).await {
        Ok(()) => {
            *state = on_success;
            Ok(())
        }
        Err(ApplyFailure { error, compensated }) => {
            if !compensated {
                *state = CommandState::Failed;
            }
            Err(error)
        }
    }
}

fn validate_steps(steps: &[ScheduleStep]) -> Result<()> {
    for step in steps {
        if step.task_id.trim().is_empty() {
            return Err(AutoschedError::Validation("empty task id".to_string()));
        }
        if !step.target.is_well_formed() {
            return Err(AutoschedError::Validation(format!(
                "task '{}' would end ({}) before it starts ({})",
                step.task_id,
                step.target.end.to_rfc3339(),
                step.target.start.to_rfc3339()
            )));
        }
    }
    Ok(())
}

fn ensure_state(
    id: CommandId,
    state: CommandState,
    allowed: &[CommandState],
    action: &str,
) -> Result<()> {
    if allowed.contains(&state) {
        Ok(())
    } else {
        Err(AutoschedError::Validation(format!(
            "cannot {action} {id} while it is {state:?}"
        )))
    }
}

/// Move or resize one task, nothing else.
///
/// Used when auto-scheduling is disabled, when the task has no dependents,
/// or when the cascade turns out to change nothing.
#[derive(Debug)]
pub struct TaskScheduleCommand {
    id: CommandId,
    kind: CommandKind,
    store: Arc<dyn TaskStore>,
    step: [ScheduleStep; 1],
    state: CommandState,
    context: CommandContext,
}

impl TaskScheduleCommand {
    pub fn new(
        id: CommandId,
        kind: CommandKind,
        store: Arc<dyn TaskStore>,
        step: ScheduleStep,
    ) -> Self {
        let context = CommandContext::new().with_metadata("task", &step.task_id);
        Self {
            id,
            kind,
            store,
            step: [step],
            state: CommandState::Pending,
            context,
        }
    }

    pub fn step(&self) -> &ScheduleStep {
        &self.step[0]
    }
}

impl Command for TaskScheduleCommand {
    fn id(&self) -> CommandId {
        self.id
    }

    fn kind(&self) -> CommandKind {
        self.kind
    }

    fn description(&self) -> String {
        let step = self.step();
        match self.kind {
            CommandKind::BarResize => format!("Resize task {} to {}", step.task_id, step.target),
            _ => format!("Move task {} to {}", step.task_id, step.target),
        }
    }

    fn context(&self) -> &CommandContext {
        &self.context
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn validate(&self) -> Result<()> {
        validate_steps(&self.step)
    }

    fn execute(&mut self) -> CommandFuture<'_> {
        Box::pin(async move {
            ensure_state(
                self.id,
                self.state,
                &[CommandState::Pending, CommandState::Executed, CommandState::Undone],
                "execute",
            )?;
            self.context.touch();
            transition(
                self.store.as_ref(),
                &self.step,
                Direction::Forward,
                &mut self.state,
                CommandState::Executed,
            )
            .await
        })
    }

    fn undo(&mut self) -> CommandFuture<'_> {
        Box::pin(async move {
            ensure_state(self.id, self.state, &[CommandState::Executed], "undo")?;
            self.context.touch();
            transition(
                self.store.as_ref(),
                &self.step,
                Direction::Backward,
                &mut self.state,
                CommandState::Undone,
            )
            .await
        })
    }

    fn affected_task_ids(&self) -> Vec<TaskId> {
        vec![self.step().task_id.clone()]
    }
}

/// A primary bar edit plus every edit the scheduler derived from it,
/// executed and undone as one unit.
///
/// Steps are applied primary first, then derived tasks in cascade order
/// (predecessors before dependents). Undo walks the same list backwards.
#[derive(Debug)]
pub struct AutoScheduleCommand {
    id: CommandId,
    primary_kind: CommandKind,
    store: Arc<dyn TaskStore>,
    /// `steps[0]` is the primary edit.
    steps: Vec<ScheduleStep>,
    dependency_chain: Vec<Dependency>,
    truncated: Vec<TaskId>,
    state: CommandState,
    context: CommandContext,
}

impl AutoScheduleCommand {
    /// Build the composite from a cascade plan. `primary_kind` is the
    /// gesture that started it ([`CommandKind::BarMove`] or
    /// [`CommandKind::BarResize`]).
    pub fn from_plan(
        id: CommandId,
        primary_kind: CommandKind,
        store: Arc<dyn TaskStore>,
        plan: CascadePlan,
    ) -> Self {
        let mut steps = Vec::with_capacity(plan.updates.len() + 1);
        steps.push(ScheduleStep::new(
            plan.root.clone(),
            plan.root_previous,
            plan.root_proposed,
        ));
        steps.extend(
            plan.updates
                .into_iter()
                .map(|u| ScheduleStep::new(u.task_id, u.previous, u.proposed)),
        );

        let context = CommandContext::new()
            .with_metadata("task", &plan.root)
            .with_metadata("gesture", primary_kind)
            .with_metadata("derived_updates", steps.len() - 1)
            .with_metadata("max_depth", plan.max_depth_reached)
            .with_metadata("truncated", plan.truncated.len());

        debug!(
            command_id = %id,
            root = %plan.root,
            derived = steps.len() - 1,
            "built auto-schedule command"
        );

        Self {
            id,
            primary_kind,
            store,
            steps,
            dependency_chain: plan.dependency_chain,
            truncated: plan.truncated,
            state: CommandState::Pending,
            context,
        }
    }

    pub fn primary(&self) -> &ScheduleStep {
        &self.steps[0]
    }

    pub fn derived(&self) -> &[ScheduleStep] {
        &self.steps[1..]
    }

    /// Dependents beyond the depth limit, left unmodified.
    pub fn truncated(&self) -> &[TaskId] {
        &self.truncated
    }
}

impl Command for AutoScheduleCommand {
    fn id(&self) -> CommandId {
        self.id
    }

    fn kind(&self) -> CommandKind {
        CommandKind::AutoSchedule
    }

    fn description(&self) -> String {
        let verb = match self.primary_kind {
            CommandKind::BarResize => "Resize",
            _ => "Move",
        };
        format!(
            "{verb} task {} and reschedule {} dependent task(s)",
            self.primary().task_id,
            self.derived().len()
        )
    }

    fn context(&self) -> &CommandContext {
        &self.context
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn validate(&self) -> Result<()> {
        validate_steps(&self.steps)
    }

    fn execute(&mut self) -> CommandFuture<'_> {
        Box::pin(async move {
            ensure_state(
                self.id,
                self.state,
                &[CommandState::Pending, CommandState::Executed, CommandState::Undone],
                "execute",
            )?;
            self.context.touch();
            let result = transition(
                self.store.as_ref(),
                &self.steps,
                Direction::Forward,
                &mut self.state,
                CommandState::Executed,
            )
            .await;
            if let Err(err) = &result {
                warn!(command_id = %self.id, error = %err, "auto-schedule command failed");
            }
            result
        })
    }

    fn undo(&mut self) -> CommandFuture<'_> {
        Box::pin(async move {
            ensure_state(self.id, self.state, &[CommandState::Executed], "undo")?;
            self.context.touch();
            transition(
                self.store.as_ref(),
                &self.steps,
                Direction::Backward,
                &mut self.state,
                CommandState::Undone,
            )
            .await
        })
    }

    fn affected_task_ids(&self) -> Vec<TaskId> {
        self.steps.iter().map(|s| s.task_id.clone()).collect()
    }

    fn dependency_chain(&self) -> Vec<Dependency> {
        self.dependency_chain.clone()
    }
}
