// src/engine/mod.rs

//! Command execution engine.
//!
//! This module ties together:
//! - reversible commands ([`command`], [`commands`])
//! - the bounded undo/redo history ([`history`])
//! - buffered telemetry ([`telemetry`]) and its background flush/cleanup
//!   loop ([`maintenance`])
//! - the per-gesture orchestrator ([`session`])
//!
//! Everything that touches task data goes through the history, which owns
//! the only path to the persistence collaborator.

pub mod command;
pub mod commands;
pub mod history;
pub mod maintenance;
pub mod session;
pub mod telemetry;

pub use command::{
    Command, CommandContext, CommandFuture, CommandId, CommandKind, CommandState, HistoryAction,
    ScheduleStep,
};
pub use commands::{AutoScheduleCommand, TaskScheduleCommand};
pub use history::{CommandHistory, HistoryEntry};
pub use maintenance::{MaintenanceHandle, spawn_maintenance};
pub use session::{
    BarMove, BarResize, Collaborators, Gesture, GestureOutcome, Notifier, Preview,
    SchedulingSession, SessionEvent,
};
pub use telemetry::{TelemetryBuffer, TelemetryRecord, TelemetrySink, TracingTelemetrySink};
