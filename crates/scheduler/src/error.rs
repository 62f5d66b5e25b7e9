use thiserror::Error;

use crate::lifecycle::TaskStatus;

/// Dependency graph construction errors
///
/// A failed call never leaves the graph modified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node already exists: {0}")]
    DuplicateNode(String),
    #[error("unknown node: {0}")]
    UnknownNode(String),
    #[error("edge {from} -> {to} would create a cycle")]
    CycleDetected { from: String, to: String },
}

/// Subtask lifecycle errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("invalid state transition from {from} to {to} (allowed: {})", format_allowed(.allowed))]
    InvalidStateTransition {
        from: TaskStatus,
        to: TaskStatus,
        allowed: Vec<TaskStatus>,
    },
    #[error("subtask {0} has no commands")]
    EmptyCommands(String),
}

fn format_allowed(allowed: &[TaskStatus]) -> String {
    if allowed.is_empty() {
        return "none".to_string();
    }
    allowed
        .iter()
        .map(TaskStatus::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
