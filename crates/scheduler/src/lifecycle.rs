//! Subtask lifecycle state machine
//!
//! The transition table is plain data; [`validate_transition`] is the only
//! place that interprets it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Blocked => "blocked",
        }
    }

    pub fn is_terminal(&self) -> bool {
        allowed_transitions(*self).is_empty()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const TRANSITIONS: [(TaskStatus, &[TaskStatus]); 5] = [
    (
        TaskStatus::Pending,
        &[TaskStatus::InProgress, TaskStatus::Blocked],
    ),
    (
        TaskStatus::InProgress,
        &[TaskStatus::Completed, TaskStatus::Failed],
    ),
    (TaskStatus::Blocked, &[TaskStatus::InProgress]),
    (TaskStatus::Completed, &[]),
    (TaskStatus::Failed, &[]),
];

/// Legal targets from `from`
pub fn allowed_transitions(from: TaskStatus) -> &'static [TaskStatus] {
    TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .map(|(_, targets)| *targets)
        .unwrap_or(&[])
}

pub fn validate_transition(from: TaskStatus, to: TaskStatus) -> Result<(), LifecycleError> {
    let allowed = allowed_transitions(from);
    if allowed.contains(&to) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidStateTransition {
            from,
            to,
            allowed: allowed.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_lifecycle() {
        let legal: Vec<(TaskStatus, TaskStatus)> = TaskStatus::ALL
            .into_iter()
            .flat_map(|from| TaskStatus::ALL.into_iter().map(move |to| (from, to)))
            .filter(|(from, to)| validate_transition(*from, *to).is_ok())
            .collect();

        assert_eq!(
            legal,
            vec![
                (TaskStatus::Pending, TaskStatus::InProgress),
                (TaskStatus::Pending, TaskStatus::Blocked),
                (TaskStatus::InProgress, TaskStatus::Completed),
                (TaskStatus::InProgress, TaskStatus::Failed),
                (TaskStatus::Blocked, TaskStatus::InProgress),
            ]
        );
    }

    #[test]
    fn terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Blocked.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
    }

    #[test]
    fn rejection_names_current_status_and_targets() {
        let err = validate_transition(TaskStatus::Blocked, TaskStatus::Completed).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidStateTransition {
                from: TaskStatus::Blocked,
                to: TaskStatus::Completed,
                allowed: vec![TaskStatus::InProgress],
            }
        );
    }
}
