use std::time::Instant;

use action_primitives::{Command, ExecutionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LifecycleError;
use crate::lifecycle::{validate_transition, TaskStatus};

/// Outcome attached to a subtask once it leaves `InProgress` or gets blocked
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubtaskResult {
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
    /// Per-command results, partial when the subtask failed
    #[serde(default)]
    pub steps: Vec<ExecutionResult>,
}

impl SubtaskResult {
    /// Number of steps that only succeeded after healing
    pub fn refined_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.refined).count()
    }
}

/// Unit of work: an ordered, immutable command list plus lifecycle state
#[derive(Clone, Debug, Serialize)]
pub struct Subtask {
    id: String,
    description: String,
    commands: Vec<Command>,
    status: TaskStatus,
    result: Option<SubtaskResult>,
    #[serde(skip)]
    started_at: Option<Instant>,
}

impl Subtask {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        commands: Vec<Command>,
    ) -> Result<Self, LifecycleError> {
        let id = id.into();
        if commands.is_empty() {
            return Err(LifecycleError::EmptyCommands(id));
        }
        Ok(Self {
            id,
            description: description.into(),
            commands,
            status: TaskStatus::Pending,
            result: None,
            started_at: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn result(&self) -> Option<&SubtaskResult> {
        self.result.as_ref()
    }

    fn transition(&mut self, to: TaskStatus) -> Result<(), LifecycleError> {
        validate_transition(self.status, to)?;
        debug!(subtask = %self.id, from = %self.status, to = %to, "status change");
        self.status = to;
        Ok(())
    }

    fn elapsed_ms(&self) -> u64 {
        self.started_at
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Start the execution timer
    pub fn mark_in_progress(&mut self) -> Result<(), LifecycleError> {
        self.transition(TaskStatus::InProgress)?;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    pub fn mark_completed(&mut self, steps: Vec<ExecutionResult>) -> Result<(), LifecycleError> {
        self.transition(TaskStatus::Completed)?;
        let result = SubtaskResult {
            success: true,
            error: None,
            duration_ms: self.elapsed_ms(),
            completed_at: Utc::now(),
            steps,
        };
        info!(subtask = %self.id, duration_ms = result.duration_ms, "subtask completed");
        self.result = Some(result);
        Ok(())
    }

    /// Fail with `error`, keeping whatever per-command results were gathered
    pub fn mark_failed(
        &mut self,
        error: impl Into<String>,
        partial: Vec<ExecutionResult>,
    ) -> Result<(), LifecycleError> {
        self.transition(TaskStatus::Failed)?;
        let result = SubtaskResult {
            success: false,
            error: Some(error.into()),
            duration_ms: self.elapsed_ms(),
            completed_at: Utc::now(),
            steps: partial,
        };
        warn!(
            subtask = %self.id,
            error = result.error.as_deref().unwrap_or_default(),
            "subtask failed"
        );
        self.result = Some(result);
        Ok(())
    }

    pub fn mark_blocked(&mut self, reason: impl Into<String>) -> Result<(), LifecycleError> {
        self.transition(TaskStatus::Blocked)?;
        let reason = reason.into();
        warn!(subtask = %self.id, %reason, "subtask blocked");
        self.result = Some(SubtaskResult {
            success: false,
            error: Some(format!("blocked: {reason}")),
            duration_ms: 0,
            completed_at: Utc::now(),
            steps: Vec::new(),
        });
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == TaskStatus::InProgress
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }

    pub fn is_blocked(&self) -> bool {
        self.status == TaskStatus::Blocked
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
