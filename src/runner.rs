//! Run orchestration over a plan's dependency graph
//!
//! The runner owns every subtask lifecycle. It walks the graph frontier in
//! topological order, blocks subtasks whose dependencies did not complete,
//! and gives each running subtask its own browser session.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use action_flow::{
    CommandExecutor, DefaultCommandExecutor, ExecutionEvent, ExecutorConfig, FlowError,
    RecordingObserver,
};
use action_locator::HealingOracle;
use action_primitives::BrowserDriver;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use soultest_core_types::{RunId, SessionId};
use soultest_scheduler::{DependencyGraph, Subtask, SubtaskResult, TaskStatus};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::RunnerConfig;
use crate::healing::OpenAiHealingOracle;
use crate::plan::TestPlan;

/// Opens one independent browser session per running subtask
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, session: &SessionId) -> Result<Arc<dyn BrowserDriver>>;

    async fn close(&self, _session: &SessionId) {}
}

#[derive(Debug, Clone, Serialize)]
pub struct SubtaskReport {
    pub id: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SubtaskResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub plan: String,
    pub success: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub blocked: usize,
    /// Subtasks never started, only possible after cancellation
    pub pending: usize,
    /// Commands that only succeeded through a healed selector
    pub healed_commands: usize,
    pub retries: usize,
    pub subtasks: Vec<SubtaskReport>,
}

impl RunSummary {
    fn collect(
        run_id: RunId,
        plan: &str,
        graph: &DependencyGraph<Subtask>,
        order: &[String],
        started_at: DateTime<Utc>,
        duration_ms: u64,
        recorder: &RecordingObserver,
    ) -> Self {
        let subtasks: Vec<SubtaskReport> = order
            .iter()
            .filter_map(|id| graph.payload(id))
            .map(|task| SubtaskReport {
                id: task.id().to_string(),
                description: task.description().to_string(),
                status: task.status(),
                result: task.result().cloned(),
            })
            .collect();
        let count = |status: TaskStatus| subtasks.iter().filter(|s| s.status == status).count();

        let completed = count(TaskStatus::Completed);
        Self {
            run_id,
            plan: plan.to_string(),
            success: completed == subtasks.len(),
            started_at,
            duration_ms,
            total: subtasks.len(),
            completed,
            failed: count(TaskStatus::Failed),
            blocked: count(TaskStatus::Blocked),
            pending: count(TaskStatus::Pending),
            healed_commands: subtasks
                .iter()
                .filter_map(|s| s.result.as_ref())
                .map(SubtaskResult::refined_steps)
                .sum(),
            retries: recorder.count(|e| matches!(e, ExecutionEvent::RetryScheduled { .. })),
            subtasks,
        }
    }

    pub fn subtask(&self, id: &str) -> Option<&SubtaskReport> {
        self.subtasks.iter().find(|s| s.id == id)
    }
}

pub struct TestRunner {
    sessions: Arc<dyn SessionFactory>,
    executor_config: ExecutorConfig,
    max_parallel: usize,
    oracle: Option<Arc<dyn HealingOracle>>,
    cancel: CancellationToken,
}

impl TestRunner {
    /// Build a runner; a `healing` section wires in the OpenAI-compatible oracle
    pub fn new(sessions: Arc<dyn SessionFactory>, config: &RunnerConfig) -> Result<Self> {
        config.validate()?;
        let oracle = match &config.healing {
            Some(healing) => {
                let oracle = OpenAiHealingOracle::from_env(healing.clone())
                    .context("Failed to set up healing oracle")?;
                info!(model = %healing.model, api_base = %healing.api_base, "healing oracle enabled");
                Some(Arc::new(oracle) as Arc<dyn HealingOracle>)
            }
            None => None,
        };
        Ok(Self {
            sessions,
            executor_config: config.executor.clone(),
            max_parallel: config.scheduler.max_parallel,
            oracle,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn HealingOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Cancelling stops new subtasks and interrupts running commands
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&self, plan: TestPlan) -> Result<RunSummary> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let clock = Instant::now();
        let recorder = Arc::new(RecordingObserver::new());
        let TestPlan { name, mut graph } = plan;

        let order = graph.topological_sort();
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(index, id)| (id.as_str(), index))
            .collect();
        info!(run = %run_id, plan = %name, subtasks = order.len(), "run started");

        let mut done: HashSet<String> = HashSet::new();
        'frontier: loop {
            if self.cancel.is_cancelled() {
                warn!(run = %run_id, "run cancelled, remaining subtasks stay pending");
                break;
            }

            let mut frontier = graph.get_executable_nodes(&done);
            if frontier.is_empty() {
                break;
            }
            frontier.sort_by_key(|id| position.get(id.as_str()).copied().unwrap_or(usize::MAX));

            let mut runnable = Vec::new();
            for id in frontier {
                match unfinished_dependency(&graph, &id)? {
                    Some(dep) => {
                        if let Some(task) = graph.payload_mut(&id) {
                            task.mark_blocked(format!("dependency {dep} failed"))?;
                        }
                        done.insert(id);
                    }
                    None => runnable.push(id),
                }
            }

            for chunk in runnable.chunks(self.max_parallel) {
                if self.cancel.is_cancelled() {
                    warn!(run = %run_id, "run cancelled, remaining subtasks stay pending");
                    break 'frontier;
                }
                let tasks: Vec<Subtask> = chunk
                    .iter()
                    .filter_map(|id| graph.payload(id).cloned())
                    .collect();
                let finished = join_all(
                    tasks
                        .into_iter()
                        .map(|task| self.run_subtask(task, recorder.clone())),
                )
                .await;

                for task in finished {
                    let task = task?;
                    let id = task.id().to_string();
                    if let Some(slot) = graph.payload_mut(&id) {
                        *slot = task;
                    }
                    done.insert(id);
                }
            }
        }

        let summary = RunSummary::collect(
            run_id,
            &name,
            &graph,
            &order,
            started_at,
            clock.elapsed().as_millis() as u64,
            &recorder,
        );
        info!(
            run = %summary.run_id,
            completed = summary.completed,
            failed = summary.failed,
            blocked = summary.blocked,
            healed = summary.healed_commands,
            "run finished"
        );
        Ok(summary)
    }

    async fn run_subtask(&self, mut task: Subtask, recorder: Arc<RecordingObserver>) -> Result<Subtask> {
        let session = SessionId::for_subtask(task.id());
        let driver = match self.sessions.open(&session).await {
            Ok(driver) => driver,
            Err(err) => {
                task.mark_in_progress()?;
                task.mark_failed(format!("failed to open browser session: {err:#}"), Vec::new())?;
                return Ok(task);
            }
        };

        task.mark_in_progress()?;
        info!(subtask = %task.id(), session = %session, "subtask started");

        let mut executor = DefaultCommandExecutor::new(driver, self.executor_config.clone())
            .with_observer(recorder)
            .with_cancellation(self.cancel.child_token());
        if let Some(oracle) = &self.oracle {
            executor = executor.with_oracle(oracle.clone());
        }

        let steps = executor.execute_all(task.commands()).await;
        self.sessions.close(&session).await;

        match steps.iter().position(|step| !step.success) {
            None => task.mark_completed(steps)?,
            Some(index) => {
                let error = FlowError::command_failed(&task.commands()[index], &steps[index]);
                task.mark_failed(error.to_string(), steps)?;
            }
        }
        Ok(task)
    }
}

/// First dependency of `id` that failed or was blocked
fn unfinished_dependency(graph: &DependencyGraph<Subtask>, id: &str) -> Result<Option<String>> {
    Ok(graph.get_dependencies(id)?.into_iter().find(|dep| {
        graph
            .payload(dep)
            .map(|task| task.is_failed() || task.is_blocked())
            .unwrap_or(false)
    }))
}
