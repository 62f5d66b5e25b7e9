//! Plan files: subtasks with dependencies, as produced by the planner

use std::path::Path;

use action_primitives::Command;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use soultest_scheduler::{DependencyGraph, GraphError, LifecycleError, Subtask};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to parse plan: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error(transparent)]
    Subtask(#[from] LifecycleError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Wire shape of a plan; YAML or JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subtasks: Vec<PlanSubtask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSubtask {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub commands: Vec<Command>,
}

/// Validated plan with its dependency graph built
#[derive(Debug, Clone)]
pub struct TestPlan {
    pub name: String,
    pub graph: DependencyGraph<Subtask>,
}

impl TestPlan {
    /// Add every subtask first, then every dependency edge
    pub fn from_file(file: PlanFile) -> Result<Self, PlanError> {
        let mut graph = DependencyGraph::new();
        let mut edges = Vec::new();

        for raw in file.subtasks {
            let subtask = Subtask::new(raw.id.clone(), raw.description, raw.commands)?;
            graph.add_node(raw.id.clone(), subtask)?;
            edges.extend(raw.depends_on.into_iter().map(|dep| (dep, raw.id.clone())));
        }
        for (from, to) in &edges {
            graph.add_edge(from, to)?;
        }

        debug!(
            plan = %file.name,
            subtasks = graph.node_count(),
            edges = graph.edge_count(),
            "plan graph built"
        );
        Ok(Self {
            name: file.name,
            graph,
        })
    }

    pub fn parse(text: &str) -> Result<Self, PlanError> {
        let file: PlanFile = serde_yaml::from_str(text)?;
        Self::from_file(file)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read plan {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid plan {}", path.display()))
    }

    pub fn order(&self) -> Vec<String> {
        self.graph.topological_sort()
    }

    pub fn subtask(&self, id: &str) -> Option<&Subtask> {
        self.graph.payload(id)
    }
}
