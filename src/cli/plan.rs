use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use soultest_cli::TestPlan;

#[derive(Args, Clone, Debug)]
pub struct PlanPathArgs {
    /// Plan file (YAML or JSON)
    pub plan: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct FrontierArgs {
    /// Plan file (YAML or JSON)
    pub plan: PathBuf,

    /// Subtasks already completed
    #[arg(long, value_delimiter = ',')]
    pub completed: Vec<String>,
}

pub async fn cmd_validate(args: PlanPathArgs) -> Result<()> {
    let plan = TestPlan::load(&args.plan).await?;
    println!(
        "Plan '{}' is valid: {} subtask(s), {} dependency edge(s)",
        plan.name,
        plan.graph.node_count(),
        plan.graph.edge_count()
    );
    Ok(())
}

pub async fn cmd_order(args: PlanPathArgs) -> Result<()> {
    let plan = TestPlan::load(&args.plan).await?;
    for id in plan.order() {
        println!("{id}");
    }
    Ok(())
}

pub async fn cmd_frontier(args: FrontierArgs) -> Result<()> {
    let plan = TestPlan::load(&args.plan).await?;
    let completed: HashSet<String> = args
        .completed
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if let Some(unknown) = completed.iter().find(|id| !plan.graph.contains(id)) {
        bail!("unknown subtask: {unknown}");
    }

    let frontier = plan.graph.get_executable_nodes(&completed);
    if frontier.is_empty() {
        println!("No executable subtasks");
    }
    for id in frontier {
        println!("{id}");
    }
    Ok(())
}
