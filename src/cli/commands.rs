use clap::Subcommand;

use super::config::ConfigArgs;
use super::plan::{FrontierArgs, PlanPathArgs};

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Load a plan and check its dependency graph
    Validate(PlanPathArgs),

    /// Print the subtasks of a plan in dependency order
    Order(PlanPathArgs),

    /// Print the subtasks that may run given a set of completed ones
    Frontier(FrontierArgs),

    /// Inspect configuration
    Config(ConfigArgs),
}
