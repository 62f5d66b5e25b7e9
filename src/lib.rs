//! SoulTest library
//!
//! Run orchestration on top of the execution core crates, plus the pieces
//! the `soultest` binary needs: configuration, plan files and the
//! OpenAI-compatible healing oracle.

pub mod config;
pub mod healing;
pub mod plan;
pub mod runner;

pub use config::{load_config, HealingConfig, LoadedConfig, RunnerConfig, SchedulerConfig};
pub use healing::OpenAiHealingOracle;
pub use plan::{PlanError, PlanFile, PlanSubtask, TestPlan};
pub use runner::{RunSummary, SessionFactory, SubtaskReport, TestRunner};
