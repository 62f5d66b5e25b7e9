//! Scheduling core: dependency graph plus subtask lifecycle.

pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod model;

pub use error::{GraphError, LifecycleError};
pub use graph::DependencyGraph;
pub use lifecycle::{allowed_transitions, validate_transition, TaskStatus};
pub use model::{Subtask, SubtaskResult};
