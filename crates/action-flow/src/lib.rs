//! Command Execution Layer
//!
//! Runs single browser commands against a driver with bounded retries,
//! classifies terminal failures, and performs at most one oracle-assisted
//! healing attempt per command.

pub mod classify;
pub mod errors;
pub mod executor;
pub mod observer;
pub mod strategies;
pub mod types;

pub use classify::classify_failure;
pub use errors::FlowError;
pub use executor::{CommandExecutor, DefaultCommandExecutor, PARAM_WAIT_MS};
pub use observer::{ExecutionEvent, ExecutionObserver, NoopObserver, RecordingObserver};
pub use strategies::RetryPolicy;
pub use types::ExecutorConfig;
