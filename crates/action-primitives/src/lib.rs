//! L3 Action Primitives - Command model and browser driver capability
//!
//! This crate provides the building blocks shared by the execution core:
//! - Validated, immutable commands (navigation, interaction, assertion, utility)
//! - Selector specs with ordered fallbacks
//! - Execution results and failure diagnostics
//! - The `BrowserDriver` capability every browser backend implements

pub mod command;
mod driver;
pub mod errors;
pub mod selector;
pub mod types;

pub use command::*;
pub use driver::*;
pub use errors::*;
pub use selector::*;
pub use types::*;

#[cfg(feature = "test-support")]
pub mod testing;
