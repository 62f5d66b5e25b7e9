//! Browser driver capability
//!
//! The execution core never talks to a browser directly. Everything goes
//! through this trait, which a CDP, WebDriver or test double implements.

use async_trait::async_trait;
use std::time::Duration;

use crate::command::{CommandParams, CommandType};
use crate::errors::DriverError;
use crate::selector::SelectorStrategy;
use crate::types::ElementHandle;

/// Browser driver trait
///
/// Every call must resolve or reject within a caller-observable time. One
/// driver instance represents one exclusively owned browser session.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Wait up to `timeout` for an element matching `strategy`/`value` to be attached
    async fn locate(
        &self,
        strategy: SelectorStrategy,
        value: &str,
        timeout: Duration,
    ) -> Result<ElementHandle, DriverError>;

    /// Perform an action, optionally against a located element
    async fn perform(
        &self,
        action: CommandType,
        element: Option<&ElementHandle>,
        params: &CommandParams,
    ) -> Result<(), DriverError>;

    /// URL of the current page
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Serialized DOM of the current page
    async fn dom_snapshot(&self) -> Result<String, DriverError>;

    /// PNG screenshot of the current page
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        Err(DriverError::Unsupported("screenshot".to_string()))
    }
}
