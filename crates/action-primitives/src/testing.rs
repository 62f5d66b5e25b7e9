//! Scripted in-memory driver for tests
//!
//! Elements are "attached" by registering strategy/value pairs; actions can
//! be told to fail always or a fixed number of times. Every call is recorded
//! so tests can assert on attempt counts and ordering.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::command::{CommandParams, CommandType};
use crate::driver::BrowserDriver;
use crate::errors::DriverError;
use crate::selector::SelectorStrategy;
use crate::types::ElementHandle;

#[derive(Default)]
struct ScriptState {
    attached: HashSet<(SelectorStrategy, String)>,
    always_fail: HashMap<CommandType, DriverError>,
    fail_times: HashMap<CommandType, (u32, DriverError)>,
    url: String,
    dom: String,
    screenshot: Option<Vec<u8>>,
    locate_calls: Vec<(SelectorStrategy, String)>,
    perform_calls: Vec<(CommandType, Option<String>)>,
    next_handle: u64,
}

/// In-memory [`BrowserDriver`] driven by a script
pub struct ScriptedDriver {
    state: Mutex<ScriptState>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                url: "about:blank".to_string(),
                dom: "<html><body></body></html>".to_string(),
                ..ScriptState::default()
            }),
        }
    }

    /// Make an element resolvable
    pub fn attach(self, strategy: SelectorStrategy, value: &str) -> Self {
        self.state
            .lock()
            .attached
            .insert((strategy, value.to_string()));
        self
    }

    /// Make every `action` fail with `error`
    pub fn fail_always(self, action: CommandType, error: DriverError) -> Self {
        self.state.lock().always_fail.insert(action, error);
        self
    }

    /// Make the next `times` calls of `action` fail with `error`
    pub fn fail_times(self, action: CommandType, times: u32, error: DriverError) -> Self {
        self.state.lock().fail_times.insert(action, (times, error));
        self
    }

    pub fn with_url(self, url: &str) -> Self {
        self.state.lock().url = url.to_string();
        self
    }

    pub fn with_dom(self, dom: &str) -> Self {
        self.state.lock().dom = dom.to_string();
        self
    }

    pub fn with_screenshot(self, png: Vec<u8>) -> Self {
        self.state.lock().screenshot = Some(png);
        self
    }

    /// Every locate call made so far, in order
    pub fn locate_calls(&self) -> Vec<(SelectorStrategy, String)> {
        self.state.lock().locate_calls.clone()
    }

    /// Every perform call made so far with the selector it targeted
    pub fn perform_calls(&self) -> Vec<(CommandType, Option<String>)> {
        self.state.lock().perform_calls.clone()
    }

    pub fn perform_count(&self, action: CommandType) -> usize {
        self.state
            .lock()
            .perform_calls
            .iter()
            .filter(|(kind, _)| *kind == action)
            .count()
    }
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn locate(
        &self,
        strategy: SelectorStrategy,
        value: &str,
        _timeout: Duration,
    ) -> Result<ElementHandle, DriverError> {
        let mut state = self.state.lock();
        state.locate_calls.push((strategy, value.to_string()));
        if state.attached.contains(&(strategy, value.to_string())) {
            state.next_handle += 1;
            let id = format!("node-{}", state.next_handle);
            Ok(ElementHandle::new(id, strategy, value))
        } else {
            Err(DriverError::NotFound(format!("{}:{}", strategy, value)))
        }
    }

    async fn perform(
        &self,
        action: CommandType,
        element: Option<&ElementHandle>,
        params: &CommandParams,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state
            .perform_calls
            .push((action, element.map(|handle| handle.selector.clone())));

        if let Some(error) = state.always_fail.get(&action) {
            return Err(error.clone());
        }
        if let Some((remaining, error)) = state.fail_times.get_mut(&action) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(error.clone());
            }
        }
        if action == CommandType::Navigate {
            if let Some(url) = params.get(crate::command::PARAM_URL) {
                state.url = url.clone();
            }
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().url.clone())
    }

    async fn dom_snapshot(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().dom.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.state
            .lock()
            .screenshot
            .clone()
            .ok_or_else(|| DriverError::Unsupported("screenshot".to_string()))
    }
}
