//! Command model
//!
//! Commands are validated when they are built and are immutable afterwards.
//! Healing never edits a command in place; it derives a new one through
//! [`Command::with_selector`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::ActionError;
use crate::selector::SelectorSpec;

/// Parameter mapping attached to a command
pub type CommandParams = BTreeMap<String, String>;

/// Parameter key holding the navigation target
pub const PARAM_URL: &str = "url";

/// Parameter key holding text to enter, option to pick, key to press or expected text
pub const PARAM_VALUE: &str = "value";

/// Optional parameter with a human description of the target element
pub const PARAM_DESCRIPTION: &str = "description";

/// Broad family a command type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    Navigation,
    Interaction,
    Assertion,
    Utility,
}

/// Command type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    // Navigation
    Navigate,
    GoBack,
    Reload,

    // Interaction
    Click,
    DoubleClick,
    Fill,
    Type,
    Select,
    Check,
    Uncheck,
    Hover,
    Press,

    // Assertion
    AssertVisible,
    AssertHidden,
    AssertText,
    AssertValue,

    // Utility
    Wait,
    Screenshot,
}

impl CommandType {
    /// Get command name as string
    pub fn name(&self) -> &'static str {
        match self {
            CommandType::Navigate => "navigate",
            CommandType::GoBack => "go_back",
            CommandType::Reload => "reload",
            CommandType::Click => "click",
            CommandType::DoubleClick => "double_click",
            CommandType::Fill => "fill",
            CommandType::Type => "type",
            CommandType::Select => "select",
            CommandType::Check => "check",
            CommandType::Uncheck => "uncheck",
            CommandType::Hover => "hover",
            CommandType::Press => "press",
            CommandType::AssertVisible => "assert_visible",
            CommandType::AssertHidden => "assert_hidden",
            CommandType::AssertText => "assert_text",
            CommandType::AssertValue => "assert_value",
            CommandType::Wait => "wait",
            CommandType::Screenshot => "screenshot",
        }
    }

    pub fn category(&self) -> CommandCategory {
        match self {
            CommandType::Navigate | CommandType::GoBack | CommandType::Reload => {
                CommandCategory::Navigation
            }
            CommandType::Click
            | CommandType::DoubleClick
            | CommandType::Fill
            | CommandType::Type
            | CommandType::Select
            | CommandType::Check
            | CommandType::Uncheck
            | CommandType::Hover
            | CommandType::Press => CommandCategory::Interaction,
            CommandType::AssertVisible
            | CommandType::AssertHidden
            | CommandType::AssertText
            | CommandType::AssertValue => CommandCategory::Assertion,
            CommandType::Wait | CommandType::Screenshot => CommandCategory::Utility,
        }
    }

    /// Interaction and assertion commands target an element
    pub fn requires_selector(&self) -> bool {
        matches!(
            self.category(),
            CommandCategory::Interaction | CommandCategory::Assertion
        )
    }

    pub fn requires_url(&self) -> bool {
        matches!(self, CommandType::Navigate)
    }

    /// Fill-type commands need a `value` parameter
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            CommandType::Fill
                | CommandType::Type
                | CommandType::Select
                | CommandType::Press
                | CommandType::AssertText
                | CommandType::AssertValue
        )
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single validated browser command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCommand", into = "RawCommand")]
pub struct Command {
    kind: CommandType,
    params: CommandParams,
    selector: Option<SelectorSpec>,
}

impl Command {
    /// Build a command, rejecting invalid type/parameter/selector combinations
    pub fn new(
        kind: CommandType,
        params: CommandParams,
        selector: Option<SelectorSpec>,
    ) -> Result<Self, ActionError> {
        if kind.requires_selector() && selector.is_none() {
            return Err(ActionError::InvalidCommand(format!(
                "{} requires a selector",
                kind
            )));
        }
        if let Some(spec) = &selector {
            spec.validate()?;
        }
        if kind.requires_url() && !has_non_empty(&params, PARAM_URL) {
            return Err(ActionError::InvalidCommand(format!(
                "{} requires a '{}' parameter",
                kind, PARAM_URL
            )));
        }
        if kind.requires_value() && !params.contains_key(PARAM_VALUE) {
            return Err(ActionError::InvalidCommand(format!(
                "{} requires a '{}' parameter",
                kind, PARAM_VALUE
            )));
        }

        Ok(Self {
            kind,
            params,
            selector,
        })
    }

    pub fn navigate(url: impl Into<String>) -> Result<Self, ActionError> {
        Self::new(
            CommandType::Navigate,
            CommandParams::from([(PARAM_URL.to_string(), url.into())]),
            None,
        )
    }

    pub fn click(selector: SelectorSpec) -> Result<Self, ActionError> {
        Self::new(CommandType::Click, CommandParams::new(), Some(selector))
    }

    pub fn fill(selector: SelectorSpec, value: impl Into<String>) -> Result<Self, ActionError> {
        Self::new(
            CommandType::Fill,
            CommandParams::from([(PARAM_VALUE.to_string(), value.into())]),
            Some(selector),
        )
    }

    pub fn assert_visible(selector: SelectorSpec) -> Result<Self, ActionError> {
        Self::new(CommandType::AssertVisible, CommandParams::new(), Some(selector))
    }

    pub fn assert_text(
        selector: SelectorSpec,
        expected: impl Into<String>,
    ) -> Result<Self, ActionError> {
        Self::new(
            CommandType::AssertText,
            CommandParams::from([(PARAM_VALUE.to_string(), expected.into())]),
            Some(selector),
        )
    }

    /// Copy of this command targeting a different selector
    pub fn with_selector(&self, selector: SelectorSpec) -> Self {
        Self {
            kind: self.kind,
            params: self.params.clone(),
            selector: Some(selector),
        }
    }

    pub fn kind(&self) -> CommandType {
        self.kind
    }

    pub fn params(&self) -> &CommandParams {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn selector(&self) -> Option<&SelectorSpec> {
        self.selector.as_ref()
    }

    pub fn url(&self) -> Option<&str> {
        self.param(PARAM_URL)
    }

    pub fn value(&self) -> Option<&str> {
        self.param(PARAM_VALUE)
    }

    /// Short natural-language description of the targeted element
    pub fn target_description(&self) -> String {
        if let Some(description) = self.param(PARAM_DESCRIPTION) {
            return description.to_string();
        }
        match (&self.selector, self.value()) {
            (Some(selector), Some(value)) => format!(
                "element matched by {} for {} with value '{}'",
                selector, self.kind, value
            ),
            (Some(selector), None) => {
                format!("element matched by {} for {}", selector, self.kind)
            }
            (None, _) => format!("page target of {}", self.kind),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.selector, self.url()) {
            (Some(selector), _) => write!(f, "{} {}", self.kind, selector),
            (None, Some(url)) => write!(f, "{} {}", self.kind, url),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

fn has_non_empty(params: &CommandParams, key: &str) -> bool {
    params
        .get(key)
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false)
}

/// Wire shape of a command; converted through [`Command::new`] on deserialize
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCommand {
    #[serde(rename = "type")]
    kind: CommandType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    params: CommandParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selector: Option<SelectorSpec>,
}

impl TryFrom<RawCommand> for Command {
    type Error = ActionError;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        Command::new(raw.kind, raw.params, raw.selector)
    }
}

impl From<Command> for RawCommand {
    fn from(command: Command) -> Self {
        Self {
            kind: command.kind,
            params: command.params,
            selector: command.selector,
        }
    }
}
