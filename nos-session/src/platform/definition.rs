//! Platform definition for vendor-specific configurations.

use serde::Deserialize;

use super::privilege_level::{PrivilegeLevel, PrivilegeLevelSpec};
use crate::error::PlatformError;

/// Platform definition containing all vendor-specific configuration.
///
/// Prompt patterns drift between firmware releases, so a definition is
/// plain data: build it in code with the `with_*` methods, or load a
/// [`PlatformSpec`] from a file.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "nokia_srl").
    pub name: String,

    /// Privilege levels for this platform, in definition order.
    ///
    /// Names are not checked here; duplicates are rejected when a session
    /// builds its privilege graph.
    pub privilege_levels: Vec<PrivilegeLevel>,

    /// Default privilege level after connection.
    pub default_privilege: String,

    /// Privilege level used for configuration submissions.
    pub configuration_privilege: String,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when connection is established.
    pub on_open_commands: Vec<String>,

    /// Literal written to the channel by the on-close hook.
    pub close_input: String,

    /// Literal sent to discard an in-progress configuration edit.
    pub abort_input: Option<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege_levels: vec![],
            default_privilege: String::new(),
            configuration_privilege: "configuration".to_string(),
            failed_when_contains: vec![],
            on_open_commands: vec![],
            close_input: "exit".to_string(),
            abort_input: None,
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Add a privilege level.
    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.push(level);
        self
    }

    /// Set the default privilege level.
    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    /// Set the privilege level configuration commands are sent from.
    pub fn with_configuration_privilege(mut self, name: impl Into<String>) -> Self {
        self.configuration_privilege = name.into();
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set the literal written before the transport is torn down.
    pub fn with_close_input(mut self, input: impl Into<String>) -> Self {
        self.close_input = input.into();
        self
    }

    /// Set the literal used to discard an in-progress configuration edit.
    pub fn with_abort_input(mut self, input: impl Into<String>) -> Self {
        self.abort_input = Some(input.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Get a privilege level by name.
    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.iter().find(|level| level.name == name)
    }

    /// Find the first failure pattern contained in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }
}

fn default_configuration_privilege() -> String {
    "configuration".to_string()
}

fn default_close_input() -> String {
    "exit".to_string()
}

fn default_terminal_width() -> u32 {
    511
}

fn default_terminal_height() -> u32 {
    24
}

/// Serializable form of a [`PlatformDefinition`].
///
/// ```rust
/// use nos_session::platform::PlatformSpec;
///
/// let spec: PlatformSpec = serde_json::from_str(r##"{
///     "name": "lab",
///     "default_privilege": "exec",
///     "levels": [{ "name": "exec", "pattern": "#\\s*$" }]
/// }"##).unwrap();
/// let platform = spec.into_definition().unwrap();
/// assert_eq!(platform.default_privilege, "exec");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSpec {
    pub name: String,
    pub levels: Vec<PrivilegeLevelSpec>,
    pub default_privilege: String,
    #[serde(default = "default_configuration_privilege")]
    pub configuration_privilege: String,
    #[serde(default)]
    pub failed_when_contains: Vec<String>,
    #[serde(default)]
    pub on_open_commands: Vec<String>,
    #[serde(default = "default_close_input")]
    pub close_input: String,
    #[serde(default)]
    pub abort_input: Option<String>,
    #[serde(default = "default_terminal_width")]
    pub terminal_width: u32,
    #[serde(default = "default_terminal_height")]
    pub terminal_height: u32,
}

impl PlatformSpec {
    /// Compile all patterns and build the [`PlatformDefinition`].
    ///
    /// Graph shape is validated later, when a session is built from it.
    pub fn into_definition(self) -> Result<PlatformDefinition, PlatformError> {
        let mut platform = PlatformDefinition::new(self.name)
            .with_default_privilege(self.default_privilege)
            .with_configuration_privilege(self.configuration_privilege)
            .with_close_input(self.close_input)
            .with_terminal_size(self.terminal_width, self.terminal_height);

        for level in &self.levels {
            if platform.get_privilege(&level.name).is_some() {
                return Err(PlatformError::InvalidDefinition {
                    message: format!("duplicate privilege level '{}'", level.name),
                });
            }
            platform = platform.with_privilege(level.compile()?);
        }

        platform.failed_when_contains = self.failed_when_contains;
        platform.on_open_commands = self.on_open_commands;
        platform.abort_input = self.abort_input;
        Ok(platform)
    }
}
