//! Privilege level definition.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

/// A privilege level definition for a network device.
///
/// Privilege levels form a tree where each level can have a parent
/// (previous_priv) and commands to escalate/de-escalate between levels.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this privilege level (e.g., "exec", "configuration").
    pub name: String,

    /// Regex pattern to match the prompt for this privilege level.
    ///
    /// Always compiled in multi-line mode so `^`/`$` anchor on line boundaries.
    pub pattern: Regex,

    /// Name of the parent privilege level (None for root level).
    pub previous_priv: Option<String>,

    /// Command to escalate TO this level from the parent.
    pub escalate_command: Option<String>,

    /// Command to de-escalate FROM this level to the parent.
    pub deescalate_command: Option<String>,

    /// Whether escalation requires authentication (password).
    pub escalate_auth: bool,

    /// Pattern to match the authentication prompt (if escalate_auth is true).
    pub escalate_prompt: Option<Regex>,
}

impl PrivilegeLevel {
    /// Create a new privilege level with minimal required fields.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: compile_prompt_pattern(pattern)?,
            previous_priv: None,
            escalate_command: None,
            deescalate_command: None,
            escalate_auth: false,
            escalate_prompt: None,
        })
    }

    /// Set the parent privilege level.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.previous_priv = Some(parent.into());
        self
    }

    /// Set the escalation command.
    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = Some(command.into());
        self
    }

    /// Set the de-escalation command.
    pub fn with_deescalate(mut self, command: impl Into<String>) -> Self {
        self.deescalate_command = Some(command.into());
        self
    }

    /// Set that escalation requires authentication.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.escalate_auth = true;
        self.escalate_prompt = Some(compile_prompt_pattern(prompt_pattern)?);
        Ok(self)
    }

    /// Whether this is a root level (no parent).
    pub fn is_root(&self) -> bool {
        self.previous_priv.is_none()
    }
}

/// Compile a prompt pattern in multi-line mode.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).multi_line(true).build()
}

/// Serializable form of a [`PrivilegeLevel`], for loading level tables
/// from configuration files.
#[derive(Debug, Clone, Deserialize)]
pub struct PrivilegeLevelSpec {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub previous_priv: Option<String>,
    #[serde(default)]
    pub escalate: Option<String>,
    #[serde(default)]
    pub deescalate: Option<String>,
    #[serde(default)]
    pub escalate_auth: bool,
    #[serde(default)]
    pub escalate_prompt: Option<String>,
}

impl PrivilegeLevelSpec {
    /// Compile this spec into a [`PrivilegeLevel`].
    pub fn compile(&self) -> Result<PrivilegeLevel, regex::Error> {
        let mut level = PrivilegeLevel::new(&self.name, &self.pattern)?;
        level.previous_priv = self.previous_priv.clone();
        level.escalate_command = self.escalate.clone();
        level.deescalate_command = self.deescalate.clone();
        level.escalate_auth = self.escalate_auth;
        level.escalate_prompt = self
            .escalate_prompt
            .as_deref()
            .map(compile_prompt_pattern)
            .transpose()?;
        Ok(level)
    }
}
