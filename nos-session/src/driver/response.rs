//! Response type returned by the driver collaborator.

use std::time::Duration;

use crate::error::{Result, SessionError};

/// Response from a command or configuration submission.
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// The command output with echo and trailing prompt removed.
    pub result: String,

    /// The raw output, including the trailing prompt.
    pub raw_result: String,

    /// The prompt that was matched at the end.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure message if the device output contained a failure marker.
    pub failure_message: Option<String>,
}

impl Response {
    /// Create a new successful response.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: None,
        }
    }

    /// Mark this response as failed.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }

    /// Turn a failed response into [`SessionError::CommandRejected`].
    pub fn into_result(self) -> Result<Self> {
        match self.failure_message {
            Some(message) => Err(SessionError::CommandRejected {
                command: self.command,
                message,
            }
            .into()),
            None => Ok(self),
        }
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
