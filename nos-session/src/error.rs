//! Error types for nos-session.

use thiserror::Error;

use crate::platform::vendors::nokia_srl::{ProvisioningStep, ReadinessState};

/// Main error type for nos-session operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Errors raised by the underlying driver/transport collaborator
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Privilege level navigation errors
    #[error("Privilege error: {0}")]
    Privilege(#[from] PrivilegeError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Boot readiness errors
    #[error("Readiness error: {0}")]
    Readiness(#[from] ReadinessError),

    /// Certificate provisioning errors
    #[error("Provisioning error: {0}")]
    Provisioning(#[from] ProvisioningError),

    /// Platform/vendor definition errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Errors surfaced by a [`Driver`](crate::driver::Driver) implementation.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected")]
    NotConnected,

    /// Command could not be executed
    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    ChannelClosed,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Privilege level navigation errors.
#[derive(Error, Debug)]
pub enum PrivilegeError {
    /// The requested level is not part of the platform's privilege graph
    #[error("Unknown privilege level '{name}'")]
    UnknownLevel { name: String },

    /// The prompt seen after a transition command did not match the destination
    #[error("Transition from '{from}' to '{to}' failed, prompt was: '{prompt}'")]
    TransitionFailed {
        from: String,
        to: String,
        prompt: String,
    },

    /// Escalation requires a password but none was configured
    #[error("Escalation to '{level}' requires authentication but no secret is configured")]
    MissingAuthSecret { level: String },
}

/// Session lifecycle errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// An operation required an open transport
    #[error("Precondition failed on {host}: {message}")]
    PreconditionFailed { host: String, message: String },

    /// A step of the on-open hook failed
    #[error("on_open failed at '{step}': {source}")]
    OpenFailed {
        step: String,
        #[source]
        source: Box<Error>,
    },

    /// A step of the on-close hook failed
    #[error("on_close failed at '{step}': {source}")]
    CloseFailed {
        step: String,
        #[source]
        source: Box<Error>,
    },

    /// Device reported a failure for a command
    #[error("Command '{command}' failed: {message}")]
    CommandRejected { command: String, message: String },

    /// The builder was missing required configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Boot readiness errors.
#[derive(Error, Debug)]
pub enum ReadinessError {
    /// Deadline elapsed before both readiness checks passed
    #[error("timed out waiting for node {host} to boot (state: {state}, last error: {last_error})")]
    Timeout {
        host: String,
        state: ReadinessState,
        last_error: String,
    },

    /// The caller cancelled the wait
    #[error("cancelled waiting for node {host} to boot (state: {state})")]
    Cancelled { host: String, state: ReadinessState },
}

/// Certificate generation and TLS profile provisioning errors.
#[derive(Error, Debug)]
pub enum ProvisioningError {
    /// The device rejected the generate command
    #[error("failed sending generate-self-signed command: {message}")]
    GenerationFailed { message: String },

    /// A begin/end marker pair was missing from the generate output
    #[error("failed to get the {artifact} string")]
    ArtifactNotFound { artifact: &'static str },

    /// A configuration step failed
    #[error("TLS profile step {step} failed: {source}")]
    StepFailed {
        step: ProvisioningStep,
        #[source]
        source: Box<Error>,
    },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type alias using nos-session's Error.
pub type Result<T> = std::result::Result<T, Error>;
