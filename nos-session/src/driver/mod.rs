//! Session layer on top of a driver collaborator.
//!
//! The [`Driver`] trait is the narrow interface this crate consumes: it
//! owns the transport and knows how to send a command and read back the
//! output. [`Session`] adds privilege tracking, lifecycle hooks and error
//! recovery on top of it.

mod builder;
pub mod privilege;
pub(crate) mod response;
mod session;

#[cfg(test)]
pub(crate) mod mock;

pub use builder::SessionBuilder;
pub use privilege::{Direction, PrivilegeGraph, PrivilegeManager, Transition};
pub use response::Response;
pub use session::Session;

use std::future::Future;

use regex::Regex;

use crate::error::Result;
use crate::platform::PlatformDefinition;
use crate::transport::ConnectionConfig;

/// Options for a single configuration submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigOptions {
    /// Send without waiting for prompt matching on each line.
    ///
    /// Required for multi-line quoted payloads, which the device echoes
    /// back with continuation prompts.
    pub eager: bool,
}

impl ConfigOptions {
    /// Options with `eager` set.
    pub fn eager() -> Self {
        Self { eager: true }
    }
}

/// Options for raw channel input.
#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    /// Pattern to read until instead of the driver's prompt pattern.
    pub expect: Option<Regex>,

    /// Whether the input must be kept out of logs (e.g., passwords).
    pub hidden: bool,
}

impl InputOptions {
    /// Read until `pattern` instead of the default prompt.
    pub fn expecting(pattern: Regex) -> Self {
        Self {
            expect: Some(pattern),
            hidden: false,
        }
    }

    /// Mark the input as hidden.
    pub fn hidden() -> Self {
        Self {
            expect: None,
            hidden: true,
        }
    }
}

/// Command-execution primitives provided by the transport owner.
///
/// Implementations own a single ordered request/response stream. Every
/// method takes `&mut self`, so only one caller can drive a session at a
/// time.
pub trait Driver: Send {
    /// Host name of the device, for diagnostics.
    fn host(&self) -> &str;

    /// Check if the underlying transport is still alive.
    fn is_alive(&self) -> bool;

    /// Send a command and wait for the prompt.
    ///
    /// Output containing one of the platform's failure markers yields a
    /// [`Response`] with `failure_message` set, not an error.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send a single configuration line.
    fn send_config(
        &mut self,
        config: &str,
        options: ConfigOptions,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Send a batch of configuration lines as one submission.
    fn send_configs(
        &mut self,
        configs: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(configs.len());
            for config in configs {
                responses.push(self.send_config(config, ConfigOptions::default()).await?);
            }
            Ok(responses)
        }
    }

    /// Write raw bytes to the channel without reading anything back.
    fn channel_write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Send the line terminator.
    fn channel_send_return(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a line of input and return everything read up to the prompt
    /// (or `options.expect`), prompt included.
    fn channel_send_input(
        &mut self,
        input: &str,
        options: &InputOptions,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Tear down the transport.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens drivers for a [`SessionBuilder`].
///
/// Injected into the builder rather than looked up globally, so tests
/// can substitute a scripted driver.
pub trait DriverFactory {
    /// Driver produced by this factory.
    type Driver: Driver;

    /// Connect to the device and return an open driver.
    fn connect(
        &self,
        config: &ConnectionConfig,
        platform: &PlatformDefinition,
    ) -> impl Future<Output = Result<Self::Driver>> + Send;
}
