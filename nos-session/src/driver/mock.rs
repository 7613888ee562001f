//! Scripted driver used by unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::{Future, ready};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ConfigOptions, Driver, DriverFactory, InputOptions, Response};
use crate::error::{DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::ConnectionConfig;

pub(crate) const EXEC_PROMPT: &str = "--{ running }--[  ]--\nA:srl#";
pub(crate) const CANDIDATE_PROMPT: &str = "--{ candidate private private-admin }--[  ]--\nA:srl#";

/// Everything the session sent, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Command(String),
    Config { config: String, eager: bool },
    Configs(Vec<String>),
    Write(String),
    Return,
    Input { input: String, hidden: bool },
    Close,
}

impl Sent {
    pub(crate) fn command(text: &str) -> Self {
        Sent::Command(text.to_string())
    }

    pub(crate) fn input(text: &str) -> Self {
        Sent::Input {
            input: text.to_string(),
            hidden: false,
        }
    }
}

/// Scripted reply for one send.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Output text (without echo or prompt).
    Output(String),
    /// Driver-level error.
    Error(String),
}

#[derive(Debug)]
pub(crate) struct MockDriver {
    pub host: String,
    pub alive: bool,
    pub prompt: String,
    pub transitions: HashMap<String, String>,
    pub replies: HashMap<String, VecDeque<Reply>>,
    pub failing: HashSet<String>,
    pub failed_when_contains: Vec<String>,
    sent: Arc<Mutex<Vec<Sent>>>,
}

impl MockDriver {
    /// Driver sitting at `prompt`, with the SR Linux failure marker.
    pub(crate) fn new(prompt: &str) -> Self {
        Self {
            host: "srl1".to_string(),
            alive: true,
            prompt: prompt.to_string(),
            transitions: HashMap::new(),
            replies: HashMap::new(),
            failing: HashSet::new(),
            failed_when_contains: vec!["Error:".to_string()],
            sent: Arc::default(),
        }
    }

    /// SR Linux-like driver that can enter and leave a private candidate.
    pub(crate) fn srl() -> Self {
        Self::new(EXEC_PROMPT)
            .with_transition("enter candidate private", CANDIDATE_PROMPT)
            .with_transition("discard now", EXEC_PROMPT)
            .with_transition("commit save", EXEC_PROMPT)
    }

    pub(crate) fn with_transition(mut self, input: &str, prompt: &str) -> Self {
        self.transitions.insert(input.to_string(), prompt.to_string());
        self
    }

    pub(crate) fn with_reply(mut self, input: &str, reply: Reply) -> Self {
        self.replies
            .entry(input.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn failing_on(mut self, input: &str) -> Self {
        self.failing.insert(input.to_string());
        self
    }

    /// Everything sent so far, in order.
    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }

    fn next_reply(&mut self, input: &str) -> Option<Reply> {
        self.replies.get_mut(input).and_then(VecDeque::pop_front)
    }

    fn check_failing(&self, input: &str) -> Result<()> {
        if self.failing.contains(input) {
            return Err(DriverError::CommandFailed {
                message: format!("scripted failure for '{input}'"),
            }
            .into());
        }
        Ok(())
    }

    fn respond(&mut self, command: &str) -> Result<Response> {
        self.check_failing(command)?;
        let result = match self.next_reply(command) {
            Some(Reply::Output(text)) => text,
            Some(Reply::Error(message)) => {
                return Err(DriverError::CommandFailed { message }.into());
            }
            None => String::new(),
        };
        if let Some(prompt) = self.transitions.get(command) {
            self.prompt = prompt.clone();
        }

        let raw = format!("{command}\n{result}\n{}", self.prompt);
        let response = Response::new(
            command,
            result.clone(),
            raw,
            self.prompt.clone(),
            Duration::from_millis(1),
        );
        match self
            .failed_when_contains
            .iter()
            .find(|marker| result.contains(marker.as_str()))
        {
            Some(marker) => Ok(response.with_failure(marker.clone())),
            None => Ok(response),
        }
    }
}

impl Driver for MockDriver {
    fn host(&self) -> &str {
        &self.host
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        self.record(Sent::Command(command.to_string()));
        self.respond(command)
    }

    async fn send_config(&mut self, config: &str, options: ConfigOptions) -> Result<Response> {
        self.record(Sent::Config {
            config: config.to_string(),
            eager: options.eager,
        });
        self.respond(config)
    }

    async fn send_configs(&mut self, configs: &[&str]) -> Result<Vec<Response>> {
        self.record(Sent::Configs(configs.iter().map(|c| c.to_string()).collect()));
        configs.iter().map(|config| self.respond(config)).collect()
    }

    async fn channel_write(&mut self, data: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(data).to_string();
        self.record(Sent::Write(text.clone()));
        self.check_failing(&text)
    }

    async fn channel_send_return(&mut self) -> Result<()> {
        self.record(Sent::Return);
        Ok(())
    }

    async fn channel_send_input(&mut self, input: &str, options: &InputOptions) -> Result<String> {
        self.record(Sent::Input {
            input: input.to_string(),
            hidden: options.hidden,
        });
        self.check_failing(input)?;
        match self.next_reply(input) {
            Some(Reply::Output(text)) => Ok(format!("{input}\n{text}")),
            Some(Reply::Error(message)) => Err(DriverError::CommandFailed { message }.into()),
            None => {
                if let Some(prompt) = self.transitions.get(input) {
                    self.prompt = prompt.clone();
                }
                Ok(format!("{input}\n{}", self.prompt))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.record(Sent::Close);
        self.alive = false;
        Ok(())
    }
}

/// Factory handing out one pre-built [`MockDriver`].
///
/// Keeps a handle on the driver's send log, so tests can still inspect it
/// when the session never comes back.
pub(crate) struct MockFactory {
    driver: Mutex<Option<MockDriver>>,
    sent: Arc<Mutex<Vec<Sent>>>,
    pub connected_to: Mutex<Option<String>>,
}

impl MockFactory {
    pub(crate) fn new(driver: MockDriver) -> Self {
        Self {
            sent: Arc::clone(&driver.sent),
            driver: Mutex::new(Some(driver)),
            connected_to: Mutex::new(None),
        }
    }

    /// Everything the handed-out driver was sent, in order.
    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

impl DriverFactory for MockFactory {
    type Driver = MockDriver;

    fn connect(
        &self,
        config: &ConnectionConfig,
        _platform: &PlatformDefinition,
    ) -> impl Future<Output = Result<MockDriver>> + Send {
        *self.connected_to.lock().unwrap() = Some(config.socket_addr());
        let driver = self
            .driver
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| crate::Error::from(DriverError::NotConnected));
        ready(driver)
    }
}
