//! Privilege-aware session over a [`Driver`].

use log::{debug, trace, warn};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::privilege::{Direction, PrivilegeGraph, PrivilegeManager};
use super::response::Response;
use super::{ConfigOptions, Driver, InputOptions};
use crate::channel::PromptMatcher;
use crate::error::{Error, PlatformError, PrivilegeError, Result, SessionError};
use crate::platform::{PlatformDefinition, PrivilegeLevel, compile_prompt_pattern};

/// A device session: the driver collaborator plus the privilege cursor.
///
/// The session is the single owner of its driver. Every operation takes
/// `&mut self`, so commands from two callers can never interleave on the
/// same transport.
#[derive(Debug)]
pub struct Session<D: Driver> {
    driver: D,
    platform: PlatformDefinition,
    privileges: PrivilegeManager,
    matcher: PromptMatcher,
    auth_secret: Option<SecretString>,
}

impl<D: Driver> Session<D> {
    /// Wrap an already-open driver.
    ///
    /// Validates the platform's privilege graph. Lifecycle hooks are not
    /// run; call [`on_open`](Self::on_open) if needed.
    pub fn new(driver: D, platform: PlatformDefinition) -> Result<Self> {
        let graph = PrivilegeGraph::new(platform.privilege_levels.iter().cloned())?;
        let privileges = PrivilegeManager::new(graph, &platform.default_privilege)?;

        Ok(Self {
            driver,
            platform,
            privileges,
            matcher: PromptMatcher::default(),
            auth_secret: None,
        })
    }

    /// Set the secret sent when escalation prompts for authentication.
    pub fn with_auth_secret(mut self, secret: SecretString) -> Self {
        self.auth_secret = Some(secret);
        self
    }

    /// Set how many trailing bytes of output are searched for prompts.
    pub fn with_search_depth(mut self, depth: usize) -> Self {
        self.matcher = PromptMatcher::new(depth);
        self
    }

    /// Get a reference to the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Get a reference to the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Get the privilege manager.
    pub fn privilege_manager(&self) -> &PrivilegeManager {
        &self.privileges
    }

    /// Get the current privilege level name.
    pub fn current_privilege(&self) -> &str {
        &self.privileges.current().name
    }

    /// Host name of the device.
    pub fn host(&self) -> &str {
        self.driver.host()
    }

    /// Check if the underlying transport is still alive.
    pub fn is_alive(&self) -> bool {
        self.driver.is_alive()
    }

    /// Move the session to the `target` privilege level.
    ///
    /// Each hop's output must end in the destination level's prompt. The
    /// cursor only moves once the whole path has been walked.
    pub async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        let plan = self.privileges.plan(target)?;
        let Some(last) = plan.last().map(|step| step.to) else {
            trace!("already at privilege {:?}", target);
            return Ok(());
        };

        debug!(
            "acquiring privilege {:?} from {:?} ({} step(s))",
            target,
            self.privileges.current().name,
            plan.len()
        );

        for step in &plan {
            let graph = self.privileges.graph();
            let from = graph.level(step.from);
            let to = graph.level(step.to);

            let output = if step.direction == Direction::Escalate && to.escalate_auth {
                let options = InputOptions {
                    expect: auth_or_prompt(to)?,
                    hidden: false,
                };
                let output = self
                    .driver
                    .channel_send_input(&step.command, &options)
                    .await?;

                // The secret is only typed at a password prompt, never at the CLI
                let wants_secret = !self.matcher.matches(&output, to)
                    && to
                        .escalate_prompt
                        .as_ref()
                        .is_some_and(|prompt| self.matcher.is_match(&output, prompt));
                if wants_secret {
                    let secret = self.auth_secret.as_ref().ok_or_else(|| {
                        PrivilegeError::MissingAuthSecret {
                            level: to.name.clone(),
                        }
                    })?;
                    self.driver
                        .channel_send_input(secret.expose_secret(), &InputOptions::hidden())
                        .await?
                } else {
                    output
                }
            } else {
                self.driver
                    .channel_send_input(&step.command, &InputOptions::default())
                    .await?
            };

            if !self.matcher.matches(&output, to) {
                return Err(PrivilegeError::TransitionFailed {
                    from: from.name.clone(),
                    to: to.name.clone(),
                    prompt: self.matcher.observed_prompt(&output).to_string(),
                }
                .into());
            }
            trace!("{:?} -> {:?} via {:?}", from.name, to.name, step.command);
        }

        self.privileges.set_current(last);
        Ok(())
    }

    /// Send a command at the current privilege level.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let response = self.driver.send_command(command).await?;
        self.follow_prompt(&response);
        Ok(response)
    }

    /// Send a single configuration line from the configuration level.
    pub async fn send_config(&mut self, config: &str, options: ConfigOptions) -> Result<Response> {
        self.acquire_configuration().await?;
        let response = self.driver.send_config(config, options).await?;
        self.follow_prompt(&response);
        Ok(response)
    }

    /// Send a batch of configuration lines from the configuration level.
    pub async fn send_configs(&mut self, configs: &[&str]) -> Result<Vec<Response>> {
        self.acquire_configuration().await?;
        let responses = self.driver.send_configs(configs).await?;
        if let Some(last) = responses.last() {
            self.follow_prompt(last);
        }
        Ok(responses)
    }

    async fn acquire_configuration(&mut self) -> Result<()> {
        let target = self.platform.configuration_privilege.clone();
        self.acquire_privilege(&target).await
    }

    /// Let the cursor follow a prompt the device reported on its own,
    /// e.g. a commit that leaves the candidate datastore.
    fn follow_prompt(&mut self, response: &Response) {
        let before = self.privileges.current().name.clone();
        if let Some(now) = self.privileges.observe(&self.matcher, &response.prompt) {
            if now != before {
                debug!("privilege changed from {:?} to {:?} after {:?}", before, now, response.command);
            }
        }
    }

    /// Hook run right after the transport is connected.
    ///
    /// Acquires the default privilege level, then runs the platform's
    /// on-open commands. The first failure aborts the hook.
    pub async fn on_open(&mut self) -> Result<()> {
        let default = self.privileges.default_level().name.clone();
        self.acquire_privilege(&default)
            .await
            .map_err(|e| open_failed(format!("acquire {default}"), e))?;

        for command in self.platform.on_open_commands.clone() {
            debug!("on_open: {:?}", command);
            self.driver
                .send_command(&command)
                .await
                .and_then(Response::into_result)
                .map_err(|e| open_failed(command.clone(), e))?;
        }
        Ok(())
    }

    /// Hook run right before the transport is torn down.
    ///
    /// Returns to the default level and writes the platform's close input
    /// straight to the channel; nothing is read back.
    pub async fn on_close(&mut self) -> Result<()> {
        let default = self.privileges.default_level().name.clone();
        self.acquire_privilege(&default)
            .await
            .map_err(|e| close_failed(format!("acquire {default}"), e))?;

        let input = self.platform.close_input.clone();
        self.driver
            .channel_write(input.as_bytes())
            .await
            .map_err(|e| close_failed(input.clone(), e))?;
        self.driver
            .channel_send_return()
            .await
            .map_err(|e| close_failed("return".to_string(), e))?;
        Ok(())
    }

    /// Run [`on_close`](Self::on_close) and close the driver.
    ///
    /// The driver is closed even when the hook fails; the hook's error is
    /// returned in that case.
    pub async fn close(&mut self) -> Result<()> {
        let hook = self.on_close().await;
        if let Err(e) = &hook {
            warn!("on_close for {} failed, closing anyway: {}", self.host(), e);
        }
        let closed = self.driver.close().await;
        hook.and(closed)
    }

    /// Discard an in-progress configuration edit and reset to the root level.
    ///
    /// The discard input goes straight to the channel because the prompt
    /// state is unknown. The cursor is reset to the root level whether or
    /// not the send succeeded; a send error is still returned.
    pub async fn abort_config(&mut self) -> Result<()> {
        let result = match self.platform.abort_input.clone() {
            Some(input) => self
                .driver
                .channel_send_input(&input, &InputOptions::default())
                .await
                .map(|_| ()),
            None => Ok(()),
        };

        self.privileges.reset_to_root();

        if let Err(e) = &result {
            warn!("abort_config on {}: discard failed: {}", self.host(), e);
        }
        result
    }
}

/// Pattern to read an escalation reply until: the password prompt, or the
/// destination prompt when the device does not ask.
fn auth_or_prompt(level: &PrivilegeLevel) -> Result<Option<Regex>> {
    level
        .escalate_prompt
        .as_ref()
        .map(|auth| {
            compile_prompt_pattern(&format!("(?:{})|(?:{})", auth.as_str(), level.pattern.as_str()))
                .map_err(|e| Error::from(PlatformError::from(e)))
        })
        .transpose()
}

fn open_failed(step: String, source: Error) -> Error {
    SessionError::OpenFailed {
        step,
        source: Box::new(source),
    }
    .into()
}

fn close_failed(step: String, source: Error) -> Error {
    SessionError::CloseFailed {
        step,
        source: Box::new(source),
    }
    .into()
}
