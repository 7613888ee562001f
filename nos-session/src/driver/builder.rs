//! Builder for opening sessions.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, warn};
use secrecy::SecretString;

use super::session::Session;
use super::{Driver, DriverFactory};
use crate::channel::DEFAULT_SEARCH_DEPTH;
use crate::error::{Result, SessionError};
use crate::platform::PlatformDefinition;
use crate::transport::{AuthMethod, ConnectionConfig};

/// Builder for opening a [`Session`] through a [`DriverFactory`].
///
/// # Example
///
/// ```rust,no_run
/// use nos_session::driver::{DriverFactory, SessionBuilder};
/// use nos_session::platform::vendors::nokia_srl::{self, SrlFirmware};
///
/// # async fn example<F: DriverFactory>(factory: F) -> Result<(), nos_session::Error> {
/// let mut session = SessionBuilder::new("172.20.20.2")
///     .username("admin")
///     .password("NokiaSrl1!")
///     .platform(nokia_srl::platform(SrlFirmware::Current))
///     .open(&factory)
///     .await?;
///
/// nokia_srl::wait_ready(&mut session, Default::default()).await?;
/// nokia_srl::provision_self_signed_tls(&mut session, None, false).await?;
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    platform: Option<PlatformDefinition>,
    timeout: Duration,
    terminal_size: Option<(u32, u32)>,
    search_depth: usize,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            platform: None,
            timeout: Duration::from_secs(30),
            terminal_size: None,
            search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    /// Set the port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    ///
    /// The password is also answered to escalation prompts.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set the platform definition.
    pub fn platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the platform's terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_size = Some((width, height));
        self
    }

    /// Set how many trailing bytes of output are searched for prompts.
    pub fn search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    /// Connect through `factory` and run the open hook.
    ///
    /// If the hook fails the driver is closed before the error is returned.
    pub async fn open<F: DriverFactory>(self, factory: &F) -> Result<Session<F::Driver>> {
        let username = self.username.ok_or_else(|| SessionError::InvalidConfig {
            message: "username is required".to_string(),
        })?;
        let platform = self.platform.ok_or_else(|| SessionError::InvalidConfig {
            message: "platform must be specified".to_string(),
        })?;
        let (terminal_width, terminal_height) = self
            .terminal_size
            .unwrap_or((platform.terminal_width, platform.terminal_height));

        let config = ConnectionConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.timeout,
            terminal_width,
            terminal_height,
        };

        debug!("connecting to {} as {}", config.socket_addr(), config.username);
        let driver = factory.connect(&config, &platform).await?;

        let mut session = Session::new(driver, platform)?.with_search_depth(self.search_depth);
        if let Some(password) = config.password() {
            session = session.with_auth_secret(password.clone());
        }

        if let Err(e) = session.on_open().await {
            warn!("on_open for {} failed: {}", config.host, e);
            if let Err(close_err) = session.driver_mut().close().await {
                warn!("closing {} after failed open: {}", config.host, close_err);
            }
            return Err(e);
        }
        Ok(session)
    }
}
