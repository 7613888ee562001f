//! Connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Settings a [`DriverFactory`](crate::driver::DriverFactory) needs to
/// open a session to a device.
#[derive(Debug)]
pub struct ConnectionConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// Port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Timeout for connecting and for each command.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl ConnectionConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Password usable for privilege escalation prompts, if any.
    pub fn password(&self) -> Option<&SecretString> {
        match &self.auth {
            AuthMethod::Password(password) => Some(password),
            _ => None,
        }
    }
}

/// Authentication method for the connection.
#[derive(Debug)]
pub enum AuthMethod {
    /// No authentication (for testing only).
    None,

    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}
