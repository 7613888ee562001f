//! # nos-session
//!
//! Async privilege-aware session automation for network operating system
//! CLIs, with first-class Nokia SR Linux support.
//!
//! The transport is not part of this crate. A [`Driver`] implementation
//! owns the connection and executes commands; nos-session layers on top:
//!
//! - Prompt recognition with scrapli-style tail search
//! - Privilege level management over a validated level tree
//! - Open/close hooks and a configuration abort action
//! - SR Linux boot-readiness polling with deadline and cancellation
//! - SR Linux self-signed TLS server profile provisioning
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nos_session::platform::vendors::nokia_srl::{self, SrlFirmware, WaitContext};
//! use nos_session::{DriverFactory, SessionBuilder};
//!
//! async fn bootstrap<F: DriverFactory>(factory: &F) -> Result<(), nos_session::Error> {
//!     let mut session = SessionBuilder::new("172.20.20.2")
//!         .username("admin")
//!         .password("NokiaSrl1!")
//!         .platform(nokia_srl::platform(SrlFirmware::Current))
//!         .open(factory)
//!         .await?;
//!
//!     nokia_srl::wait_ready(&mut session, WaitContext::new()).await?;
//!     nokia_srl::provision_self_signed_tls(&mut session, None, false).await?;
//!
//!     session.close().await
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use driver::{Driver, DriverFactory, Response, Session, SessionBuilder};
pub use error::{Error, Result};
pub use platform::{PlatformDefinition, PrivilegeLevel};
pub use transport::{AuthMethod, ConnectionConfig};
