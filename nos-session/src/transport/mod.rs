//! Connection settings handed to the transport collaborator.
//!
//! The transport itself (sockets, SSH, terminal emulation) is provided by
//! a [`DriverFactory`](crate::driver::DriverFactory) implementation.

pub mod config;

pub use config::{AuthMethod, ConnectionConfig};
