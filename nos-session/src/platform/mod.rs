//! Platform definitions for vendor support.
//!
//! This module defines vendor-specific configurations including
//! prompt patterns, privilege levels, and session lifecycle commands.

mod definition;
mod privilege_level;
pub mod vendors;

pub use definition::{PlatformDefinition, PlatformSpec};
pub use privilege_level::{PrivilegeLevel, PrivilegeLevelSpec, compile_prompt_pattern};
