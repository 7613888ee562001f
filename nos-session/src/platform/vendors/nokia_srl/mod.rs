//! Nokia SR Linux support.
//!
//! Besides the prompt table, this module carries the two node bootstrap
//! helpers run after a session is open: [`wait_ready`] and
//! [`provision_self_signed_tls`].

mod platform;
mod ready;
mod tls;

pub use platform::{PLATFORM_NAME, SrlFirmware, platform};
pub use ready::{
    CONFIG_CHECK_COMMAND, DEFAULT_READY_TIMEOUT, DEFAULT_RETRY_INTERVAL, PROCESS_CHECK_COMMAND,
    ReadinessPolicy, ReadinessState, WaitContext, wait_ready, wait_ready_with,
};
pub use tls::{
    DEFAULT_TLS_PROFILE_NAME, ExtractedArtifacts, ProvisioningStep, extract_artifacts,
    provision_self_signed_tls,
};
