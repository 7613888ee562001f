//! Nokia SR Linux platform definition.
//!
//! SR Linux prompts are two lines: a status line naming the datastore
//! (`running` or `candidate ...`) and the current context, followed by the
//! `CPM:hostname#` line.
//!
//! # Prompt Examples
//!
//! ```text
//! --{ running }--[  ]--                                  # exec
//! A:srl#
//!
//! --{ [FACTORY] + running }--[  ]--                      # exec, with status decorations
//! A:srl#
//!
//! --{ candidate private private-admin }--[  ]--          # configuration
//! A:srl#
//!
//! --{ +* candidate private private-admin }--[ network-instance default ]--
//! A:srl#                                                 # configuration, uncommitted changes
//! ```
//!
//! # Privilege Graph
//!
//! ```text
//! ┌──────┐  enter candidate private  ┌───────────────┐
//! │ exec ├───────────────────────────► configuration │
//! │      │       discard now         │               │
//! └──────┘◄──────────────────────────┴───────────────┘
//! ```

use crate::platform::{PlatformDefinition, PrivilegeLevel};

/// Platform name for Nokia SR Linux.
pub const PLATFORM_NAME: &str = "nokia_srl";

/// Prompt and command table variants seen across SR Linux releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SrlFirmware {
    /// Current releases: status decorations before the datastore name,
    /// `discard now` to leave the candidate.
    #[default]
    Current,

    /// Early releases: bare datastore name, `exit` to leave the candidate
    /// and an extra parser failure marker.
    Legacy,
}

struct Table {
    exec_pattern: &'static str,
    configuration_pattern: &'static str,
    deescalate: &'static str,
    failure_patterns: &'static [&'static str],
}

const CURRENT: Table = Table {
    exec_pattern: r"(?i)^--\{(\s\[[\w\s]+\]){0,5}[+*\s]{1,}running\s\}--\[.+?\]--\s*\n[abcd]:\S+#\s*$",
    configuration_pattern: r"(?i)^--\{(\s\[[\w\s]+\]){0,5}[+*!\s]{1,}candidate[\w\s-]+\}--\[.+?\]--\s*\n[abcd]:\S+#\s*$",
    deescalate: "discard now",
    failure_patterns: &["Error:"],
};

const LEGACY: Table = Table {
    exec_pattern: r"(?i)^--\{\s*running\s*\}--\[.+?\]--\s*\n[abcd]:\S+#\s*$",
    configuration_pattern: r"(?i)^--\{\s*[+*]*\s*candidate[\w\s-]+\}--\[.+?\]--\s*\n[abcd]:\S+#\s*$",
    deescalate: "exit",
    failure_patterns: &["Error:", "Parsing error"],
};

/// Create the Nokia SR Linux platform definition for a firmware variant.
pub fn platform(firmware: SrlFirmware) -> PlatformDefinition {
    let table = match firmware {
        SrlFirmware::Current => &CURRENT,
        SrlFirmware::Legacy => &LEGACY,
    };

    let exec = PrivilegeLevel::new("exec", table.exec_pattern).unwrap();

    let configuration = PrivilegeLevel::new("configuration", table.configuration_pattern)
        .unwrap()
        .with_parent("exec")
        .with_escalate("enter candidate private")
        .with_deescalate(table.deescalate);

    let mut platform = PlatformDefinition::new(PLATFORM_NAME)
        .with_privilege(exec)
        .with_privilege(configuration)
        .with_default_privilege("exec")
        .with_configuration_privilege("configuration")
        .with_on_open_command("environment cli-engine type basic")
        .with_on_open_command("environment complete-on-space false")
        .with_close_input("quit")
        .with_abort_input("discard now")
        // 140 columns keeps the `---` delimiters of show commands on one line
        .with_terminal_size(140, 60);

    for pattern in table.failure_patterns {
        platform = platform.with_failure_pattern(*pattern);
    }

    platform
}
