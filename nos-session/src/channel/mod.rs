//! Channel-level helpers for reading prompts out of session output.
//!
//! The transport itself lives with the driver collaborator; this module
//! only interprets the text it hands back.

mod patterns;

pub use patterns::{DEFAULT_SEARCH_DEPTH, PromptMatcher};
