//! Prompt matching against the tail of command output.
//!
//! Only the last `search_depth` bytes of the output are inspected, and a
//! pattern only counts when its match ends where the output ends (modulo
//! trailing whitespace). Prompts are always the last logical line(s), so a
//! prompt echoed earlier in the output must never be mistaken for the
//! current one.

use regex::Regex;

use crate::platform::PrivilegeLevel;

/// Default number of trailing bytes searched for a prompt.
pub const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// Number of trailing lines reported as "the prompt" in diagnostics.
const PROMPT_LINES: usize = 2;

/// Recognizes which privilege level a block of output ends in.
#[derive(Debug, Clone, Copy)]
pub struct PromptMatcher {
    search_depth: usize,
}

impl PromptMatcher {
    /// Create a matcher that inspects the last `search_depth` bytes of output.
    pub fn new(search_depth: usize) -> Self {
        Self { search_depth }
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }

    /// Return the searched region of `output`, trailing whitespace removed.
    pub fn tail<'a>(&self, output: &'a str) -> &'a str {
        let mut start = output.len().saturating_sub(self.search_depth);
        while !output.is_char_boundary(start) {
            start += 1;
        }
        output[start..].trim_end()
    }

    /// Check whether `output` ends in a match of `pattern`.
    pub fn is_match(&self, output: &str, pattern: &Regex) -> bool {
        let tail = self.tail(output);
        if tail.is_empty() {
            return false;
        }
        pattern.find_iter(tail).any(|m| m.end() == tail.len())
    }

    /// Check whether `output` ends in the prompt of `level`.
    pub fn matches(&self, output: &str, level: &PrivilegeLevel) -> bool {
        self.is_match(output, &level.pattern)
    }

    /// Find the first level whose prompt terminates `output`.
    pub fn determine<'a, I>(&self, output: &str, levels: I) -> Option<&'a PrivilegeLevel>
    where
        I: IntoIterator<Item = &'a PrivilegeLevel>,
    {
        levels.into_iter().find(|level| self.matches(output, level))
    }

    /// The trailing lines of `output`, as reported in error messages.
    pub fn observed_prompt<'a>(&self, output: &'a str) -> &'a str {
        let tail = self.tail(output);
        let start = tail
            .rmatch_indices('\n')
            .nth(PROMPT_LINES - 1)
            .map(|(idx, _)| idx + 1)
            .unwrap_or(0);
        &tail[start..]
    }
}

impl Default for PromptMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEPTH)
    }
}
