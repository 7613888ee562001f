//! Privilege level management with tree-based navigation.

use indexmap::IndexMap;

use crate::channel::PromptMatcher;
use crate::error::{PlatformError, PrivilegeError, Result};
use crate::platform::PrivilegeLevel;

/// Direction of a single privilege transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Parent to child, using the child's escalate command.
    Escalate,
    /// Child to parent, using the child's de-escalate command.
    Deescalate,
}

/// One hop between adjacent privilege levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Index of the level the hop starts from.
    pub from: usize,
    /// Index of the level the hop ends at.
    pub to: usize,
    /// Command that performs the hop.
    pub command: String,
    /// Whether the hop escalates or de-escalates.
    pub direction: Direction,
}

/// Privilege levels stored as an arena with a name index.
///
/// Each level owns at most one parent link, stored as an index into the
/// arena. Construction validates that the links form a single tree.
#[derive(Debug, Clone)]
pub struct PrivilegeGraph {
    levels: Vec<PrivilegeLevel>,
    index: IndexMap<String, usize>,
    parents: Vec<Option<usize>>,
    root: usize,
}

impl PrivilegeGraph {
    /// Build and validate a privilege graph.
    pub fn new<I>(levels: I) -> std::result::Result<Self, PlatformError>
    where
        I: IntoIterator<Item = PrivilegeLevel>,
    {
        let levels: Vec<PrivilegeLevel> = levels.into_iter().collect();

        let mut index = IndexMap::with_capacity(levels.len());
        for (idx, level) in levels.iter().enumerate() {
            if index.insert(level.name.clone(), idx).is_some() {
                return Err(invalid(format!("duplicate privilege level '{}'", level.name)));
            }
        }

        let mut parents = Vec::with_capacity(levels.len());
        let mut roots = Vec::new();
        for (idx, level) in levels.iter().enumerate() {
            match level.previous_priv.as_deref() {
                None => {
                    roots.push(idx);
                    parents.push(None);
                }
                Some(parent) => {
                    let parent_idx = index.get(parent).copied().ok_or_else(|| {
                        invalid(format!(
                            "privilege level '{}' references unknown parent '{}'",
                            level.name, parent
                        ))
                    })?;
                    if !has_command(&level.escalate_command)
                        || !has_command(&level.deescalate_command)
                    {
                        return Err(invalid(format!(
                            "privilege level '{}' needs both escalate and deescalate commands",
                            level.name
                        )));
                    }
                    parents.push(Some(parent_idx));
                }
            }

            if level.escalate_auth && level.escalate_prompt.is_none() {
                return Err(invalid(format!(
                    "privilege level '{}' requires auth but has no auth prompt",
                    level.name
                )));
            }
        }

        let root = match roots.as_slice() {
            [root] => *root,
            [] => return Err(invalid("no root privilege level defined".to_string())),
            _ => {
                let names: Vec<&str> = roots.iter().map(|&i| levels[i].name.as_str()).collect();
                return Err(invalid(format!(
                    "multiple root privilege levels: {}",
                    names.join(", ")
                )));
            }
        };

        // With a single root, a parent chain longer than the arena is a cycle.
        for (idx, level) in levels.iter().enumerate() {
            let mut node = idx;
            let mut steps = 0;
            while let Some(parent) = parents[node] {
                steps += 1;
                if steps > levels.len() {
                    return Err(invalid(format!(
                        "privilege level '{}' is part of a parent cycle",
                        level.name
                    )));
                }
                node = parent;
            }
        }

        Ok(Self {
            levels,
            index,
            parents,
            root,
        })
    }

    /// Get a privilege level by name.
    pub fn get(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.index_of(name).map(|idx| &self.levels[idx])
    }

    /// Arena index of a level.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Level at an arena index.
    ///
    /// Panics if `idx` did not come from this graph.
    pub fn level(&self, idx: usize) -> &PrivilegeLevel {
        &self.levels[idx]
    }

    /// Index of the root level.
    pub fn root_index(&self) -> usize {
        self.root
    }

    /// The root level.
    pub fn root(&self) -> &PrivilegeLevel {
        &self.levels[self.root]
    }

    /// All levels in definition order.
    pub fn levels(&self) -> impl Iterator<Item = &PrivilegeLevel> {
        self.levels.iter()
    }

    /// Chain of indices from `idx` up to and including the root.
    fn ancestors(&self, idx: usize) -> Vec<usize> {
        let mut chain = vec![idx];
        let mut node = idx;
        while let Some(parent) = self.parents[node] {
            chain.push(parent);
            node = parent;
        }
        chain
    }

    /// Compute the hops from `from` to `to`.
    ///
    /// De-escalates up to the nearest common ancestor, then escalates down
    /// to the target. Empty when `from == to`.
    pub fn find_path(&self, from: usize, to: usize) -> Vec<Transition> {
        if from == to {
            return Vec::new();
        }

        let up = self.ancestors(from);
        let down = self.ancestors(to);
        // Both chains end at the single root, so a common ancestor always exists.
        let common = up
            .iter()
            .copied()
            .find(|idx| down.contains(idx))
            .unwrap_or(self.root);

        let mut path = Vec::new();

        for pair in up.windows(2) {
            let (child, parent) = (pair[0], pair[1]);
            if child == common {
                break;
            }
            path.push(Transition {
                from: child,
                to: parent,
                command: self.levels[child]
                    .deescalate_command
                    .clone()
                    .unwrap_or_default(),
                direction: Direction::Deescalate,
            });
        }

        let common_pos = down
            .iter()
            .position(|&idx| idx == common)
            .unwrap_or(down.len() - 1);
        for pair in down[..=common_pos].windows(2).rev() {
            let (child, parent) = (pair[0], pair[1]);
            path.push(Transition {
                from: parent,
                to: child,
                command: self.levels[child]
                    .escalate_command
                    .clone()
                    .unwrap_or_default(),
                direction: Direction::Escalate,
            });
        }

        path
    }
}

fn has_command(command: &Option<String>) -> bool {
    command.as_deref().is_some_and(|c| !c.trim().is_empty())
}

fn invalid(message: String) -> PlatformError {
    PlatformError::InvalidDefinition { message }
}

/// Tracks the session's current privilege level on top of a [`PrivilegeGraph`].
#[derive(Debug, Clone)]
pub struct PrivilegeManager {
    graph: PrivilegeGraph,
    current: usize,
    default: usize,
}

impl PrivilegeManager {
    /// Create a manager positioned at the root level.
    pub fn new(
        graph: PrivilegeGraph,
        default_privilege: &str,
    ) -> std::result::Result<Self, PlatformError> {
        let default = graph.index_of(default_privilege).ok_or_else(|| {
            invalid(format!(
                "default privilege '{}' is not a defined level",
                default_privilege
            ))
        })?;
        let current = graph.root_index();

        Ok(Self {
            graph,
            current,
            default,
        })
    }

    /// The underlying graph.
    pub fn graph(&self) -> &PrivilegeGraph {
        &self.graph
    }

    /// Get the current privilege level.
    pub fn current(&self) -> &PrivilegeLevel {
        self.graph.level(self.current)
    }

    /// The level the session returns to on open and close.
    pub fn default_level(&self) -> &PrivilegeLevel {
        self.graph.level(self.default)
    }

    /// Plan the transitions needed to reach `target` from the current level.
    pub fn plan(&self, target: &str) -> Result<Vec<Transition>> {
        let to = self
            .graph
            .index_of(target)
            .ok_or_else(|| PrivilegeError::UnknownLevel {
                name: target.to_string(),
            })?;
        Ok(self.graph.find_path(self.current, to))
    }

    /// Move the cursor after a verified transition.
    pub(crate) fn set_current(&mut self, idx: usize) {
        self.current = idx;
    }

    /// Force the cursor back to the root level.
    pub(crate) fn reset_to_root(&mut self) {
        self.current = self.graph.root_index();
    }

    /// Follow the prompt at the end of `output`, if it names a known level.
    ///
    /// Returns the name of the level the cursor now points at.
    pub(crate) fn observe(&mut self, matcher: &PromptMatcher, output: &str) -> Option<&str> {
        let idx = self
            .graph
            .levels()
            .position(|level| matcher.matches(output, level))?;
        self.current = idx;
        Some(self.graph.level(idx).name.as_str())
    }
}
