//! Work items and the invocations built from them.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Shell used to interpret the user command.
pub const DEFAULT_SHELL: &str = "sh";

/// One named unit of work, typically a submodule directory relative to the
/// repository root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem(String);

impl WorkItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkItem {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A ready-to-run command for one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Sequence number, unique within one run.
    pub id: u64,
    pub item: WorkItem,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// The user command as typed, kept for reporting.
    pub command: String,
}

impl Invocation {
    /// Human-readable command line, used in log fields.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Builds invocations that run a user command inside each item's directory.
///
/// The item is resolved against `root` and becomes the child's working
/// directory, so item names never pass through the shell. An absolute item
/// replaces `root` entirely.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    root: PathBuf,
    command: String,
    next_id: u64,
}

impl CommandBuilder {
    pub fn new(root: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            command: command.into(),
            next_id: 0,
        }
    }

    /// Build the invocation for `item`, assigning it the next sequence id.
    pub fn build(&mut self, item: &WorkItem) -> Invocation {
        let id = self.next_id;
        self.next_id += 1;
        if Path::new(item.as_str()).is_absolute() {
            warn!(
                item = %item,
                root = %self.root.display(),
                "Absolute submodule path escapes the repository root"
            );
        }
        Invocation {
            id,
            item: item.clone(),
            program: DEFAULT_SHELL.to_string(),
            args: vec!["-c".to_string(), self.command.clone()],
            cwd: self.root.join(item.as_str()),
            command: self.command.clone(),
        }
    }
}
