//! Submodule discovery from a `.gitmodules` file.
//!
//! Only the pieces the dispatcher needs are extracted: the quoted name of each
//! `[submodule "..."]` section and, when present, its `path = ...` entry.
//! Section headers are matched case-insensitively and stray quote or bracket
//! characters are stripped from names.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::invocation::WorkItem;

#[allow(clippy::expect_used)]
static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\[submodule "(.*)"#).expect("static regex is valid"));

#[allow(clippy::expect_used)]
static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*path\s*=\s*(.*?)\s*$").expect("static regex is valid"));

/// One `[submodule]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submodule {
    pub name: String,
    /// Value of the section's `path` key, if it declares one.
    pub path: Option<String>,
}

/// Which field of a submodule becomes its work item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemKey {
    /// The section name (`[submodule "<name>"]`).
    #[default]
    Name,
    /// The `path = ...` entry, falling back to the name when absent.
    Path,
}

impl Submodule {
    fn key(&self, key: ItemKey) -> &str {
        match key {
            ItemKey::Name => &self.name,
            ItemKey::Path => self.path.as_deref().unwrap_or(&self.name),
        }
    }
}

fn clean_name(raw: &str) -> String {
    raw.replace(['"', ']'], "").trim().to_string()
}

/// Parse every submodule section out of `.gitmodules` content, in file order.
///
/// Sections whose name is empty after cleanup are skipped.
pub fn parse_gitmodules(content: &str) -> Vec<Submodule> {
    let mut submodules: Vec<Submodule> = Vec::new();
    // Index into `submodules` of the section currently being read.
    let mut current: Option<usize> = None;

    for line in content.lines() {
        if let Some(caps) = SECTION_RE.captures(line) {
            let name = clean_name(caps.get(1).map_or("", |m| m.as_str()));
            if name.is_empty() {
                warn!(line, "Skipping submodule declaration without a name");
                current = None;
                continue;
            }
            submodules.push(Submodule { name, path: None });
            current = Some(submodules.len() - 1);
        } else if line.trim_start().starts_with('[') {
            // Some other section ([core], [remote "x"], ...).
            current = None;
        } else if let (Some(idx), Some(caps)) = (current, PATH_RE.captures(line)) {
            let path = caps.get(1).map_or("", |m| m.as_str()).trim_matches('"');
            if !path.is_empty() {
                submodules[idx].path = Some(path.to_string());
            }
        }
    }

    submodules
}

/// Read `path` and return its submodules.
///
/// Fails when the file cannot be read or declares no submodules.
pub fn load_submodules(path: &Path) -> Result<Vec<Submodule>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ReadSource {
        path: path.to_path_buf(),
        source,
    })?;

    let submodules = parse_gitmodules(&content);
    if submodules.is_empty() {
        return Err(Error::NoItems {
            path: path.to_path_buf(),
        });
    }

    debug!(path = %path.display(), count = submodules.len(), "Parsed submodules");
    Ok(submodules)
}

/// Turn submodules into work items, preserving order.
pub fn work_items(submodules: &[Submodule], key: ItemKey) -> Vec<WorkItem> {
    submodules
        .iter()
        .map(|s| WorkItem::new(s.key(key)))
        .collect()
}
