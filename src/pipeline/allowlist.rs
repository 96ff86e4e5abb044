//! Allow-list loading.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{AppError, Result};

/// The set of author names whose messages are retained.
///
/// Loaded fresh each run; an unreadable or empty file is fatal because an
/// empty allow-list would silently discard everything.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    names: HashSet<String>,
}

impl AllowList {
    /// Load the allow-list from a plain-text file, one author per line.
    /// Blank lines and `#` comments are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::allow_list(path, e))?;

        let names: HashSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            return Err(AppError::allow_list(path, "allow-list has no entries"));
        }
        Ok(Self { names })
    }

    pub fn contains(&self, author: &str) -> bool {
        self.names.contains(author)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for AllowList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
