//! Directory-marker scoping for directory-scoped rules

use std::path::Path;

/// Decides whether a file's path puts it in scope for a directory-scoped
/// rule: the path must contain one of the configured markers, and the
/// filename must not be the package index file (index files often just
/// re-export names).
#[derive(Debug, Clone)]
pub struct PathScope {
    markers: Vec<String>,
    index_file: String,
}

impl PathScope {
    /// Create a scope from directory markers and the exempt index filename
    pub fn new(markers: Vec<String>, index_file: impl Into<String>) -> Self {
        Self {
            markers,
            index_file: index_file.into(),
        }
    }

    /// Whether the rule applies to the file at `path`
    pub fn applies_to(&self, path: &Path) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/");

        if !self.markers.iter().any(|m| normalized.contains(m.as_str())) {
            return false;
        }

        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| name != self.index_file)
            .unwrap_or(false)
    }
}
