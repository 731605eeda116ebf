//! Python file analysis: parse, walk, report per-file outcome
//!
//! A file that cannot be parsed is not a failure of the run; it is skipped
//! for rule evaluation and contributes no violations.

use crate::analyzer::{FileAnalyzer, FileOutcome};
use crate::domain::violations::SentinelResult;
use crate::rules::{FileContext, RuleSet};
use crate::syntax;
use std::path::Path;

/// Analyzer for Python source files
#[derive(Debug, Clone)]
pub struct PythonAnalyzer {
    rules: RuleSet,
}

impl PythonAnalyzer {
    /// Create an analyzer applying the given rule catalog
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// The rule catalog applied to each file
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl FileAnalyzer for PythonAnalyzer {
    fn analyze(&self, file_path: &Path, content: &str) -> SentinelResult<FileOutcome> {
        let tree = match syntax::parse_module(content) {
            Ok(tree) => tree,
            Err(failure) => {
                tracing::debug!(
                    "Skipping unparsable file {}: {}",
                    file_path.display(),
                    failure
                );
                return Ok(FileOutcome::skipped());
            }
        };

        let ctx = FileContext::new(file_path);
        Ok(FileOutcome::checked(self.rules.check_tree(&tree, &ctx)))
    }

    fn handles_file(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == "py")
            .unwrap_or(false)
    }
}
