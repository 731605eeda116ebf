//! Main analysis orchestrator
//!
//! Coordinates file discovery, per-file parsing and rule evaluation, and
//! result aggregation. Every file's analysis is an independent, pure
//! computation; the parallel path produces one result slot per file and
//! merges them in file order after a non-blocking join.

pub mod python;

use crate::analyzer::python::PythonAnalyzer;
use crate::config::SentinelConfig;
use crate::domain::violations::{RunReport, SentinelError, SentinelResult, Violation};
use crate::rules::RuleSet;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Result of analyzing one file
#[derive(Debug, Default)]
pub struct FileOutcome {
    /// Violations found, in visit order
    pub violations: Vec<Violation>,
    /// Whether the file was skipped as unparsable
    pub skipped: bool,
}

impl FileOutcome {
    /// Outcome for a file that was parsed and walked
    pub fn checked(violations: Vec<Violation>) -> Self {
        Self {
            violations,
            skipped: false,
        }
    }

    /// Outcome for a file skipped because it could not be parsed
    pub fn skipped() -> Self {
        Self {
            violations: Vec::new(),
            skipped: true,
        }
    }
}

/// Trait for per-language file analyzers
pub trait FileAnalyzer {
    /// Analyze a file's content and return its outcome
    fn analyze(&self, file_path: &Path, content: &str) -> SentinelResult<FileOutcome>;

    /// Check if this analyzer handles the given file type
    fn handles_file(&self, file_path: &Path) -> bool;
}

/// Options for customizing analysis behavior
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to analyze files in parallel
    pub parallel: bool,
    /// Maximum number of files to analyze
    pub max_files: Option<usize>,
    /// Whether to continue past unreadable files or fail fast
    pub fail_fast: bool,
    /// Additional exclude patterns for directory discovery
    pub exclude_patterns: Vec<String>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_files: None,
            fail_fast: false,
            exclude_patterns: Vec::new(),
        }
    }
}

/// Orchestrates the conformance run across a set of input paths
pub struct Analyzer {
    config: SentinelConfig,
    python: PythonAnalyzer,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: SentinelConfig) -> SentinelResult<Self> {
        let rules = RuleSet::from_config(&config)?;
        Ok(Self {
            config,
            python: PythonAnalyzer::new(rules),
        })
    }

    /// Create an analyzer with default configuration
    pub fn with_defaults() -> SentinelResult<Self> {
        Self::new(SentinelConfig::default())
    }

    /// The rule catalog this analyzer applies
    pub fn rules(&self) -> &RuleSet {
        self.python.rules()
    }

    /// Configuration fingerprint recorded in reports
    pub fn config_fingerprint(&self) -> String {
        self.config.fingerprint()
    }

    /// Analyze a single file and return its outcome
    pub fn analyze_file<P: AsRef<Path>>(&self, file_path: P) -> SentinelResult<FileOutcome> {
        let file_path = file_path.as_ref();

        let content = fs::read_to_string(file_path).map_err(|e| {
            SentinelError::analysis(
                file_path.display().to_string(),
                format!("Failed to read file: {e}"),
            )
        })?;

        self.python.analyze(file_path, &content)
    }

    /// Analyze the given paths (files or directories) and build a report
    pub fn check_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> SentinelResult<RunReport> {
        let start_time = Instant::now();

        let files = self.collect_files(paths, options)?;
        let total_files = files.len();

        let outcomes = if options.parallel && files.len() > 1 {
            self.analyze_files_parallel(&files)
        } else {
            self.analyze_files_sequential(&files)
        };

        // Merge per-file slots in file order
        let mut report = RunReport::new();
        let mut skipped = 0usize;

        for (file_path, outcome) in files.iter().zip(outcomes) {
            match outcome {
                Ok(outcome) => {
                    if outcome.skipped {
                        skipped += 1;
                    }
                    for violation in outcome.violations {
                        report.add_violation(violation);
                    }
                }
                Err(e) => {
                    if options.fail_fast {
                        return Err(e);
                    }
                    tracing::warn!("Failed to analyze {}: {}", file_path.display(), e);
                }
            }
        }

        report.set_files_checked(total_files);
        report.set_files_skipped(skipped);
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_config_fingerprint(self.config.fingerprint());
        report.sort_violations();

        Ok(report)
    }

    /// Analyze a directory tree and build a report
    pub fn check_directory<P: AsRef<Path>>(
        &self,
        root: P,
        options: &AnalysisOptions,
    ) -> SentinelResult<RunReport> {
        self.check_paths(&[root.as_ref()], options)
    }

    /// Expand the input paths into the ordered file list to analyze
    fn collect_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> SentinelResult<Vec<PathBuf>> {
        let excludes = self.compile_excludes(&options.exclude_patterns)?;
        let mut files = Vec::new();

        for path in paths {
            let path = path.as_ref();

            if path.is_dir() {
                files.extend(self.discover(path, &excludes));
            } else if self.python.handles_file(path) {
                // Explicitly supplied files bypass exclude filtering
                files.push(path.to_path_buf());
            } else {
                tracing::debug!("Ignoring non-Python input {}", path.display());
            }
        }

        if let Some(max_files) = options.max_files {
            files.truncate(max_files);
        }

        Ok(files)
    }

    /// Find Python files under a directory root, in sorted order
    fn discover(&self, root: &Path, excludes: &[glob::Pattern]) -> Vec<PathBuf> {
        WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.path().to_path_buf())
            .filter(|path| self.python.handles_file(path))
            .filter(|path| !excludes.iter().any(|p| p.matches_path(path)))
            .collect()
    }

    fn compile_excludes(&self, extra: &[String]) -> SentinelResult<Vec<glob::Pattern>> {
        self.config
            .paths
            .exclude
            .iter()
            .chain(extra)
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|e| {
                    SentinelError::config(format!("Invalid exclude pattern '{pattern}': {e}"))
                })
            })
            .collect()
    }

    fn analyze_files_sequential(&self, files: &[PathBuf]) -> Vec<SentinelResult<FileOutcome>> {
        files.iter().map(|path| self.analyze_file(path)).collect()
    }

    fn analyze_files_parallel(&self, files: &[PathBuf]) -> Vec<SentinelResult<FileOutcome>> {
        files
            .par_iter()
            .map(|path| self.analyze_file(path))
            .collect()
    }
}
