//! Core domain models for conformance violations and run results
//!
//! Violations are immutable records produced by rule matches; a RunReport
//! aggregates them across all checked files and decides the exit outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity levels for conformance violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages and suggestions
    Info,
    /// Warnings that should be addressed but don't block builds
    Warning,
    /// Errors that block commits and fail CI builds
    Error,
}

impl Severity {
    /// Whether this severity level blocks under an errors-only exit policy
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Convert to string for display
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Marker glyph used in line-oriented output
    pub fn marker(self) -> &'static str {
        match self {
            Self::Info => "ℹ️",
            Self::Warning => "⚠️",
            Self::Error => "❌",
        }
    }
}

/// A conformance violation detected during analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the rule that produced this violation
    pub rule_id: String,
    /// Severity level of this violation
    pub severity: Severity,
    /// File the violation was found in
    pub file_path: PathBuf,
    /// Line number (1-indexed); None for whole-file violations
    pub line_number: Option<u32>,
    /// Column number (1-indexed) where the match starts
    pub column_number: Option<u32>,
    /// Human-readable description of the violation
    pub message: String,
    /// Suggested replacement or fix, when the rule carries one
    pub suggested_fix: Option<String>,
    /// When this violation was detected
    pub detected_at: DateTime<Utc>,
}

impl Violation {
    /// Create a new violation
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        file_path: PathBuf,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            file_path,
            line_number: None,
            column_number: None,
            message: message.into(),
            suggested_fix: None,
            detected_at: Utc::now(),
        }
    }

    /// Set line and column position
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line_number = Some(line);
        self.column_number = Some(column);
        self
    }

    /// Add a suggested fix
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggested_fix = Some(suggestion.into());
        self
    }

    /// Whether this violation blocks under an errors-only exit policy
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }

    /// Render as a single report line: `<path>:<line> <marker> <message>`
    pub fn format_line(&self) -> String {
        match self.line_number {
            Some(line) => format!(
                "{}:{} {} {}",
                self.file_path.display(),
                line,
                self.severity.marker(),
                self.message
            ),
            None => format!(
                "{} {} {}",
                self.file_path.display(),
                self.severity.marker(),
                self.message
            ),
        }
    }
}

/// Summary statistics for a conformance run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total number of files considered
    pub total_files: usize,
    /// Files skipped because they could not be parsed
    pub skipped_files: usize,
    /// Number of violations by severity level
    pub violations_by_severity: ViolationCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when the run was performed
    pub checked_at: DateTime<Utc>,
}

/// Count of violations by severity level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl ViolationCounts {
    /// Total number of violations across all severities
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }

    /// Whether there are any error-severity violations
    pub fn has_blocking(&self) -> bool {
        self.error > 0
    }

    /// Add a violation to the counts
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Complete result of a conformance run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// All violations found during the run
    pub violations: Vec<Violation>,
    /// Summary statistics
    pub summary: RunSummary,
    /// Fingerprint of the configuration used for this run
    pub config_fingerprint: Option<String>,
}

impl RunReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
            summary: RunSummary {
                checked_at: Utc::now(),
                ..Default::default()
            },
            config_fingerprint: None,
        }
    }

    /// Add a violation to the report
    pub fn add_violation(&mut self, violation: Violation) {
        self.summary.violations_by_severity.add(violation.severity);
        self.violations.push(violation);
    }

    /// Whether the report contains any violations
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Whether the report contains error-severity violations
    pub fn has_errors(&self) -> bool {
        self.summary.violations_by_severity.has_blocking()
    }

    /// Whether the run fails under the given exit policy
    pub fn is_failure(&self, errors_only: bool) -> bool {
        if errors_only {
            self.has_errors()
        } else {
            self.has_violations()
        }
    }

    /// Process exit status for the run: 0 on success, 1 on failure
    pub fn exit_code(&self, errors_only: bool) -> i32 {
        if self.is_failure(errors_only) {
            1
        } else {
            0
        }
    }

    /// Get violations of a specific severity
    pub fn violations_by_severity(&self, severity: Severity) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.severity == severity)
    }

    /// Set the number of files considered
    pub fn set_files_checked(&mut self, count: usize) {
        self.summary.total_files = count;
    }

    /// Set the number of files skipped as unparsable
    pub fn set_files_skipped(&mut self, count: usize) {
        self.summary.skipped_files = count;
    }

    /// Set the execution time
    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Set the configuration fingerprint
    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: RunReport) {
        for violation in other.violations {
            self.add_violation(violation);
        }
        self.summary.total_files += other.summary.total_files;
        self.summary.skipped_files += other.summary.skipped_files;
    }

    /// Sort violations by file path and line number for stable output
    ///
    /// Per-file walks already yield non-decreasing lines; this makes the
    /// cross-file concatenation independent of processing order.
    pub fn sort_violations(&mut self) {
        self.violations.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then_with(|| a.line_number.unwrap_or(0).cmp(&b.line_number.unwrap_or(0)))
                .then_with(|| a.severity.cmp(&b.severity))
        });
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur during a conformance run
#[derive(Debug, thiserror::Error)]
pub enum SentinelError {
    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Rule definition was invalid
    #[error("Rule error: {message}")]
    Rule { message: String },

    /// Analysis failed for a specific file
    #[error("Analysis error in {file}: {message}")]
    Analysis { file: String, message: String },
}

impl SentinelError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a rule error
    pub fn rule(message: impl Into<String>) -> Self {
        Self::Rule {
            message: message.into(),
        }
    }

    /// Create an analysis error
    pub fn analysis(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analysis {
            file: file.into(),
            message: message.into(),
        }
    }
}

/// Result type for sentinel operations
pub type SentinelResult<T> = Result<T, SentinelError>;
