//! Report generation with multiple output formats
//!
//! The human format is deliberately line-oriented, one violation per line,
//! so a clean run prints nothing and the output is byte-identical across
//! reruns of an unchanged file set.

use crate::domain::violations::{RunReport, SentinelError, SentinelResult, Severity, Violation};
use serde_json::Value as JsonValue;
use std::io::Write;

/// Supported output formats for run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Line-oriented format: `<path>:<line> <marker> <message>`
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// GitHub Actions workflow commands
    GitHub,
}

impl OutputFormat {
    /// Parse format from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "github" => Some(Self::GitHub),
            _ => None,
        }
    }

    /// All available format names
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "github"]
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to append a summary block after the violation lines
    /// (off by default so a clean run stays silent)
    pub show_summary: bool,
    /// Maximum number of violations to include
    pub max_violations: Option<usize>,
    /// Minimum severity level to include
    pub min_severity: Option<Severity>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            show_summary: false,
            max_violations: None,
            min_severity: None,
        }
    }
}

/// Main report formatter that dispatches to specific formats
pub struct ReportFormatter {
    options: ReportOptions,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format a run report in the specified format
    pub fn format_report(&self, report: &RunReport, format: OutputFormat) -> SentinelResult<String> {
        let filtered = self.filter_violations(&report.violations);

        match format {
            OutputFormat::Human => Ok(self.format_human(report, &filtered)),
            OutputFormat::Json => self.format_json(report, &filtered),
            OutputFormat::GitHub => Ok(self.format_github(&filtered)),
        }
    }

    /// Write a formatted report to a writer
    pub fn write_report<W: Write>(
        &self,
        report: &RunReport,
        format: OutputFormat,
        mut writer: W,
    ) -> SentinelResult<()> {
        let formatted = self.format_report(report, format)?;
        writer
            .write_all(formatted.as_bytes())
            .map_err(|e| SentinelError::Io { source: e })?;
        Ok(())
    }

    /// Filter violations based on report options
    fn filter_violations<'a>(&self, violations: &'a [Violation]) -> Vec<&'a Violation> {
        let mut filtered: Vec<&Violation> = violations
            .iter()
            .filter(|v| {
                if let Some(min_severity) = self.options.min_severity {
                    if v.severity < min_severity {
                        return false;
                    }
                }
                true
            })
            .collect();

        if let Some(max) = self.options.max_violations {
            filtered.truncate(max);
        }

        filtered
    }

    /// One line per violation; optional trailing summary
    fn format_human(&self, report: &RunReport, violations: &[&Violation]) -> String {
        let mut output = String::new();

        for violation in violations {
            output.push_str(&violation.format_line());
            output.push('\n');
        }

        if self.options.show_summary {
            output.push_str(&self.format_summary(report));
        }

        output
    }

    /// JSON document with violations and run summary
    fn format_json(&self, report: &RunReport, violations: &[&Violation]) -> SentinelResult<String> {
        let json_violations: Vec<JsonValue> = violations
            .iter()
            .map(|v| {
                serde_json::json!({
                    "rule_id": v.rule_id,
                    "severity": v.severity.as_str(),
                    "file_path": v.file_path.display().to_string(),
                    "line_number": v.line_number,
                    "column_number": v.column_number,
                    "message": v.message,
                    "suggested_fix": v.suggested_fix,
                    "detected_at": v.detected_at.to_rfc3339()
                })
            })
            .collect();

        let json_report = serde_json::json!({
            "violations": json_violations,
            "summary": {
                "total_files": report.summary.total_files,
                "skipped_files": report.summary.skipped_files,
                "violations_by_severity": {
                    "error": report.summary.violations_by_severity.error,
                    "warning": report.summary.violations_by_severity.warning,
                    "info": report.summary.violations_by_severity.info
                },
                "execution_time_ms": report.summary.execution_time_ms,
                "checked_at": report.summary.checked_at.to_rfc3339()
            },
            "config_fingerprint": report.config_fingerprint
        });

        serde_json::to_string_pretty(&json_report)
            .map_err(|e| SentinelError::config(format!("JSON serialization failed: {e}")))
    }

    /// GitHub Actions workflow commands
    fn format_github(&self, violations: &[&Violation]) -> String {
        let mut output = String::new();

        for violation in violations {
            let level = match violation.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info => "notice",
            };

            let position = match (violation.line_number, violation.column_number) {
                (Some(line), Some(col)) => format!(",line={line},col={col}"),
                (Some(line), None) => format!(",line={line}"),
                _ => String::new(),
            };

            output.push_str(&format!(
                "::{} file={},title={}{}::{}\n",
                level,
                violation.file_path.display(),
                violation.rule_id,
                position,
                violation.message
            ));
        }

        output
    }

    /// Summary block appended to human output on request
    fn format_summary(&self, report: &RunReport) -> String {
        let counts = &report.summary.violations_by_severity;
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;

        let mut parts = Vec::new();
        if counts.error > 0 {
            parts.push(format!(
                "{} error{}",
                counts.error,
                if counts.error == 1 { "" } else { "s" }
            ));
        }
        if counts.warning > 0 {
            parts.push(format!(
                "{} warning{}",
                counts.warning,
                if counts.warning == 1 { "" } else { "s" }
            ));
        }
        if counts.info > 0 {
            parts.push(format!("{} info", counts.info));
        }
        if parts.is_empty() {
            parts.push("0 violations".to_string());
        }

        let skipped = if report.summary.skipped_files > 0 {
            format!(", {} skipped", report.summary.skipped_files)
        } else {
            String::new()
        };

        format!(
            "{} in {} files{} ({:.1}s)\n",
            parts.join(", "),
            report.summary.total_files,
            skipped,
            execution_time
        )
    }
}
