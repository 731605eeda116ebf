//! Arch Sentinel - Architecture conformance checking for Python codebases
//!
//! Parses each supplied file into a syntax tree and walks it against a
//! fixed rule catalog: forbidden calls, anti-pattern raises of generic
//! exceptions, and an advisory required-import check. The library interface
//! serves as the application layer; the CLI and pre-commit hooks are thin
//! adapters over it.

pub mod analyzer;
pub mod config;
pub mod domain;
pub mod report;
pub mod rules;
pub mod syntax;

// Re-export main types for convenient access
pub use domain::violations::{
    RunReport, RunSummary, SentinelError, SentinelResult, Severity, Violation,
};

pub use config::{ConfigBuilder, FailOn, SentinelConfig};

pub use analyzer::{AnalysisOptions, Analyzer, FileAnalyzer, FileOutcome};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use rules::{FileContext, Rule, RuleSet};

pub use syntax::{parse_module, NodeKind, ParseFailure, SyntaxNode, SyntaxTree};

use std::path::{Path, PathBuf};

/// Main validator providing high-level conformance operations
pub struct SentinelValidator {
    analyzer: Analyzer,
    report_formatter: ReportFormatter,
    errors_only_exit: bool,
}

/// Options for validation workflows
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Output format for results
    pub output_format: Option<OutputFormat>,
    /// Report options
    pub report_options: ReportOptions,
    /// Analysis options
    pub analysis_options: AnalysisOptions,
}

impl SentinelValidator {
    /// Create a new validator with the given configuration
    pub fn new_with_config(config: SentinelConfig) -> SentinelResult<Self> {
        let errors_only_exit = config.exit.fail_on.errors_only();
        let analyzer = Analyzer::new(config)?;

        Ok(Self {
            analyzer,
            report_formatter: ReportFormatter::default(),
            errors_only_exit,
        })
    }

    /// Create a validator with default configuration
    pub fn new() -> SentinelResult<Self> {
        Self::new_with_config(SentinelConfig::default())
    }

    /// Create a validator loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> SentinelResult<Self> {
        let config = SentinelConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    /// Validate files or directories with default options
    pub async fn validate<P: AsRef<Path>>(&self, paths: Vec<P>) -> SentinelResult<RunReport> {
        self.validate_with_options(paths, &ValidationOptions::default())
            .await
    }

    /// Validate files or directories with custom options
    pub async fn validate_with_options<P: AsRef<Path>>(
        &self,
        paths: Vec<P>,
        options: &ValidationOptions,
    ) -> SentinelResult<RunReport> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        self.analyzer.check_paths(&paths, &options.analysis_options)
    }

    /// Validate a single file
    pub fn validate_file<P: AsRef<Path>>(&self, file_path: P) -> SentinelResult<RunReport> {
        self.analyzer
            .check_paths(&[file_path.as_ref()], &AnalysisOptions::default())
    }

    /// Validate an entire directory tree
    pub fn validate_directory<P: AsRef<Path>>(
        &self,
        root: P,
        options: &AnalysisOptions,
    ) -> SentinelResult<RunReport> {
        self.analyzer.check_directory(root, options)
    }

    /// Format a run report for output
    pub fn format_report(
        &self,
        report: &RunReport,
        format: OutputFormat,
    ) -> SentinelResult<String> {
        self.report_formatter.format_report(report, format)
    }

    /// Process exit status for a report under the configured exit policy
    pub fn exit_code(&self, report: &RunReport) -> i32 {
        report.exit_code(self.errors_only_exit)
    }

    /// The rule catalog this validator applies
    pub fn rules(&self) -> &RuleSet {
        self.analyzer.rules()
    }
}

/// Convenience function to create a validator with default settings
pub fn create_validator() -> SentinelResult<SentinelValidator> {
    SentinelValidator::new()
}

/// Convenience function to validate files with default settings
pub async fn check_files<P: AsRef<Path>>(files: Vec<P>) -> SentinelResult<RunReport> {
    let validator = SentinelValidator::new()?;
    validator.validate(files).await
}

/// Convenience function to validate a directory with default settings
pub fn check_directory<P: AsRef<Path>>(directory: P) -> SentinelResult<RunReport> {
    let validator = SentinelValidator::new()?;
    validator.validate_directory(directory, &AnalysisOptions::default())
}

/// Hook integration utilities
pub mod hook {
    use super::*;

    /// Pre-commit validation over the modified file set.
    ///
    /// Returns an error when the run fails under the configured exit
    /// policy, so hook harnesses can block the commit.
    pub async fn pre_commit_check<P: AsRef<Path>>(modified_files: Vec<P>) -> SentinelResult<()> {
        let validator = SentinelValidator::new()?;
        let report = validator.validate(modified_files).await?;

        if validator.exit_code(&report) != 0 {
            let count = report.violations.len();
            return Err(SentinelError::config(format!(
                "Pre-commit check failed: {} violation{} found",
                count,
                if count == 1 { "" } else { "s" }
            )));
        }

        Ok(())
    }

    /// Strict validation for CI pipelines: fails on any violation
    /// regardless of the configured exit policy.
    pub async fn ci_check<P: AsRef<Path>>(files: Vec<P>) -> SentinelResult<RunReport> {
        let validator = SentinelValidator::new()?;
        let report = validator.validate(files).await?;

        if report.has_violations() {
            return Err(SentinelError::config(format!(
                "CI validation failed: {} violations found",
                report.violations.len()
            )));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn forbidden_call_scenario() {
        // `print("x")` at line 10 yields an error line and a failing exit
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("f.py");
        let source = format!("{}print(\"x\")\n", "\n".repeat(9));
        fs::write(&test_file, source).unwrap();

        let validator = SentinelValidator::new().unwrap();
        let report = validator.validate(vec![&test_file]).await.unwrap();

        let output = validator
            .format_report(&report, OutputFormat::Human)
            .unwrap();
        assert!(output.contains(":10 ❌ Forbidden:"));
        assert!(output.contains("print()"));
        assert_eq!(validator.exit_code(&report), 1);
    }

    #[tokio::test]
    async fn antipattern_raise_scenario() {
        // `raise ValueError("bad")` at line 4 yields a warning line and,
        // under the default policy, a failing exit
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("f.py");
        fs::write(
            &test_file,
            "def f(x):\n    if x:\n        return x\n    raise ValueError(\"bad\")\n",
        )
        .unwrap();

        let validator = SentinelValidator::new().unwrap();
        let report = validator.validate(vec![&test_file]).await.unwrap();

        let output = validator
            .format_report(&report, OutputFormat::Human)
            .unwrap();
        assert!(output.contains(":4 ⚠️"));
        assert!(output.contains("ValueError"));
        assert_eq!(validator.exit_code(&report), 1);
    }

    #[tokio::test]
    async fn clean_file_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("f.py");
        fs::write(
            &test_file,
            "from src.logger import configure_logger\n\nlog = configure_logger(\"app\")\n",
        )
        .unwrap();

        let validator = SentinelValidator::new().unwrap();
        let report = validator.validate(vec![&test_file]).await.unwrap();

        let output = validator
            .format_report(&report, OutputFormat::Human)
            .unwrap();
        assert!(output.is_empty());
        assert_eq!(validator.exit_code(&report), 0);
    }

    #[tokio::test]
    async fn unparsable_file_does_not_mask_other_files() {
        let temp_dir = TempDir::new().unwrap();
        let bad = temp_dir.path().join("g.py");
        let good = temp_dir.path().join("f.py");
        fs::write(&bad, "def broken(:\n").unwrap();
        fs::write(&good, "print(\"x\")\n").unwrap();

        let validator = SentinelValidator::new().unwrap();
        let report = validator.validate(vec![&bad, &good]).await.unwrap();

        let output = validator
            .format_report(&report, OutputFormat::Human)
            .unwrap();
        assert!(!output.contains("g.py"));
        assert!(output.contains("f.py"));
        assert_eq!(report.summary.skipped_files, 1);
        assert_eq!(validator.exit_code(&report), 1);
    }

    #[tokio::test]
    async fn reruns_are_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("f.py");
        fs::write(
            &test_file,
            "print(\"a\")\n\ndef f():\n    raise KeyError(\"k\")\n",
        )
        .unwrap();

        let validator = SentinelValidator::new().unwrap();
        let first = validator.validate(vec![&test_file]).await.unwrap();
        let second = validator.validate(vec![&test_file]).await.unwrap();

        let render = |report: &RunReport| {
            validator
                .format_report(report, OutputFormat::Human)
                .unwrap()
        };
        assert_eq!(render(&first), render(&second));
        assert_eq!(
            validator.exit_code(&first),
            validator.exit_code(&second)
        );
    }

    #[tokio::test]
    async fn errors_only_policy_lets_warnings_pass() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("f.py");
        fs::write(&test_file, "def f():\n    raise ValueError(\"bad\")\n").unwrap();

        let config = ConfigBuilder::new().fail_on(FailOn::Error).build().unwrap();
        let validator = SentinelValidator::new_with_config(config).unwrap();
        let report = validator.validate(vec![&test_file]).await.unwrap();

        assert!(report.has_violations());
        assert!(!report.has_errors());
        assert_eq!(validator.exit_code(&report), 0);
    }

    #[tokio::test]
    async fn hook_pre_commit_check() {
        let temp_dir = TempDir::new().unwrap();
        let clean_file = temp_dir.path().join("clean.py");
        let dirty_file = temp_dir.path().join("dirty.py");

        fs::write(&clean_file, "x = 1\n").unwrap();
        fs::write(&dirty_file, "print(\"x\")\n").unwrap();

        assert!(hook::pre_commit_check(vec![clean_file]).await.is_ok());
        assert!(hook::pre_commit_check(vec![dirty_file]).await.is_err());
    }

    #[test]
    fn single_file_validation() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("f.py");
        fs::write(&test_file, "print(\"x\")\n").unwrap();

        let validator = SentinelValidator::new().unwrap();
        let report = validator.validate_file(&test_file).unwrap();

        assert!(report.has_violations());
        assert_eq!(report.summary.total_files, 1);
    }

    #[test]
    fn directory_validation() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.py"), "print(\"a\")\n").unwrap();
        fs::write(root.join("src/b.py"), "x = 1\n").unwrap();

        let report = check_directory(root).unwrap();

        assert_eq!(report.summary.total_files, 2);
        assert_eq!(report.violations.len(), 1);
    }
}
