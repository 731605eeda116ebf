//! Arch Sentinel CLI - conformance checking for Python codebases
//!
//! Translates user commands to library operations and handles external
//! concerns: configuration discovery, terminal output, and process exit
//! codes.

use arch_sentinel::{
    AnalysisOptions, FailOn, OutputFormat, ReportFormatter, ReportOptions, SentinelConfig,
    SentinelResult, SentinelValidator, Severity, ValidationOptions,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;

/// Arch Sentinel - architecture conformance checking
#[derive(Parser)]
#[command(name = "arch-sentinel")]
#[command(version = "0.1.0")]
#[command(about = "Architecture conformance checking for Python codebases")]
#[command(
    long_about = "Arch Sentinel parses Python sources and checks them against architectural rules: forbidden calls, anti-pattern raises of generic exceptions, and required imports. Designed for pre-commit hooks and CI integration."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files or directories for conformance violations
    Check {
        /// Paths to analyze (files or directories)
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Minimum severity level to report
        #[arg(short, long, value_enum)]
        severity: Option<SeverityArg>,

        /// Maximum number of violations to report
        #[arg(long)]
        max_violations: Option<usize>,

        /// Additional exclude patterns for directory discovery
        #[arg(long, action = clap::ArgAction::Append)]
        exclude: Vec<String>,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,

        /// Fail on the first unreadable file
        #[arg(long)]
        fail_fast: bool,

        /// Which violations make the exit status non-zero
        #[arg(long, value_enum)]
        fail_on: Option<FailOnArg>,

        /// Enable the advisory required-import rule
        #[arg(long)]
        require_imports: bool,

        /// Append a summary block after the violation lines
        #[arg(long)]
        summary: bool,
    },

    /// List the rules in the catalog
    Rules {
        /// Show only enabled rules
        #[arg(long)]
        enabled_only: bool,
    },

    /// Explain what a specific rule does
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },

    /// Validate a configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum SeverityArg {
    Info,
    Warning,
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum FailOnArg {
    Any,
    Error,
}

impl From<FailOnArg> for FailOn {
    fn from(arg: FailOnArg) -> Self {
        match arg {
            FailOnArg::Any => FailOn::Any,
            FailOnArg::Error => FailOn::Error,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli).await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run_command(cli: Cli) -> SentinelResult<i32> {
    match cli.command {
        Commands::Check {
            paths,
            format,
            severity,
            max_violations,
            exclude,
            no_parallel,
            fail_fast,
            fail_on,
            require_imports,
            summary,
        } => {
            run_check(
                cli.config,
                paths,
                format,
                severity,
                max_violations,
                exclude,
                no_parallel,
                fail_fast,
                fail_on,
                require_imports,
                summary,
            )
            .await
        }
        Commands::Rules { enabled_only } => run_list_rules(cli.config, enabled_only),
        Commands::Explain { rule_id } => run_explain(cli.config, rule_id),
        Commands::ValidateConfig { config_file } => {
            run_validate_config(config_file.or(cli.config))
        }
    }
}

/// Load the configuration from an explicit path, a discovered default
/// config file, or the embedded defaults
fn load_config(config_path: Option<PathBuf>) -> SentinelResult<SentinelConfig> {
    if let Some(config_path) = config_path {
        return SentinelConfig::load_from_file(config_path);
    }

    let default_configs = ["arch_sentinel.yaml", ".arch_sentinel.yaml"];
    for config_name in &default_configs {
        if Path::new(config_name).exists() {
            return SentinelConfig::load_from_file(config_name);
        }
    }

    Ok(SentinelConfig::default())
}

#[allow(clippy::too_many_arguments)]
async fn run_check(
    config_path: Option<PathBuf>,
    paths: Vec<PathBuf>,
    format: OutputFormatArg,
    severity: Option<SeverityArg>,
    max_violations: Option<usize>,
    exclude_patterns: Vec<String>,
    no_parallel: bool,
    fail_fast: bool,
    fail_on: Option<FailOnArg>,
    require_imports: bool,
    summary: bool,
) -> SentinelResult<i32> {
    let mut config = load_config(config_path)?;

    // CLI overrides for the two configurable policies
    if let Some(fail_on) = fail_on {
        config.exit.fail_on = fail_on.into();
    }
    if require_imports {
        config.rules.required_imports.enabled = true;
    }

    let report_options = ReportOptions {
        show_summary: summary,
        max_violations,
        min_severity: severity.map(|s| s.into()),
    };

    let validator = SentinelValidator::new_with_config(config)?
        .with_report_formatter(ReportFormatter::new(report_options.clone()));

    // Use current directory if no paths specified
    let paths = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };

    let validation_options = ValidationOptions {
        output_format: Some(format.into()),
        report_options,
        analysis_options: AnalysisOptions {
            parallel: !no_parallel,
            fail_fast,
            exclude_patterns,
            ..Default::default()
        },
    };

    let report = validator
        .validate_with_options(paths, &validation_options)
        .await?;

    let formatted = validator.format_report(&report, format.into())?;
    print!("{formatted}");

    Ok(validator.exit_code(&report))
}

fn run_list_rules(config_path: Option<PathBuf>, enabled_only: bool) -> SentinelResult<i32> {
    let config = load_config(config_path)?;

    println!("📋 Rule catalog\n");

    let forbidden = &config.rules.forbidden_calls;
    if forbidden.enabled || !enabled_only {
        let status = if forbidden.enabled { "✅" } else { "❌" };
        println!(
            "{} forbidden_call [{}] - disallowed calls: {}",
            status,
            forbidden.severity.as_str(),
            forbidden
                .calls
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let raises = &config.rules.antipattern_raises;
    if raises.enabled || !enabled_only {
        let status = if raises.enabled { "✅" } else { "❌" };
        println!(
            "{} antipattern_raise [{}] - generic raises: {}",
            status,
            raises.severity.as_str(),
            raises.names.join(", ")
        );
    }

    let imports = &config.rules.required_imports;
    if imports.enabled || !enabled_only {
        let status = if imports.enabled { "✅" } else { "❌" };
        println!(
            "{} required_import [{}] - required modules: {} (scope: {})",
            status,
            imports.severity.as_str(),
            imports.modules.join(", "),
            config.paths.scope_markers.join(", ")
        );
    }

    Ok(0)
}

fn run_explain(config_path: Option<PathBuf>, rule_id: String) -> SentinelResult<i32> {
    let config = load_config(config_path)?;

    match rule_id.as_str() {
        "forbidden_call" => {
            let rule = &config.rules.forbidden_calls;
            println!("📖 Rule: forbidden_call");
            println!("⚠️ Severity: {}", rule.severity.as_str());
            println!("✅ Enabled: {}", rule.enabled);
            println!();
            println!("Flags calls to disallowed primitives by bare callee name.");
            println!();
            println!("Disallowed calls:");
            for (name, guidance) in &rule.calls {
                println!("  {name}(): {guidance}");
            }
        }
        "antipattern_raise" => {
            let rule = &config.rules.antipattern_raises;
            println!("📖 Rule: antipattern_raise");
            println!("⚠️ Severity: {}", rule.severity.as_str());
            println!("✅ Enabled: {}", rule.enabled);
            println!();
            println!("Flags raise statements constructing a too-generic exception directly.");
            println!();
            println!("Generic exception names: {}", rule.names.join(", "));
            println!("Guidance: {}", rule.guidance);
        }
        "required_import" => {
            let rule = &config.rules.required_imports;
            println!("📖 Rule: required_import");
            println!("⚠️ Severity: {}", rule.severity.as_str());
            println!("✅ Enabled: {}", rule.enabled);
            println!();
            println!("Advisory: files under designated directories must import from");
            println!("one of the required modules. Package index files are exempt.");
            println!();
            println!("Required modules: {}", rule.modules.join(", "));
            println!("Scope markers: {}", config.paths.scope_markers.join(", "));
            println!("Exempt filename: {}", config.paths.index_file);
        }
        _ => {
            eprintln!("❌ Rule '{rule_id}' not found");
            println!();
            println!("Available rules:");
            println!("  - forbidden_call");
            println!("  - antipattern_raise");
            println!("  - required_import");
            return Ok(1);
        }
    }

    Ok(0)
}

fn run_validate_config(config_path: Option<PathBuf>) -> SentinelResult<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("arch_sentinel.yaml"));

    println!("Validating configuration: {}", config_path.display());

    match SentinelConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");
            println!("📊 Configuration summary:");
            println!(
                "  Forbidden calls: {} ({} names)",
                if config.rules.forbidden_calls.enabled {
                    "enabled"
                } else {
                    "disabled"
                },
                config.rules.forbidden_calls.calls.len()
            );
            println!(
                "  Anti-pattern raises: {} ({} names)",
                if config.rules.antipattern_raises.enabled {
                    "enabled"
                } else {
                    "disabled"
                },
                config.rules.antipattern_raises.names.len()
            );
            println!(
                "  Required imports: {} ({} modules)",
                if config.rules.required_imports.enabled {
                    "enabled"
                } else {
                    "disabled"
                },
                config.rules.required_imports.modules.len()
            );
            println!("  Exit policy: fail on {:?}", config.exit.fail_on);

            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            Ok(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_check_command_exit_codes() {
        let temp_dir = TempDir::new().unwrap();
        let dirty = temp_dir.path().join("dirty.py");
        let clean = temp_dir.path().join("clean.py");

        fs::write(&dirty, "print(\"x\")\n").unwrap();
        fs::write(&clean, "x = 1\n").unwrap();

        let run = |paths: Vec<PathBuf>| {
            run_check(
                None,
                paths,
                OutputFormatArg::Json,
                None,
                None,
                vec![],
                false,
                false,
                None,
                false,
                false,
            )
        };

        assert_eq!(run(vec![dirty]).await.unwrap(), 1);
        assert_eq!(run(vec![clean]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fail_on_error_override() {
        let temp_dir = TempDir::new().unwrap();
        let warning_only = temp_dir.path().join("w.py");
        fs::write(&warning_only, "def f():\n    raise ValueError(\"bad\")\n").unwrap();

        let code = run_check(
            None,
            vec![warning_only],
            OutputFormatArg::Json,
            None,
            None,
            vec![],
            false,
            false,
            Some(FailOnArg::Error),
            false,
            false,
        )
        .await
        .unwrap();

        assert_eq!(code, 0);
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("test_config.yaml");

        let config = SentinelConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        fs::write(&config_file, yaml).unwrap();

        let result = run_validate_config(Some(config_file));
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_explain_rule() {
        assert_eq!(run_explain(None, "forbidden_call".to_string()).unwrap(), 0);
        assert_eq!(
            run_explain(None, "nonexistent_rule".to_string()).unwrap(),
            1
        );
    }

    #[test]
    fn test_list_rules() {
        assert_eq!(run_list_rules(None, false).unwrap(), 0);
        assert_eq!(run_list_rules(None, true).unwrap(), 0);
    }
}
