//! Configuration loading and management for arch-sentinel
//!
//! Raw YAML structures are converted to clean domain objects; the default
//! configuration is embedded so the tool works without a config file.

use crate::domain::violations::{SentinelError, SentinelResult, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Main configuration structure for arch-sentinel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,
    /// Path scoping and exclusion configuration
    #[serde(default)]
    pub paths: PathConfig,
    /// Rule definitions
    #[serde(default)]
    pub rules: RulesConfig,
    /// Exit status policy
    #[serde(default)]
    pub exit: ExitConfig,
}

/// Path scoping and exclusion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Glob patterns excluded from directory discovery
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Directory markers that put a file in scope for directory-scoped rules
    #[serde(default = "default_scope_markers")]
    pub scope_markers: Vec<String>,
    /// Filename exempt from directory-scoped rules (package index files)
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

/// Rule definitions, one section per rule kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub forbidden_calls: ForbiddenCallsConfig,
    #[serde(default)]
    pub antipattern_raises: AntiPatternRaisesConfig,
    #[serde(default)]
    pub required_imports: RequiredImportsConfig,
}

/// Forbidden-call rule configuration: callee name to replacement guidance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForbiddenCallsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_error")]
    pub severity: Severity,
    /// Disallowed bare callee names mapped to replacement guidance
    #[serde(default = "default_forbidden_calls")]
    pub calls: BTreeMap<String, String>,
}

/// Anti-pattern raise rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiPatternRaisesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_warning")]
    pub severity: Severity,
    /// Too-generic exception constructor names
    #[serde(default = "default_generic_raises")]
    pub names: Vec<String>,
    /// Guidance appended to every anti-pattern raise message
    #[serde(default = "default_raise_guidance")]
    pub guidance: String,
}

/// Required-import rule configuration (advisory, directory-scoped)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredImportsConfig {
    /// Off by default: enabling it changes pass/fail semantics for
    /// existing files
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_warning")]
    pub severity: Severity,
    /// Module path substrings, at least one of which an in-scope file must
    /// import from
    #[serde(default = "default_required_modules")]
    pub modules: Vec<String>,
}

/// Exit status policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExitConfig {
    #[serde(default)]
    pub fail_on: FailOn,
}

/// Which violations make the run exit non-zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    /// Any violation, warnings included (reference behavior)
    #[default]
    Any,
    /// Error-severity violations only
    Error,
}

impl FailOn {
    /// Whether only error-severity violations count as failure
    pub fn errors_only(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl SentinelConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SentinelResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            SentinelError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            SentinelError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> SentinelResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| SentinelError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Default configuration with the built-in rule tables
    pub fn with_defaults() -> Self {
        Self {
            version: default_version(),
            paths: PathConfig::default(),
            rules: RulesConfig::default(),
            exit: ExitConfig::default(),
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> SentinelResult<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            return Err(SentinelError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        for pattern in &self.paths.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                SentinelError::config(format!("Invalid exclude pattern '{pattern}': {e}"))
            })?;
        }

        if self.rules.forbidden_calls.enabled && self.rules.forbidden_calls.calls.is_empty() {
            return Err(SentinelError::config(
                "forbidden_calls is enabled but lists no call names",
            ));
        }

        if self.rules.antipattern_raises.enabled && self.rules.antipattern_raises.names.is_empty() {
            return Err(SentinelError::config(
                "antipattern_raises is enabled but lists no exception names",
            ));
        }

        if self.rules.required_imports.enabled {
            if self.rules.required_imports.modules.is_empty() {
                return Err(SentinelError::config(
                    "required_imports is enabled but lists no modules",
                ));
            }
            if self.paths.scope_markers.is_empty() {
                return Err(SentinelError::config(
                    "required_imports is enabled but paths.scope_markers is empty",
                ));
            }
        }

        Ok(())
    }

    /// Convert to JSON for serialization
    pub fn to_json(&self) -> SentinelResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SentinelError::config(format!("Failed to serialize config: {e}")))
    }

    /// Stable fingerprint of the configuration, recorded in run reports
    pub fn fingerprint(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        self.version.hash(&mut hasher);

        for pattern in &self.paths.exclude {
            pattern.hash(&mut hasher);
        }
        for marker in &self.paths.scope_markers {
            marker.hash(&mut hasher);
        }
        self.paths.index_file.hash(&mut hasher);

        let forbidden = &self.rules.forbidden_calls;
        forbidden.enabled.hash(&mut hasher);
        forbidden.severity.hash(&mut hasher);
        // BTreeMap iterates in key order, so the hash is stable
        for (name, guidance) in &forbidden.calls {
            name.hash(&mut hasher);
            guidance.hash(&mut hasher);
        }

        let raises = &self.rules.antipattern_raises;
        raises.enabled.hash(&mut hasher);
        raises.severity.hash(&mut hasher);
        for name in &raises.names {
            name.hash(&mut hasher);
        }
        raises.guidance.hash(&mut hasher);

        let imports = &self.rules.required_imports;
        imports.enabled.hash(&mut hasher);
        imports.severity.hash(&mut hasher);
        for module in &imports.modules {
            module.hash(&mut hasher);
        }

        self.exit.fail_on.errors_only().hash(&mut hasher);

        format!("{:x}", hasher.finish())
    }
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            scope_markers: default_scope_markers(),
            index_file: default_index_file(),
        }
    }
}

impl Default for ForbiddenCallsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: Severity::Error,
            calls: default_forbidden_calls(),
        }
    }
}

impl Default for AntiPatternRaisesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: Severity::Warning,
            names: default_generic_raises(),
            guidance: default_raise_guidance(),
        }
    }
}

impl Default for RequiredImportsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            severity: Severity::Warning,
            modules: default_required_modules(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_error() -> Severity {
    Severity::Error
}

fn default_warning() -> Severity {
    Severity::Warning
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/__pycache__/**".to_string(),
        "**/.venv/**".to_string(),
        "**/venv/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/build/**".to_string(),
        "**/dist/**".to_string(),
    ]
}

fn default_scope_markers() -> Vec<String> {
    vec!["src/".to_string(), "api/".to_string()]
}

fn default_index_file() -> String {
    "__init__.py".to_string()
}

fn default_forbidden_calls() -> BTreeMap<String, String> {
    let mut calls = BTreeMap::new();
    calls.insert(
        "print".to_string(),
        "Production code must use \"src.logger\" instead of print().".to_string(),
    );
    calls
}

fn default_generic_raises() -> Vec<String> {
    vec![
        "Exception".to_string(),
        "ValueError".to_string(),
        "TypeError".to_string(),
        "KeyError".to_string(),
    ]
}

fn default_raise_guidance() -> String {
    "Wrap it in the project's detailed exception or use a custom exception.".to_string()
}

fn default_required_modules() -> Vec<String> {
    vec!["src.logger".to_string(), "src.exception".to_string()]
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: SentinelConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: SentinelConfig::default(),
        }
    }

    /// Add an exclude pattern for directory discovery
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.config.paths.exclude.push(pattern.into());
        self
    }

    /// Add a forbidden call name with its replacement guidance
    pub fn forbid_call(mut self, name: impl Into<String>, guidance: impl Into<String>) -> Self {
        self.config
            .rules
            .forbidden_calls
            .calls
            .insert(name.into(), guidance.into());
        self
    }

    /// Add a generic exception name to the anti-pattern raise set
    pub fn flag_raise(mut self, name: impl Into<String>) -> Self {
        self.config
            .rules
            .antipattern_raises
            .names
            .push(name.into());
        self
    }

    /// Enable or disable the advisory required-import rule
    pub fn require_imports(mut self, enabled: bool) -> Self {
        self.config.rules.required_imports.enabled = enabled;
        self
    }

    /// Set the exit status policy
    pub fn fail_on(mut self, policy: FailOn) -> Self {
        self.config.exit.fail_on = policy;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> SentinelResult<SentinelConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SentinelConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.rules.forbidden_calls.calls.contains_key("print"));
        assert!(!config.rules.required_imports.enabled);
        assert_eq!(config.exit.fail_on, FailOn::Any);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let config = SentinelConfig::default();
        assert_eq!(config.fingerprint(), config.fingerprint());

        let changed = ConfigBuilder::new()
            .forbid_call("eval", "Use ast.literal_eval for data parsing.")
            .build()
            .unwrap();
        assert_ne!(config.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = SentinelConfig::load_from_str(
            "version: \"1.0\"\nrules:\n  required_imports:\n    enabled: true\n",
        )
        .unwrap();

        assert!(config.rules.required_imports.enabled);
        // Untouched sections keep their embedded defaults
        assert!(config.rules.forbidden_calls.enabled);
        assert_eq!(
            config.rules.antipattern_raises.names,
            vec!["Exception", "ValueError", "TypeError", "KeyError"]
        );
        assert_eq!(config.paths.scope_markers, vec!["src/", "api/"]);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let result = SentinelConfig::load_from_str("version: \"2.0\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn bad_exclude_pattern_is_rejected() {
        let mut config = SentinelConfig::default();
        config.paths.exclude.push("[".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn enabled_rule_with_no_data_is_rejected() {
        let mut config = SentinelConfig::default();
        config.rules.forbidden_calls.calls.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_round_trip_preserves_rules() {
        let config = SentinelConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let rehydrated = SentinelConfig::load_from_str(&yaml).unwrap();

        assert_eq!(config.version, rehydrated.version);
        assert_eq!(
            config.rules.forbidden_calls.calls,
            rehydrated.rules.forbidden_calls.calls
        );
        assert_eq!(config.fingerprint(), rehydrated.fingerprint());
    }
}
