//! Rule catalog and tree walker
//!
//! The catalog is a fixed table of rules built once from configuration and
//! read-only for the lifetime of the process. Each rule matcher is a pure
//! predicate over (node, file context); the walker visits every node of a
//! file's tree exactly once in pre-order and applies every rule at each
//! node, preserving visit order in the produced violations.

pub mod scope;

use crate::config::SentinelConfig;
use crate::domain::violations::{SentinelResult, Severity, Violation};
use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub use scope::PathScope;

/// Per-file context handed to rule matchers
#[derive(Debug, Clone)]
pub struct FileContext {
    path: PathBuf,
}

impl FileContext {
    /// Create a context for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the file under analysis
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A conformance rule, tagged by kind
#[derive(Debug, Clone)]
pub enum Rule {
    ForbiddenCall(ForbiddenCallRule),
    AntiPatternRaise(AntiPatternRaiseRule),
    RequiredImport(RequiredImportRule),
}

impl Rule {
    /// Stable identifier of this rule, used in violations and CLI listings
    pub fn id(&self) -> &'static str {
        match self {
            Self::ForbiddenCall(_) => ForbiddenCallRule::ID,
            Self::AntiPatternRaise(_) => AntiPatternRaiseRule::ID,
            Self::RequiredImport(_) => RequiredImportRule::ID,
        }
    }
}

/// Flags calls to disallowed primitives by bare callee name
#[derive(Debug, Clone)]
pub struct ForbiddenCallRule {
    severity: Severity,
    /// Callee name to replacement guidance
    calls: BTreeMap<String, String>,
}

impl ForbiddenCallRule {
    pub const ID: &'static str = "forbidden_call";

    /// Create a rule from a name-to-guidance table
    pub fn new(severity: Severity, calls: BTreeMap<String, String>) -> Self {
        Self { severity, calls }
    }

    /// Match one node, producing at most one violation
    fn check(&self, node: &SyntaxNode, ctx: &FileContext) -> Option<Violation> {
        match node.kind() {
            NodeKind::Call {
                callee: Some(name),
            } => self.calls.get(name).map(|guidance| {
                Violation::new(
                    Self::ID,
                    self.severity,
                    ctx.path().to_path_buf(),
                    format!("Forbidden: {guidance}"),
                )
                .with_position(node.line(), node.column())
                .with_suggestion(guidance.clone())
            }),
            NodeKind::Call { callee: None }
            | NodeKind::Raise { .. }
            | NodeKind::Import { .. }
            | NodeKind::Other => None,
        }
    }
}

/// Flags raise statements that construct a too-generic exception directly
/// at the raise site. Whether the value was wrapped elsewhere is not
/// checked.
#[derive(Debug, Clone)]
pub struct AntiPatternRaiseRule {
    severity: Severity,
    names: BTreeSet<String>,
    guidance: String,
}

impl AntiPatternRaiseRule {
    pub const ID: &'static str = "antipattern_raise";

    /// Create a rule from the generic constructor name set
    pub fn new(severity: Severity, names: BTreeSet<String>, guidance: impl Into<String>) -> Self {
        Self {
            severity,
            names,
            guidance: guidance.into(),
        }
    }

    fn check(&self, node: &SyntaxNode, ctx: &FileContext) -> Option<Violation> {
        match node.kind() {
            NodeKind::Raise {
                exception: Some(name),
            } if self.names.contains(name) => Some(
                Violation::new(
                    Self::ID,
                    self.severity,
                    ctx.path().to_path_buf(),
                    format!("Anti-Pattern: Raising generic '{name}'. {}", self.guidance),
                )
                .with_position(node.line(), node.column())
                .with_suggestion(self.guidance.clone()),
            ),
            NodeKind::Raise { .. }
            | NodeKind::Call { .. }
            | NodeKind::Import { .. }
            | NodeKind::Other => None,
        }
    }
}

/// Advisory rule: files under designated directories must import from one
/// of the required modules. Evaluated over the whole tree; inert unless
/// enabled in configuration.
#[derive(Debug, Clone)]
pub struct RequiredImportRule {
    enabled: bool,
    severity: Severity,
    modules: Vec<String>,
    scope: PathScope,
}

impl RequiredImportRule {
    pub const ID: &'static str = "required_import";

    /// Create a rule from required module substrings and a path scope
    pub fn new(enabled: bool, severity: Severity, modules: Vec<String>, scope: PathScope) -> Self {
        Self {
            enabled,
            severity,
            modules,
            scope,
        }
    }

    /// Whether this node's imports satisfy the requirement
    fn observe(&self, node: &SyntaxNode) -> bool {
        match node.kind() {
            NodeKind::Import { modules } => modules
                .iter()
                .any(|m| self.modules.iter().any(|required| m.contains(required))),
            NodeKind::Call { .. } | NodeKind::Raise { .. } | NodeKind::Other => false,
        }
    }

    /// Emit the advisory violation after a full-tree scan found no
    /// satisfying import
    fn finalize(&self, ctx: &FileContext, satisfied: bool) -> Option<Violation> {
        if !self.enabled || satisfied || !self.scope.applies_to(ctx.path()) {
            return None;
        }

        Some(
            Violation::new(
                Self::ID,
                self.severity,
                ctx.path().to_path_buf(),
                format!(
                    "Missing required import: expected an import from one of [{}].",
                    self.modules.join(", ")
                ),
            ),
        )
    }
}

/// The fixed rule table applied to every file
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build the catalog from configuration
    pub fn from_config(config: &SentinelConfig) -> SentinelResult<Self> {
        config.validate()?;

        let mut rules = Vec::new();

        let forbidden = &config.rules.forbidden_calls;
        if forbidden.enabled {
            rules.push(Rule::ForbiddenCall(ForbiddenCallRule::new(
                forbidden.severity,
                forbidden.calls.clone(),
            )));
        }

        let raises = &config.rules.antipattern_raises;
        if raises.enabled {
            rules.push(Rule::AntiPatternRaise(AntiPatternRaiseRule::new(
                raises.severity,
                raises.names.iter().cloned().collect(),
                raises.guidance.clone(),
            )));
        }

        // Always present so listings show it; finalize() no-ops while the
        // rule is disabled.
        let imports = &config.rules.required_imports;
        rules.push(Rule::RequiredImport(RequiredImportRule::new(
            imports.enabled,
            imports.severity,
            imports.modules.clone(),
            PathScope::new(
                config.paths.scope_markers.clone(),
                config.paths.index_file.clone(),
            ),
        )));

        Ok(Self { rules })
    }

    /// Rules in the catalog, in evaluation order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Walk a file's tree and collect violations.
    ///
    /// Pre-order, depth-first; every node visited exactly once; violations
    /// appended in visit order with no de-duplication across rules. The
    /// required-import scan state lives only for the duration of the walk.
    pub fn check_tree(&self, tree: &SyntaxTree, ctx: &FileContext) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut import_satisfied = vec![false; self.rules.len()];

        self.visit(tree.root(), ctx, &mut violations, &mut import_satisfied);

        for (rule, satisfied) in self.rules.iter().zip(import_satisfied) {
            if let Rule::RequiredImport(required) = rule {
                if let Some(violation) = required.finalize(ctx, satisfied) {
                    violations.push(violation);
                }
            }
        }

        violations
    }

    fn visit(
        &self,
        node: &SyntaxNode,
        ctx: &FileContext,
        violations: &mut Vec<Violation>,
        import_satisfied: &mut [bool],
    ) {
        for (idx, rule) in self.rules.iter().enumerate() {
            match rule {
                Rule::ForbiddenCall(r) => {
                    if let Some(violation) = r.check(node, ctx) {
                        violations.push(violation);
                    }
                }
                Rule::AntiPatternRaise(r) => {
                    if let Some(violation) = r.check(node, ctx) {
                        violations.push(violation);
                    }
                }
                Rule::RequiredImport(r) => {
                    if r.observe(node) {
                        import_satisfied[idx] = true;
                    }
                }
            }
        }

        for child in node.children() {
            self.visit(child, ctx, violations, import_satisfied);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::syntax::parse_module;
    use rstest::rstest;

    fn default_rules() -> RuleSet {
        RuleSet::from_config(&SentinelConfig::default()).unwrap()
    }

    fn check(rules: &RuleSet, path: &str, source: &str) -> Vec<Violation> {
        let tree = parse_module(source).expect("fixture source should parse");
        rules.check_tree(&tree, &FileContext::new(path))
    }

    #[test]
    fn forbidden_print_is_an_error_at_the_call_line() {
        let violations = check(
            &default_rules(),
            "f.py",
            "x = 1\n\ndef emit(value):\n    print(value)\n",
        );

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id, ForbiddenCallRule::ID);
        assert_eq!(violations[0].severity, Severity::Error);
        assert_eq!(violations[0].line_number, Some(4));
        assert!(violations[0].message.contains("print()"));
    }

    #[test]
    fn method_named_print_is_not_flagged() {
        let violations = check(&default_rules(), "f.py", "report.print(\"x\")\n");
        assert!(violations.is_empty());
    }

    #[rstest]
    #[case("Exception")]
    #[case("ValueError")]
    #[case("TypeError")]
    #[case("KeyError")]
    fn generic_raise_is_a_warning(#[case] name: &str) {
        let source = format!("def f():\n    raise {name}(\"bad\")\n");
        let violations = check(&default_rules(), "f.py", &source);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id, AntiPatternRaiseRule::ID);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert_eq!(violations[0].line_number, Some(2));
        assert!(violations[0].message.contains(name));
    }

    #[test]
    fn custom_exception_raise_is_clean() {
        let violations = check(
            &default_rules(),
            "f.py",
            "def f():\n    raise PipelineError(\"bad\")\n",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn bare_reraise_is_clean() {
        let violations = check(
            &default_rules(),
            "f.py",
            "def f():\n    try:\n        pass\n    except KeyError:\n        raise\n",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn violations_follow_visit_order() {
        let source = "print(\"a\")\n\ndef f():\n    raise ValueError(\"bad\")\n\nprint(\"b\")\n";
        let violations = check(&default_rules(), "f.py", source);

        let lines: Vec<Option<u32>> = violations.iter().map(|v| v.line_number).collect();
        assert_eq!(lines, vec![Some(1), Some(4), Some(6)]);
    }

    #[test]
    fn required_import_rule_is_inert_by_default() {
        let violations = check(&default_rules(), "src/pipeline.py", "x = 1\n");
        assert!(violations.is_empty());
    }

    #[test]
    fn required_import_missing_in_scoped_file() {
        let config = ConfigBuilder::new().require_imports(true).build().unwrap();
        let rules = RuleSet::from_config(&config).unwrap();

        let violations = check(&rules, "src/pipeline.py", "import os\n\nx = 1\n");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id, RequiredImportRule::ID);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert!(violations[0].message.contains("src.logger"));
    }

    #[test]
    fn required_import_satisfied_by_from_import() {
        let config = ConfigBuilder::new().require_imports(true).build().unwrap();
        let rules = RuleSet::from_config(&config).unwrap();

        let violations = check(
            &rules,
            "src/pipeline.py",
            "from src.logger import configure_logger\n",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn required_import_satisfied_by_plain_import() {
        let config = ConfigBuilder::new().require_imports(true).build().unwrap();
        let rules = RuleSet::from_config(&config).unwrap();

        let violations = check(&rules, "src/pipeline.py", "import src.exception\n");
        assert!(violations.is_empty());
    }

    #[test]
    fn required_import_skips_out_of_scope_and_index_files() {
        let config = ConfigBuilder::new().require_imports(true).build().unwrap();
        let rules = RuleSet::from_config(&config).unwrap();

        assert!(check(&rules, "scripts/tool.py", "x = 1\n").is_empty());
        assert!(check(&rules, "src/__init__.py", "x = 1\n").is_empty());
    }

    #[test]
    fn one_node_can_trip_multiple_rules() {
        // ValueError in both the forbidden-call table and the raise set:
        // the raise node and its inner call node each report, undeduplicated.
        let config = ConfigBuilder::new()
            .forbid_call("ValueError", "Use a project exception type.")
            .build()
            .unwrap();
        let rules = RuleSet::from_config(&config).unwrap();

        let violations = check(&rules, "f.py", "raise ValueError(\"bad\")\n");
        let ids: Vec<&str> = violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(ids, vec![AntiPatternRaiseRule::ID, ForbiddenCallRule::ID]);
    }

    #[test]
    fn disabled_rule_sections_drop_out_of_the_catalog() {
        let mut config = SentinelConfig::default();
        config.rules.forbidden_calls.enabled = false;
        let rules = RuleSet::from_config(&config).unwrap();

        let violations = check(&rules, "f.py", "print(\"x\")\n");
        assert!(violations.is_empty());
    }
}
