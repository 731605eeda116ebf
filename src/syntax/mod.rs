//! Python syntax tree construction via tree-sitter
//!
//! Parses one file's text into a distilled [`SyntaxTree`] whose nodes carry
//! a closed [`NodeKind`] tag plus source position. The distilled tree keeps
//! one node per named grammar node so a pre-order walk visits every
//! construct exactly once, in textual order.

use std::cell::RefCell;

use tree_sitter::{Node as TsNode, Parser};

thread_local! {
    // Parser setup touches native state; reuse one instance per thread so
    // rayon workers don't re-initialize the grammar for every file.
    static PYTHON_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

/// Why a file's text could not be turned into a usable tree.
///
/// A parse failure is recovered by the caller: the file is skipped for rule
/// evaluation and contributes no violations.
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    /// The grammar flagged ERROR or MISSING nodes in the source
    #[error("source contains syntax errors")]
    SyntaxErrors,
    /// The parser returned no tree at all
    #[error("parser produced no tree")]
    NoTree,
}

/// Kind tag for a distilled syntax node.
///
/// Closed set: rule matchers match exhaustively over these variants, so a
/// new kind forces every rule to acknowledge it at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A call expression; `callee` is the invoked name when the target is a
    /// bare identifier (attribute calls like `obj.method()` carry None)
    Call { callee: Option<String> },
    /// A raise statement; `exception` is the constructor name when the
    /// raised value is a direct call to a simple name
    Raise { exception: Option<String> },
    /// An import statement; `modules` lists every module path it references
    /// (the source module for from-imports, each target for plain imports)
    Import { modules: Vec<String> },
    /// Any other syntactic construct
    Other,
}

/// One node of the distilled tree, tagged with kind and source position
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    kind: NodeKind,
    line: u32,
    column: u32,
    children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Kind tag of this node
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Source line (1-indexed)
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Source column (1-indexed)
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Child nodes in textual order
    pub fn children(&self) -> &[SyntaxNode] {
        &self.children
    }
}

/// A parsed file's syntax tree, owned by the run that parsed it
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    root: SyntaxNode,
}

impl SyntaxTree {
    /// Root node (the module)
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        fn count(node: &SyntaxNode) -> usize {
            1 + node.children().iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }
}

/// Parse Python source text into a distilled syntax tree.
///
/// tree-sitter always yields a tree; a root containing error nodes means
/// the file is not valid Python and maps to [`ParseFailure::SyntaxErrors`].
pub fn parse_module(source: &str) -> Result<SyntaxTree, ParseFailure> {
    PYTHON_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            let mut parser = Parser::new();
            parser
                .set_language(&tree_sitter_python::LANGUAGE.into())
                .expect("failed to set python language");
            *slot = Some(parser);
        }
        let parser = slot.as_mut().expect("parser initialized above");

        let src = source.as_bytes();
        let tree = parser.parse(src, None).ok_or(ParseFailure::NoTree)?;
        let root = tree.root_node();

        if root.has_error() {
            return Err(ParseFailure::SyntaxErrors);
        }

        Ok(SyntaxTree {
            root: convert(root, src),
        })
    })
}

fn text<'a>(node: &TsNode<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.start_byte()..node.end_byte()]).unwrap_or("")
}

fn convert(node: TsNode<'_>, src: &[u8]) -> SyntaxNode {
    let pos = node.start_position();
    let mut children = Vec::with_capacity(node.named_child_count());

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        children.push(convert(child, src));
    }

    SyntaxNode {
        kind: classify(&node, src),
        line: pos.row as u32 + 1,
        column: pos.column as u32 + 1,
        children,
    }
}

fn classify(node: &TsNode<'_>, src: &[u8]) -> NodeKind {
    match node.kind() {
        "call" => NodeKind::Call {
            callee: bare_callee(node, src),
        },
        "raise_statement" => NodeKind::Raise {
            exception: raised_constructor(node, src),
        },
        "import_statement" => NodeKind::Import {
            modules: plain_import_modules(node, src),
        },
        "import_from_statement" => NodeKind::Import {
            modules: from_import_modules(node, src),
        },
        _ => NodeKind::Other,
    }
}

/// Callee name of a call whose function position is a bare identifier.
///
/// Attribute calls (`logger.info(..)`) are deliberately not resolved; the
/// forbidden-call check targets global primitives only.
fn bare_callee(node: &TsNode<'_>, src: &[u8]) -> Option<String> {
    let function = node.child_by_field_name("function")?;
    if function.kind() == "identifier" {
        Some(text(&function, src).to_owned())
    } else {
        None
    }
}

/// Constructor name when the raised value is a direct call to a simple name
/// (`raise ValueError("bad")`). Bare re-raises and raised variables yield
/// None.
fn raised_constructor(node: &TsNode<'_>, src: &[u8]) -> Option<String> {
    let raised = node.named_child(0)?;
    if raised.kind() != "call" {
        return None;
    }
    let function = raised.child_by_field_name("function")?;
    if function.kind() == "identifier" {
        Some(text(&function, src).to_owned())
    } else {
        None
    }
}

/// Module paths referenced by `import a.b, c as d`
fn plain_import_modules(node: &TsNode<'_>, src: &[u8]) -> Vec<String> {
    let mut modules = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "dotted_name" => modules.push(text(&child, src).to_owned()),
            "aliased_import" => {
                if let Some(name) = child.child_by_field_name("name") {
                    modules.push(text(&name, src).to_owned());
                }
            }
            _ => {}
        }
    }
    modules
}

/// Source module of `from a.b import c`
fn from_import_modules(node: &TsNode<'_>, src: &[u8]) -> Vec<String> {
    node.child_by_field_name("module_name")
        .map(|module| vec![text(&module, src).to_owned()])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> SyntaxTree {
        parse_module(src).expect("valid python should parse")
    }

    fn collect<'a>(node: &'a SyntaxNode, out: &mut Vec<&'a SyntaxNode>) {
        out.push(node);
        for child in node.children() {
            collect(child, out);
        }
    }

    fn nodes(tree: &SyntaxTree) -> Vec<&SyntaxNode> {
        let mut out = Vec::new();
        collect(tree.root(), &mut out);
        out
    }

    #[test]
    fn extracts_bare_call() {
        let tree = parse("print(\"x\")\n");
        let calls: Vec<_> = nodes(&tree)
            .into_iter()
            .filter(|n| matches!(n.kind(), NodeKind::Call { .. }))
            .collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].kind(),
            &NodeKind::Call {
                callee: Some("print".to_string())
            }
        );
        assert_eq!(calls[0].line(), 1);
    }

    #[test]
    fn attribute_call_has_no_bare_callee() {
        let tree = parse("logger.info(\"x\")\n");
        let calls: Vec<_> = nodes(&tree)
            .into_iter()
            .filter(|n| matches!(n.kind(), NodeKind::Call { .. }))
            .collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind(), &NodeKind::Call { callee: None });
    }

    #[test]
    fn extracts_raised_constructor() {
        let tree = parse("def f():\n    raise ValueError(\"bad\")\n");
        let raises: Vec<_> = nodes(&tree)
            .into_iter()
            .filter(|n| matches!(n.kind(), NodeKind::Raise { .. }))
            .collect();
        assert_eq!(raises.len(), 1);
        assert_eq!(
            raises[0].kind(),
            &NodeKind::Raise {
                exception: Some("ValueError".to_string())
            }
        );
        assert_eq!(raises[0].line(), 2);
    }

    #[test]
    fn bare_reraise_has_no_constructor() {
        let tree = parse("def f():\n    try:\n        pass\n    except KeyError:\n        raise\n");
        let raises: Vec<_> = nodes(&tree)
            .into_iter()
            .filter(|n| matches!(n.kind(), NodeKind::Raise { .. }))
            .collect();
        assert_eq!(raises.len(), 1);
        assert_eq!(raises[0].kind(), &NodeKind::Raise { exception: None });
    }

    #[test]
    fn extracts_from_import_module() {
        let tree = parse("from src.logger import configure_logger\n");
        let imports: Vec<_> = nodes(&tree)
            .into_iter()
            .filter(|n| matches!(n.kind(), NodeKind::Import { .. }))
            .collect();
        assert_eq!(imports.len(), 1);
        assert_eq!(
            imports[0].kind(),
            &NodeKind::Import {
                modules: vec!["src.logger".to_string()]
            }
        );
    }

    #[test]
    fn extracts_plain_import_modules() {
        let tree = parse("import os, src.exception as exc\n");
        let imports: Vec<_> = nodes(&tree)
            .into_iter()
            .filter(|n| matches!(n.kind(), NodeKind::Import { .. }))
            .collect();
        assert_eq!(imports.len(), 1);
        assert_eq!(
            imports[0].kind(),
            &NodeKind::Import {
                modules: vec!["os".to_string(), "src.exception".to_string()]
            }
        );
    }

    #[test]
    fn syntax_errors_are_a_parse_failure() {
        let result = parse_module("def broken(:\n    pass\n");
        assert!(matches!(result, Err(ParseFailure::SyntaxErrors)));
    }

    #[test]
    fn empty_source_parses() {
        let tree = parse("");
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn preorder_lines_are_non_decreasing() {
        let tree = parse(
            "import os\n\ndef f(x):\n    if x:\n        print(x)\n    raise ValueError(\"bad\")\n",
        );
        let lines: Vec<u32> = nodes(&tree).iter().map(|n| n.line()).collect();
        assert!(lines.windows(2).all(|w| w[0] <= w[1]), "lines: {lines:?}");
    }
}
