use crate::syntax::{Node, SyntaxTree};
use lsp_types::{Diagnostic, DiagnosticSeverity};

pub const DIAGNOSTIC_SOURCE: &str = "q-lsp";
pub const PARSE_ERROR_MESSAGE: &str = "failed to parse expression";

/// Syntax diagnostics for a freshly parsed tree: one error per `ERROR`
/// node, then one warning per missing token.
pub fn collect_diagnostics(tree: &SyntaxTree) -> Vec<Diagnostic> {
    let root = tree.root_node();
    let mut diagnostics = error_diagnostics(root);
    diagnostics.extend(missing_diagnostics(root));
    diagnostics
}

/// `ERROR` nodes are reported as a whole; nothing beneath one is visited.
fn error_diagnostics(root: Node) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() {
            diagnostics.push(diagnostic(
                node,
                DiagnosticSeverity::ERROR,
                PARSE_ERROR_MESSAGE.to_string(),
            ));
            continue;
        }
        stack.extend(node.children().rev());
    }
    diagnostics
}

/// Descends only through subtrees that contain an error.
fn missing_diagnostics(root: Node) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            diagnostics.push(diagnostic(
                node,
                DiagnosticSeverity::WARNING,
                format!(
                    "Syntax error: expected \"{}\" somewhere in the file",
                    node.kind()
                ),
            ));
        } else if node.has_error() {
            stack.extend(node.children().rev());
        }
    }
    diagnostics
}

fn diagnostic(node: Node, severity: DiagnosticSeverity, message: String) -> Diagnostic {
    Diagnostic::new(
        node.range(),
        Some(severity),
        None,                                // code
        Some(DIAGNOSTIC_SOURCE.to_string()), // source
        message,
        None, // related_information
        None, // tags
    )
}
