use crate::syntax::{Node, SyntaxKind};

/// Visit `node` and then every descendant, in source order.
pub fn for_each<'tree>(node: Node<'tree>, mut visit: impl FnMut(Node<'tree>)) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        visit(current);
        stack.extend(current.children().rev());
    }
}

/// Walk parent links upward, returning the first ancestor matching `predicate`.
pub fn find_parent<'tree>(
    start: Node<'tree>,
    predicate: impl Fn(Node<'tree>) -> bool,
) -> Option<Node<'tree>> {
    let mut node = start.parent();
    while let Some(current) = node {
        if predicate(current) {
            return Some(current);
        }
        node = current.parent();
    }
    None
}

/// Whether `node` introduces a name.
pub fn is_definition(node: Node) -> bool {
    match node.kind() {
        SyntaxKind::Assignment => true,
        SyntaxKind::Program
        | SyntaxKind::ExpressionStatement
        | SyntaxKind::FunctionBody
        | SyntaxKind::ParameterList
        | SyntaxKind::ArgumentList
        | SyntaxKind::Call
        | SyntaxKind::Parenthesized
        | SyntaxKind::LocalIdentifier
        | SyntaxKind::GlobalIdentifier
        | SyntaxKind::Number
        | SyntaxKind::Symbol
        | SyntaxKind::String
        | SyntaxKind::Operator
        | SyntaxKind::Comment
        | SyntaxKind::SystemCommand
        | SyntaxKind::Error
        | SyntaxKind::LeftBrace
        | SyntaxKind::RightBrace
        | SyntaxKind::LeftBracket
        | SyntaxKind::RightBracket
        | SyntaxKind::LeftParen
        | SyntaxKind::RightParen
        | SyntaxKind::Semicolon
        | SyntaxKind::Colon
        | SyntaxKind::DoubleColon
        | SyntaxKind::Quote => false,
    }
}

/// Whether `node` uses a name.
pub fn is_reference(node: Node) -> bool {
    match node.kind() {
        SyntaxKind::LocalIdentifier | SyntaxKind::GlobalIdentifier => !node.is_missing(),
        SyntaxKind::Program
        | SyntaxKind::ExpressionStatement
        | SyntaxKind::Assignment
        | SyntaxKind::FunctionBody
        | SyntaxKind::ParameterList
        | SyntaxKind::ArgumentList
        | SyntaxKind::Call
        | SyntaxKind::Parenthesized
        | SyntaxKind::Number
        | SyntaxKind::Symbol
        | SyntaxKind::String
        | SyntaxKind::Operator
        | SyntaxKind::Comment
        | SyntaxKind::SystemCommand
        | SyntaxKind::Error
        | SyntaxKind::LeftBrace
        | SyntaxKind::RightBrace
        | SyntaxKind::LeftBracket
        | SyntaxKind::RightBracket
        | SyntaxKind::LeftParen
        | SyntaxKind::RightParen
        | SyntaxKind::Semicolon
        | SyntaxKind::Colon
        | SyntaxKind::DoubleColon
        | SyntaxKind::Quote => false,
    }
}

/// The name node a definition binds.
pub fn binding_target(definition: Node) -> Option<Node> {
    definition
        .first_named_child()
        .filter(|target| target.kind().is_identifier())
}

/// Whether `node` is the name bound by its parent definition.
pub fn is_binding_target(node: Node) -> bool {
    node.parent()
        .filter(|parent| is_definition(*parent))
        .and_then(binding_target)
        .is_some_and(|target| target == node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_for_each_is_pre_order() {
        let tree = parse("a:b");
        let mut kinds = Vec::new();
        for_each(tree.root_node(), |n| kinds.push(n.kind()));
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Program,
                SyntaxKind::ExpressionStatement,
                SyntaxKind::Assignment,
                SyntaxKind::LocalIdentifier,
                SyntaxKind::Colon,
                SyntaxKind::ExpressionStatement,
                SyntaxKind::LocalIdentifier,
            ]
        );
    }

    #[test]
    fn test_find_parent() {
        let tree = parse("f:{x}");
        let mut x = None;
        for_each(tree.root_node(), |n| {
            if n.kind() == SyntaxKind::LocalIdentifier && n.text() == "x" {
                x = Some(n);
            }
        });
        let x = x.expect("x should be in the tree");
        let body = find_parent(x, |p| p.kind() == SyntaxKind::FunctionBody);
        assert_eq!(body.map(|b| b.text()), Some("{x}"));
        assert!(find_parent(x, |p| p.kind() == SyntaxKind::Call).is_none());
    }

    #[test]
    fn test_definition_and_reference_predicates() {
        let tree = parse("a:b");
        let mut definitions = Vec::new();
        let mut references = Vec::new();
        for_each(tree.root_node(), |n| {
            if is_definition(n) {
                definitions.push(binding_target(n).map(|t| t.text()));
            }
            if is_reference(n) && !is_binding_target(n) {
                references.push(n.text());
            }
        });
        assert_eq!(definitions, vec![Some("a")]);
        assert_eq!(references, vec!["b"]);
    }
}
