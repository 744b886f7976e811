use crate::syntax::{Node, SyntaxKind, SyntaxTree};
use crate::walker;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The lexical container of a node: the function body that textually
/// encloses it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Container {
    /// File scope.
    Global,
    /// A function body assigned to a name.
    Named(String),
    /// A lambda that is not directly assigned, keyed by where it starts.
    Anonymous { uri: String, row: usize },
}

impl Container {
    pub fn is_global(&self) -> bool {
        matches!(self, Container::Global)
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::Global
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Global => Ok(()),
            Container::Named(name) => f.write_str(name),
            Container::Anonymous { row, .. } => write!(f, "LAMBDA-{row}"),
        }
    }
}

/// Resolve the container of `node` in the file identified by `uri`.
pub fn container_of(node: Node, uri: &str) -> Container {
    match walker::find_parent(node, |p| p.kind() == SyntaxKind::FunctionBody) {
        Some(body) => body_container(body, uri),
        None => Container::Global,
    }
}

/// Pre-order walk of the whole tree that hands every node its container.
/// Each function body is classified once, when the walk enters it, so the
/// cost does not grow with nesting depth.
pub fn for_each_with_container<'tree>(
    tree: &'tree SyntaxTree,
    uri: &str,
    mut visit: impl FnMut(Node<'tree>, &Container),
) {
    let mut containers = vec![Container::Global];
    let mut stack = vec![(tree.root_node(), 0usize)];
    while let Some((node, scope)) = stack.pop() {
        visit(node, &containers[scope]);
        let inner = if node.kind() == SyntaxKind::FunctionBody {
            containers.push(body_container(node, uri));
            containers.len() - 1
        } else {
            scope
        };
        stack.extend(node.children().rev().map(|child| (child, inner)));
    }
}

/// The container a function body opens for everything inside it.
fn body_container(body: Node, uri: &str) -> Container {
    if let Some(name) = assigned_name(body) {
        return Container::Named(name);
    }
    Container::Anonymous {
        uri: uri.to_string(),
        row: body.start_position().row,
    }
}

/// The name a function body is assigned to, when the body is itself the
/// whole value of an assignment (`name:{...}`).
fn assigned_name(body: Node) -> Option<String> {
    let statement = body
        .parent()
        .filter(|p| p.kind() == SyntaxKind::ExpressionStatement)?;
    let assignment = statement
        .parent()
        .filter(|p| p.kind() == SyntaxKind::Assignment)?;
    if statement.first_named_child() != Some(body) {
        return None;
    }
    let name = walker::binding_target(assignment)?.text().trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::syntax::SyntaxTree;
    use crate::walker::for_each;

    fn containers_of(tree: &SyntaxTree, text: &str) -> Vec<Container> {
        let mut found = Vec::new();
        for_each(tree.root_node(), |n| {
            if n.kind().is_identifier() && n.text() == text {
                found.push(container_of(n, "file:///a.q"));
            }
        });
        found
    }

    #[test]
    fn test_file_scope_is_global() {
        let tree = parse("a:1");
        assert_eq!(containers_of(&tree, "a"), vec![Container::Global]);
    }

    #[test]
    fn test_assigned_function_is_named() {
        let tree = parse("f:{[x] y:x+1; y}");
        assert_eq!(
            containers_of(&tree, "y"),
            vec![Container::Named("f".into()), Container::Named("f".into())]
        );
        assert_eq!(containers_of(&tree, "f"), vec![Container::Global]);
    }

    #[test]
    fn test_lambda_is_anonymous_per_row() {
        let tree = parse("r:count {x+1} each til 3\ns:{[l] {x} each l}");
        let first = Container::Anonymous {
            uri: "file:///a.q".into(),
            row: 0,
        };
        let second = Container::Anonymous {
            uri: "file:///a.q".into(),
            row: 1,
        };
        assert_eq!(containers_of(&tree, "x"), vec![first.clone(), second]);
        assert_eq!(first.to_string(), "LAMBDA-0");
        assert_eq!(
            containers_of(&tree, "l"),
            vec![Container::Named("s".into()), Container::Named("s".into())]
        );
    }

    #[test]
    fn test_value_starting_with_lambda_takes_the_name() {
        let tree = parse("r:{x+1} each til 3");
        assert_eq!(containers_of(&tree, "x"), vec![Container::Named("r".into())]);
    }

    #[test]
    fn test_walk_agrees_with_container_of() {
        let tree = parse("f:{[x] g:{y+x}; {z} each x}\nh:1\n.a.b:{[p] p}");
        let mut visited = 0;
        for_each_with_container(&tree, "file:///a.q", |node, container| {
            assert_eq!(&container_of(node, "file:///a.q"), container, "{node:?}");
            visited += 1;
        });
        let mut total = 0;
        for_each(tree.root_node(), |_| total += 1);
        assert_eq!(visited, total);
    }

    #[test]
    fn test_display() {
        assert_eq!(Container::Global.to_string(), "");
        assert_eq!(Container::Named(".util.log".into()).to_string(), ".util.log");
    }
}
