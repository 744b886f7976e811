use lsp_types::{Position, Range};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every node kind the q grammar produces.
///
/// Named kinds carry meaning for analysis; the punctuation kinds are
/// anonymous tokens kept only so ranges and recovery markers line up with
/// the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxKind {
    Program,
    ExpressionStatement,
    Assignment,
    FunctionBody,
    ParameterList,
    ArgumentList,
    Call,
    Parenthesized,
    LocalIdentifier,
    GlobalIdentifier,
    Number,
    Symbol,
    String,
    Operator,
    Comment,
    SystemCommand,
    Error,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Semicolon,
    Colon,
    DoubleColon,
    Quote,
}

impl SyntaxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SyntaxKind::Program => "program",
            SyntaxKind::ExpressionStatement => "expression_statement",
            SyntaxKind::Assignment => "assignment",
            SyntaxKind::FunctionBody => "function_body",
            SyntaxKind::ParameterList => "parameter_list",
            SyntaxKind::ArgumentList => "argument_list",
            SyntaxKind::Call => "call",
            SyntaxKind::Parenthesized => "parenthesized",
            SyntaxKind::LocalIdentifier => "local_identifier",
            SyntaxKind::GlobalIdentifier => "global_identifier",
            SyntaxKind::Number => "number",
            SyntaxKind::Symbol => "symbol",
            SyntaxKind::String => "string",
            SyntaxKind::Operator => "operator",
            SyntaxKind::Comment => "comment",
            SyntaxKind::SystemCommand => "system_command",
            SyntaxKind::Error => "ERROR",
            SyntaxKind::LeftBrace => "{",
            SyntaxKind::RightBrace => "}",
            SyntaxKind::LeftBracket => "[",
            SyntaxKind::RightBracket => "]",
            SyntaxKind::LeftParen => "(",
            SyntaxKind::RightParen => ")",
            SyntaxKind::Semicolon => ";",
            SyntaxKind::Colon => ":",
            SyntaxKind::DoubleColon => "::",
            SyntaxKind::Quote => "\"",
        }
    }

    /// Anonymous kinds are punctuation; everything else is a named node.
    pub fn is_named(self) -> bool {
        !matches!(
            self,
            SyntaxKind::LeftBrace
                | SyntaxKind::RightBrace
                | SyntaxKind::LeftBracket
                | SyntaxKind::RightBracket
                | SyntaxKind::LeftParen
                | SyntaxKind::RightParen
                | SyntaxKind::Semicolon
                | SyntaxKind::Colon
                | SyntaxKind::DoubleColon
                | SyntaxKind::Quote
        )
    }

    pub fn is_identifier(self) -> bool {
        matches!(self, SyntaxKind::LocalIdentifier | SyntaxKind::GlobalIdentifier)
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zero-based row and byte column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    pub fn to_position(self) -> Position {
        Position::new(self.row as u32, self.column as u32)
    }
}

/// Source extent of a token or node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start: Point,
    pub end: Point,
}

impl Span {
    pub fn empty_at(byte: usize, point: Point) -> Self {
        Self {
            start_byte: byte,
            end_byte: byte,
            start: point,
            end: point,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_byte == self.end_byte
    }
}

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    kind: SyntaxKind,
    span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    is_missing: bool,
    has_error: bool,
}

/// An immutable syntax tree. Nodes live in an arena owned by the tree and
/// refer to their parent by index, so a tree is replaced as a whole.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root_node(&self) -> Node<'_> {
        Node {
            tree: self,
            id: self.root,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }
}

/// A borrowed handle to one node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree SyntaxTree,
    id: NodeId,
}

impl<'tree> Node<'tree> {
    fn data(&self) -> &'tree NodeData {
        self.tree.data(self.id)
    }

    fn wrap(&self, id: NodeId) -> Node<'tree> {
        Node {
            tree: self.tree,
            id,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn is_named(&self) -> bool {
        self.kind().is_named()
    }

    pub fn is_error(&self) -> bool {
        self.kind() == SyntaxKind::Error
    }

    pub fn is_missing(&self) -> bool {
        self.data().is_missing
    }

    pub fn has_error(&self) -> bool {
        self.data().has_error
    }

    pub fn start_byte(&self) -> usize {
        self.data().span.start_byte
    }

    pub fn end_byte(&self) -> usize {
        self.data().span.end_byte
    }

    pub fn start_position(&self) -> Point {
        self.data().span.start
    }

    pub fn end_position(&self) -> Point {
        self.data().span.end
    }

    pub fn span(&self) -> Span {
        self.data().span
    }

    pub fn range(&self) -> Range {
        Range::new(
            self.start_position().to_position(),
            self.end_position().to_position(),
        )
    }

    pub fn text(&self) -> &'tree str {
        let span = self.data().span;
        self.tree
            .source
            .get(span.start_byte..span.end_byte)
            .unwrap_or("")
    }

    pub fn parent(&self) -> Option<Node<'tree>> {
        self.data().parent.map(|id| self.wrap(id))
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = Node<'tree>> + 'tree {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        self.children().filter(|child| child.is_named())
    }

    pub fn first_named_child(&self) -> Option<Node<'tree>> {
        self.named_children().next()
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'tree>> {
        self.named_children().nth(index)
    }

    /// The smallest node whose extent covers `point`. A point sitting right
    /// after a token still resolves to that token when nothing starts there.
    pub fn descendant_for_position(&self, point: Point) -> Node<'tree> {
        let mut node = *self;
        'descend: loop {
            for child in node.children() {
                if child.start_position() <= point && point < child.end_position() {
                    node = child;
                    continue 'descend;
                }
            }
            for child in node.children() {
                if !child.span().is_empty()
                    && child.start_position() <= point
                    && point == child.end_position()
                {
                    node = child;
                    continue 'descend;
                }
            }
            return node;
        }
    }

    /// Render the named structure as an S-expression.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        // `None` closes the node opened before its children.
        let mut stack = vec![Some((*self, ""))];
        while let Some(step) = stack.pop() {
            let Some((node, separator)) = step else {
                out.push(')');
                continue;
            };
            out.push_str(separator);
            if node.is_missing() {
                out.push_str(&format!("(MISSING {:?})", node.kind().as_str()));
                continue;
            }
            out.push('(');
            out.push_str(node.kind().as_str());
            stack.push(None);
            let children: Vec<_> = node.named_children().collect();
            stack.extend(children.into_iter().rev().map(|child| Some((child, " "))));
        }
        out
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {}] - [{}, {}]",
            self.kind(),
            self.start_position().row,
            self.start_position().column,
            self.end_position().row,
            self.end_position().column
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint(usize);

/// Bottom-up arena construction. Children are allocated before their
/// parent, and parent links are patched in when the parent is finished.
pub(crate) struct TreeBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<(SyntaxKind, Vec<NodeId>)>,
}

impl TreeBuilder {
    pub(crate) fn new(root: SyntaxKind) -> Self {
        Self {
            nodes: Vec::new(),
            stack: vec![(root, Vec::new())],
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        for &child in &data.children {
            self.nodes[child.0].parent = Some(id);
        }
        self.nodes.push(data);
        id
    }

    fn attach(&mut self, id: NodeId) {
        if let Some((_, children)) = self.stack.last_mut() {
            children.push(id);
        }
    }

    pub(crate) fn token(&mut self, kind: SyntaxKind, span: Span) {
        let id = self.alloc(NodeData {
            kind,
            span,
            parent: None,
            children: Vec::new(),
            is_missing: false,
            has_error: kind == SyntaxKind::Error,
        });
        self.attach(id);
    }

    pub(crate) fn missing(&mut self, kind: SyntaxKind, span: Span) {
        let id = self.alloc(NodeData {
            kind,
            span,
            parent: None,
            children: Vec::new(),
            is_missing: true,
            has_error: true,
        });
        self.attach(id);
    }

    pub(crate) fn start_node(&mut self, kind: SyntaxKind) {
        self.stack.push((kind, Vec::new()));
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.stack.last().map_or(0, |(_, children)| children.len()))
    }

    /// Open a node that adopts every child emitted since `checkpoint`.
    pub(crate) fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        let adopted = match self.stack.last_mut() {
            Some((_, children)) if checkpoint.0 <= children.len() => children.split_off(checkpoint.0),
            _ => Vec::new(),
        };
        self.stack.push((kind, adopted));
    }

    /// Close the innermost open node. `fallback` positions a node that
    /// ended up with no children.
    pub(crate) fn finish_node(&mut self, fallback: Span) {
        // The root frame is only closed by `finish`.
        if self.stack.len() <= 1 {
            return;
        }
        let Some((kind, children)) = self.stack.pop() else {
            return;
        };
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => {
                let first = self.nodes[first.0].span;
                let last = self.nodes[last.0].span;
                Span {
                    start_byte: first.start_byte,
                    end_byte: last.end_byte,
                    start: first.start,
                    end: last.end,
                }
            }
            _ => fallback,
        };
        let has_error =
            kind == SyntaxKind::Error || children.iter().any(|c| self.nodes[c.0].has_error);
        let id = self.alloc(NodeData {
            kind,
            span,
            parent: None,
            children,
            is_missing: false,
            has_error,
        });
        self.attach(id);
    }

    /// Close every open node and return the tree, the root spanning `source`.
    pub(crate) fn finish(mut self, source: &str, end: Point) -> SyntaxTree {
        while self.stack.len() > 1 {
            self.finish_node(Span::empty_at(source.len(), end));
        }
        let (kind, children) = self.stack.pop().unwrap_or((SyntaxKind::Program, Vec::new()));
        let has_error = children.iter().any(|c| self.nodes[c.0].has_error);
        let root = self.alloc(NodeData {
            kind,
            span: Span {
                start_byte: 0,
                end_byte: source.len(),
                start: Point::default(),
                end,
            },
            parent: None,
            children,
            is_missing: false,
            has_error,
        });
        SyntaxTree {
            source: source.to_string(),
            nodes: self.nodes,
            root,
        }
    }
}
