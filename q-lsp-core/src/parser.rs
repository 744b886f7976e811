//! Error-recovering parser for q source.
//!
//! q has no explicit scope or declaration syntax, so the tree only records
//! the shapes analysis relies on: assignments, lambdas with their parameter
//! lists, bracketed applications, and the leaves in between. Parsing never
//! fails. Unexpected tokens are wrapped in `ERROR` nodes and unclosed
//! delimiters are closed with zero-width missing nodes.

use crate::lexer::{self, Token, TokenKind};
use crate::syntax::{Span, SyntaxKind, SyntaxTree, TreeBuilder};
use tracing::debug;

/// Deeper bracket nesting than this is treated as a syntax error rather
/// than recursed into.
const MAX_NESTING: usize = 256;

/// Parse a string of q source code.
pub fn parse(source: &str) -> SyntaxTree {
    let tokens = lexer::tokenize(source);
    debug!("Parsing {} bytes ({} tokens)", source.len(), tokens.len());
    let mut parser = Parser {
        tokens,
        pos: 0,
        builder: TreeBuilder::new(SyntaxKind::Program),
        delimiters: Vec::new(),
        last_end: Span::default(),
    };
    parser.program();
    parser.builder.finish(source, lexer::end_point(source))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    builder: TreeBuilder,
    /// Closing tokens expected by the currently open delimiters.
    delimiters: Vec<TokenKind>,
    /// Zero-width span just after the last consumed token.
    last_end: Span,
}

fn leaf_kind(kind: TokenKind) -> SyntaxKind {
    match kind {
        TokenKind::LocalIdentifier => SyntaxKind::LocalIdentifier,
        TokenKind::GlobalIdentifier => SyntaxKind::GlobalIdentifier,
        TokenKind::Number => SyntaxKind::Number,
        TokenKind::Symbol => SyntaxKind::Symbol,
        TokenKind::String | TokenKind::UnterminatedString => SyntaxKind::String,
        TokenKind::Operator | TokenKind::Unknown => SyntaxKind::Operator,
        TokenKind::Colon => SyntaxKind::Colon,
        TokenKind::DoubleColon => SyntaxKind::DoubleColon,
        TokenKind::LeftBrace => SyntaxKind::LeftBrace,
        TokenKind::RightBrace => SyntaxKind::RightBrace,
        TokenKind::LeftBracket => SyntaxKind::LeftBracket,
        TokenKind::RightBracket => SyntaxKind::RightBracket,
        TokenKind::LeftParen => SyntaxKind::LeftParen,
        TokenKind::RightParen => SyntaxKind::RightParen,
        TokenKind::Semicolon => SyntaxKind::Semicolon,
        TokenKind::Comment => SyntaxKind::Comment,
        TokenKind::SystemCommand => SyntaxKind::SystemCommand,
        TokenKind::LineBreak => SyntaxKind::Operator,
    }
}

impl Parser {
    fn nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .filter(|t| !t.kind.is_trivia())
            .nth(n)
            .map(|t| t.kind)
    }

    fn peek(&self) -> Option<TokenKind> {
        self.nth(0)
    }

    fn at_terminator(&self) -> bool {
        match self.peek() {
            None => true,
            Some(kind) => {
                kind == TokenKind::Semicolon || kind == TokenKind::LineBreak || kind.is_closer()
            }
        }
    }

    /// Attach pending comments to the innermost open node.
    fn flush_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_trivia() {
                break;
            }
            self.builder.token(SyntaxKind::Comment, token.span);
            self.pos += 1;
        }
    }

    fn bump_as(&mut self, kind: SyntaxKind) {
        self.flush_trivia();
        if let Some(token) = self.tokens.get(self.pos) {
            self.builder.token(kind, token.span);
            self.last_end = Span::empty_at(token.span.end_byte, token.span.end);
            self.pos += 1;
        }
    }

    fn bump(&mut self) {
        self.flush_trivia();
        if let Some(token) = self.tokens.get(self.pos) {
            let kind = leaf_kind(token.kind);
            self.bump_as(kind);
        }
    }

    /// Consume a line break; it does not become a node.
    fn skip(&mut self) {
        self.flush_trivia();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn start_node(&mut self, kind: SyntaxKind) {
        self.flush_trivia();
        self.builder.start_node(kind);
    }

    fn finish_node(&mut self) {
        self.builder.finish_node(self.last_end);
    }

    fn missing(&mut self, kind: SyntaxKind) {
        self.builder.missing(kind, self.last_end);
    }

    fn error_token(&mut self) {
        self.start_node(SyntaxKind::Error);
        self.bump();
        self.finish_node();
    }

    /// Whether `closer` belongs to a delimiter opened outside the innermost one.
    fn closes_enclosing(&self, closer: TokenKind) -> bool {
        let enclosing = self.delimiters.len().saturating_sub(1);
        self.delimiters[..enclosing].contains(&closer)
    }

    fn program(&mut self) {
        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::LineBreak => self.skip(),
                TokenKind::Semicolon => self.bump(),
                kind if kind.is_closer() => self.error_token(),
                _ => self.statement(),
            }
        }
        self.flush_trivia();
    }

    fn statement(&mut self) {
        self.start_node(SyntaxKind::ExpressionStatement);
        self.expression();
        self.finish_node();
    }

    /// Terms up to the end of the statement. q evaluates right to left, so
    /// an assignment swallows the rest of the statement as its value.
    ///
    /// Chains such as `a:b:c:1` nest one assignment per name but are parsed
    /// in this one loop: each assignment and its value statement stay open
    /// until the terminator, then close together.
    fn expression(&mut self) {
        let mut open_assignments = 0usize;
        while !self.at_terminator() {
            let is_assignment = matches!(
                self.peek(),
                Some(TokenKind::LocalIdentifier | TokenKind::GlobalIdentifier)
            ) && matches!(self.nth(1), Some(TokenKind::Colon | TokenKind::DoubleColon));
            if !is_assignment {
                self.term();
                continue;
            }

            self.start_node(SyntaxKind::Assignment);
            self.bump();
            self.bump();
            if self.at_terminator() {
                self.missing(SyntaxKind::ExpressionStatement);
                self.finish_node();
            } else {
                self.start_node(SyntaxKind::ExpressionStatement);
                open_assignments += 1;
            }
        }
        for _ in 0..open_assignments {
            // value statement, then the assignment itself
            self.finish_node();
            self.finish_node();
        }
    }

    fn term(&mut self) {
        self.flush_trivia();
        let checkpoint = self.builder.checkpoint();
        let nested_too_deep = self.delimiters.len() >= MAX_NESTING;
        match self.peek() {
            Some(TokenKind::LeftBrace | TokenKind::LeftParen | TokenKind::LeftBracket)
                if nested_too_deep =>
            {
                self.error_token();
                return;
            }
            Some(TokenKind::LeftBrace) => self.function_body(),
            Some(TokenKind::LeftParen) => {
                self.delimited(SyntaxKind::Parenthesized, TokenKind::RightParen)
            }
            Some(TokenKind::LeftBracket) => {
                self.delimited(SyntaxKind::ArgumentList, TokenKind::RightBracket)
            }
            Some(TokenKind::UnterminatedString) => {
                self.bump();
                self.missing(SyntaxKind::Quote);
            }
            Some(TokenKind::Unknown) => self.error_token(),
            Some(_) => self.bump(),
            None => return,
        }
        while self.peek() == Some(TokenKind::LeftBracket) && self.delimiters.len() < MAX_NESTING {
            self.builder.start_node_at(checkpoint, SyntaxKind::Call);
            self.delimited(SyntaxKind::ArgumentList, TokenKind::RightBracket);
            self.finish_node();
        }
    }

    fn function_body(&mut self) {
        self.start_node(SyntaxKind::FunctionBody);
        self.bump();
        self.delimiters.push(TokenKind::RightBrace);
        if self.peek() == Some(TokenKind::LeftBracket) {
            self.parameter_list();
        }
        self.delimited_items(TokenKind::RightBrace);
        self.delimiters.pop();
        self.finish_node();
    }

    fn parameter_list(&mut self) {
        self.start_node(SyntaxKind::ParameterList);
        self.bump();
        self.delimiters.push(TokenKind::RightBracket);
        loop {
            match self.peek() {
                Some(TokenKind::RightBracket) => {
                    self.bump();
                    break;
                }
                Some(TokenKind::Semicolon | TokenKind::LocalIdentifier) => self.bump(),
                None | Some(TokenKind::LineBreak) => {
                    self.missing(SyntaxKind::RightBracket);
                    break;
                }
                Some(kind) if kind.is_closer() && self.closes_enclosing(kind) => {
                    self.missing(SyntaxKind::RightBracket);
                    break;
                }
                Some(_) => self.error_token(),
            }
        }
        self.delimiters.pop();
        self.finish_node();
    }

    fn delimited(&mut self, kind: SyntaxKind, close: TokenKind) {
        self.start_node(kind);
        self.bump();
        self.delimiters.push(close);
        self.delimited_items(close);
        self.delimiters.pop();
        self.finish_node();
    }

    /// Statements separated by `;` up to and including `close`.
    fn delimited_items(&mut self, close: TokenKind) {
        loop {
            match self.peek() {
                Some(kind) if kind == close => {
                    self.bump();
                    return;
                }
                Some(TokenKind::Semicolon) => self.bump(),
                None | Some(TokenKind::LineBreak) => {
                    self.missing(leaf_kind(close));
                    return;
                }
                Some(kind) if kind.is_closer() => {
                    if self.closes_enclosing(kind) {
                        self.missing(leaf_kind(close));
                        return;
                    }
                    self.error_token();
                }
                Some(_) => self.statement(),
            }
        }
    }
}
