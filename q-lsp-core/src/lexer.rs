use crate::syntax::{Point, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    LocalIdentifier,
    GlobalIdentifier,
    Number,
    Symbol,
    String,
    UnterminatedString,
    Operator,
    Colon,
    DoubleColon,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Semicolon,
    Comment,
    SystemCommand,
    /// A newline that starts a new top-level statement.
    LineBreak,
    Unknown,
}

impl TokenKind {
    pub(crate) fn is_trivia(self) -> bool {
        self == TokenKind::Comment
    }

    pub(crate) fn is_closer(self) -> bool {
        matches!(
            self,
            TokenKind::RightBrace | TokenKind::RightBracket | TokenKind::RightParen
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

const OPERATOR_BYTES: &[u8] = b"+-*%=<>~!@#$^&|,?_'./\\";

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r')
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    point: Point,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            point: Point::default(),
            tokens: Vec::new(),
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        let Some(&b) = self.bytes.get(self.pos) else {
            return;
        };
        // Always step over a whole character so spans stay on char boundaries.
        let width = self.src[self.pos..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.pos += width;
        if b == b'\n' {
            self.point.row += 1;
            self.point.column = 0;
        } else {
            self.point.column += width;
        }
    }

    fn advance_while(&mut self, mut pred: impl FnMut(u8) -> bool) {
        while let Some(b) = self.peek_at(0) {
            if !pred(b) {
                break;
            }
            self.advance();
        }
    }

    fn advance_to_line_end(&mut self) {
        self.advance_while(|b| b != b'\n');
    }

    /// The rest of the current line without its line terminator.
    fn current_line(&self) -> &'a str {
        let rest = &self.src[self.pos..];
        let line = rest.split('\n').next().unwrap_or("");
        line.trim_end_matches('\r')
    }

    fn emit(&mut self, kind: TokenKind, start: usize, start_point: Point) {
        self.tokens.push(Token {
            kind,
            span: Span {
                start_byte: start,
                end_byte: self.pos,
                start: start_point,
                end: self.point,
            },
        });
    }

    fn prev_is_blank(&self) -> bool {
        self.pos == 0 || matches!(self.bytes[self.pos - 1], b' ' | b'\t' | b'\r' | b'\n')
    }

    /// Constructs that are only recognised in the first column.
    fn line_start(&mut self) -> bool {
        let start = self.pos;
        let start_point = self.point;
        let line = self.current_line();
        if line.trim_end() == "/" {
            // Block comment, closed by a line holding only a backslash.
            loop {
                self.advance_to_line_end();
                if self.peek_at(0).is_none() {
                    break;
                }
                self.advance();
                if self.current_line().trim_end() == "\\" {
                    self.advance_to_line_end();
                    break;
                }
            }
            self.emit(TokenKind::Comment, start, start_point);
            return true;
        }
        if line.trim_end() == "\\" {
            // Everything after a lone backslash is ignored by the interpreter.
            while self.peek_at(0).is_some() {
                self.advance();
            }
            self.emit(TokenKind::Comment, start, start_point);
            return true;
        }
        if line.starts_with('/') {
            self.advance_to_line_end();
            self.emit(TokenKind::Comment, start, start_point);
            return true;
        }
        if line.starts_with('\\') {
            self.advance_to_line_end();
            self.emit(TokenKind::SystemCommand, start, start_point);
            return true;
        }
        false
    }

    fn string(&mut self, start: usize, start_point: Point) {
        self.advance();
        loop {
            match self.peek_at(0) {
                None => {
                    self.emit(TokenKind::UnterminatedString, start, start_point);
                    return;
                }
                Some(b'\\') => {
                    self.advance();
                    self.advance();
                }
                Some(b'"') => {
                    self.advance();
                    self.emit(TokenKind::String, start, start_point);
                    return;
                }
                Some(_) => self.advance(),
            }
        }
    }

    fn number(&mut self) {
        loop {
            match self.peek_at(0) {
                Some(b) if is_name_byte(b) => self.advance(),
                // Time literals such as 12:30:00.
                Some(b':') if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => self.advance(),
                _ => break,
            }
        }
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(b) = self.peek_at(0) {
            let start = self.pos;
            let start_point = self.point;

            if self.point.column == 0 && self.line_start() {
                continue;
            }

            match b {
                b'\n' => {
                    self.advance();
                    if self.peek_at(0).is_some_and(|next| !is_blank(next) && next != b'\n') {
                        self.emit(TokenKind::LineBreak, start, start_point);
                    }
                }
                b if is_blank(b) => self.advance(),
                b'/' if self.prev_is_blank() => {
                    self.advance_to_line_end();
                    self.emit(TokenKind::Comment, start, start_point);
                }
                b'"' => self.string(start, start_point),
                b'`' => {
                    self.advance();
                    self.advance_while(|b| is_name_byte(b) || b == b':' || b == b'/');
                    self.emit(TokenKind::Symbol, start, start_point);
                }
                b'.' if self.peek_at(1).is_some_and(|b| b.is_ascii_alphabetic()) => {
                    self.advance();
                    self.advance_while(is_name_byte);
                    self.emit(TokenKind::GlobalIdentifier, start, start_point);
                }
                b'.' if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => {
                    self.number();
                    self.emit(TokenKind::Number, start, start_point);
                }
                b if b.is_ascii_alphabetic() => {
                    self.advance_while(is_name_byte);
                    self.emit(TokenKind::LocalIdentifier, start, start_point);
                }
                b if b.is_ascii_digit() => {
                    self.number();
                    self.emit(TokenKind::Number, start, start_point);
                }
                b':' => {
                    self.advance();
                    if self.peek_at(0) == Some(b':') {
                        self.advance();
                        self.emit(TokenKind::DoubleColon, start, start_point);
                    } else {
                        self.emit(TokenKind::Colon, start, start_point);
                    }
                }
                b'{' | b'}' | b'[' | b']' | b'(' | b')' | b';' => {
                    let kind = match b {
                        b'{' => TokenKind::LeftBrace,
                        b'}' => TokenKind::RightBrace,
                        b'[' => TokenKind::LeftBracket,
                        b']' => TokenKind::RightBracket,
                        b'(' => TokenKind::LeftParen,
                        b')' => TokenKind::RightParen,
                        _ => TokenKind::Semicolon,
                    };
                    self.advance();
                    self.emit(kind, start, start_point);
                }
                b if OPERATOR_BYTES.contains(&b) => {
                    self.advance();
                    self.emit(TokenKind::Operator, start, start_point);
                }
                _ => {
                    self.advance();
                    self.emit(TokenKind::Unknown, start, start_point);
                }
            }
        }
        self.tokens
    }
}

/// Split q source into tokens, comments included.
pub(crate) fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

/// Position just past the last byte of `source`.
pub(crate) fn end_point(source: &str) -> Point {
    let row = source.bytes().filter(|&b| b == b'\n').count();
    let column = source.rsplit('\n').next().map_or(0, str::len);
    Point::new(row, column)
}
