//! Column conversion between the analyzer and the editor.
//!
//! The analyzer counts columns in bytes. LSP positions count UTF-16 code
//! units, so every position crossing the protocol boundary goes through a
//! [`LineIndex`] built over the document's content.

use lsp_types::{Diagnostic, Position, Range};

pub struct LineIndex<'a> {
    source: &'a str,
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
    ascii: bool,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            source,
            line_starts,
            ascii: source.is_ascii(),
        }
    }

    fn line(&self, line: u32) -> Option<&'a str> {
        let start = *self.line_starts.get(line as usize)?;
        let end = self
            .line_starts
            .get(line as usize + 1)
            .copied()
            .unwrap_or(self.source.len());
        self.source
            .get(start..end)
            .map(|text| text.trim_end_matches('\n'))
    }

    /// An editor position as a byte column. Columns past the end of the
    /// line stay past it by the same amount.
    pub fn to_byte_position(&self, position: Position) -> Position {
        if self.ascii {
            return position;
        }
        let Some(line) = self.line(position.line) else {
            return position;
        };
        let mut units = 0u32;
        for (byte, ch) in line.char_indices() {
            if units >= position.character {
                return Position::new(position.line, byte as u32);
            }
            units += ch.len_utf16() as u32;
        }
        let overflow = position.character.saturating_sub(units);
        Position::new(position.line, line.len() as u32 + overflow)
    }

    /// A byte-column position as the editor counts it.
    pub fn to_lsp_position(&self, position: Position) -> Position {
        if self.ascii {
            return position;
        }
        let Some(line) = self.line(position.line) else {
            return position;
        };
        let column = position.character as usize;
        let units: usize = line
            .char_indices()
            .take_while(|(byte, _)| *byte < column)
            .map(|(_, ch)| ch.len_utf16())
            .sum();
        let overflow = column.saturating_sub(line.len());
        Position::new(position.line, (units + overflow) as u32)
    }

    pub fn to_lsp_range(&self, range: Range) -> Range {
        Range::new(
            self.to_lsp_position(range.start),
            self.to_lsp_position(range.end),
        )
    }

    pub fn to_lsp_diagnostics(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .map(|diagnostic| Diagnostic {
                range: self.to_lsp_range(diagnostic.range),
                ..diagnostic
            })
            .collect()
    }
}
